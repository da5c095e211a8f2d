//! Lenient conversions between primitives, used when `coerce` is set.

use alloc::string::ToString;

use vc_value::Data;

use crate::info::Primitive;

const BOOL_PAIRS: [(&str, &str); 7] = [
    ("0", "1"),
    ("f", "t"),
    ("n", "y"),
    ("no", "yes"),
    ("false", "true"),
    ("off", "on"),
    ("ko", "ok"),
];

fn coerce_bool(data: &Data) -> Option<bool> {
    match data {
        Data::Int(0) => Some(false),
        Data::Int(1) => Some(true),
        Data::Str(text) => {
            let lower = text.to_lowercase();
            BOOL_PAIRS.iter().find_map(|&(no, yes)| {
                if lower == no {
                    Some(false)
                } else if lower == yes {
                    Some(true)
                } else {
                    None
                }
            })
        }
        _ => None,
    }
}

fn coerce_int(data: &Data) -> Option<i64> {
    match data {
        Data::Str(text) => text.trim().parse().ok(),
        Data::Float(value) if value.fract() == 0.0 && value.is_finite() => {
            let int = *value as i64;
            (int as f64 == *value).then_some(int)
        }
        _ => None,
    }
}

/// Converts `data` to `primitive`, or `None` when it cannot.
///
/// Only called on data whose class does not already match.
pub(crate) fn coerce(primitive: Primitive, data: &Data) -> Option<Data> {
    match primitive {
        Primitive::Null => match data {
            Data::Str(text) if text.is_empty() => Some(Data::Null),
            _ => None,
        },
        Primitive::Bool => coerce_bool(data).map(Data::Bool),
        Primitive::Int => coerce_int(data).map(Data::Int),
        Primitive::Float => match data {
            Data::Str(text) => text.trim().parse().ok().map(Data::Float),
            _ => None,
        },
        Primitive::Str => match data {
            Data::Bool(value) => Some(Data::str(value.to_string())),
            Data::Int(value) => Some(Data::str(value.to_string())),
            Data::Float(value) => Some(Data::str(value.to_string())),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans() {
        assert_eq!(coerce(Primitive::Bool, &Data::from("Yes")), Some(Data::Bool(true)));
        assert_eq!(coerce(Primitive::Bool, &Data::from("off")), Some(Data::Bool(false)));
        assert_eq!(coerce(Primitive::Bool, &Data::from(1)), Some(Data::Bool(true)));
        assert_eq!(coerce(Primitive::Bool, &Data::from("maybe")), None);
        assert_eq!(coerce(Primitive::Bool, &Data::from(2)), None);
    }

    #[test]
    fn numbers() {
        assert_eq!(coerce(Primitive::Int, &Data::from(" 42 ")), Some(Data::Int(42)));
        assert_eq!(coerce(Primitive::Int, &Data::from(3.0)), Some(Data::Int(3)));
        assert_eq!(coerce(Primitive::Int, &Data::from(3.5)), None);
        assert_eq!(coerce(Primitive::Float, &Data::from("1.5")), Some(Data::Float(1.5)));
    }

    #[test]
    fn strings_and_null() {
        assert_eq!(coerce(Primitive::Str, &Data::from(7)), Some(Data::from("7")));
        assert_eq!(coerce(Primitive::Str, &Data::from(true)), Some(Data::from("true")));
        assert_eq!(coerce(Primitive::Null, &Data::from("")), Some(Data::Null));
        assert_eq!(coerce(Primitive::Null, &Data::from("x")), None);
    }
}
