use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use regex::Regex;
use vc_value::Data;

use crate::hash::HashSet;

// -----------------------------------------------------------------------------
// Constraints

/// Bounds checked against the input tree before it is deserialized.
///
/// Each bound concerns one class of input and is ignored for the others:
///
/// - numbers: `minimum`, `maximum`, the exclusive bounds and `multiple_of`;
/// - strings: length in characters and a pattern anchored at the start;
/// - lists: item count and uniqueness;
/// - maps: property count.
///
/// Every violated bound is reported, not only the first one.
///
/// # Examples
///
/// ```
/// use vc_method::info::Constraints;
/// use vc_value::Data;
///
/// let port = Constraints::new().with_minimum(1.0).with_maximum(65535.0);
/// assert!(port.check(&Data::from(80)).is_empty());
/// assert_eq!(port.check(&Data::from(0)), ["less than 1"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    minimum: Option<f64>,
    maximum: Option<f64>,
    exclusive_minimum: Option<f64>,
    exclusive_maximum: Option<f64>,
    multiple_of: Option<f64>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    min_items: Option<usize>,
    max_items: Option<usize>,
    unique_items: bool,
    min_properties: Option<usize>,
    max_properties: Option<usize>,
}

impl Constraints {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn with_maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn with_exclusive_minimum(mut self, minimum: f64) -> Self {
        self.exclusive_minimum = Some(minimum);
        self
    }

    pub fn with_exclusive_maximum(mut self, maximum: f64) -> Self {
        self.exclusive_maximum = Some(maximum);
        self
    }

    pub fn with_multiple_of(mut self, factor: f64) -> Self {
        self.multiple_of = Some(factor);
        self
    }

    pub fn with_min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    pub fn with_max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }

    /// Strings must match `pattern` from their first character.
    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_min_items(mut self, count: usize) -> Self {
        self.min_items = Some(count);
        self
    }

    pub fn with_max_items(mut self, count: usize) -> Self {
        self.max_items = Some(count);
        self
    }

    pub fn with_unique_items(mut self) -> Self {
        self.unique_items = true;
        self
    }

    pub fn with_min_properties(mut self, count: usize) -> Self {
        self.min_properties = Some(count);
        self
    }

    pub fn with_max_properties(mut self, count: usize) -> Self {
        self.max_properties = Some(count);
        self
    }

    /// Returns the message of every bound `data` violates.
    pub fn check(&self, data: &Data) -> Vec<String> {
        let mut errors = Vec::new();
        match data {
            Data::Int(_) | Data::Float(_) => self.check_number(data, &mut errors),
            Data::Str(text) => self.check_str(text, &mut errors),
            Data::List(items) | Data::Tuple(items) | Data::Set(items) => {
                self.check_items(items, &mut errors);
            }
            Data::Map(map) => {
                let count = map.len();
                if let Some(min) = self.min_properties
                    && count < min
                {
                    errors.push(format!("property count lower than {min}"));
                }
                if let Some(max) = self.max_properties
                    && count > max
                {
                    errors.push(format!("property count greater than {max}"));
                }
            }
            _ => {}
        }
        errors
    }

    fn check_number(&self, data: &Data, errors: &mut Vec<String>) {
        let Some(value) = data.as_number() else {
            return;
        };
        if let Some(min) = self.minimum
            && value < min
        {
            errors.push(format!("less than {min}"));
        }
        if let Some(max) = self.maximum
            && value > max
        {
            errors.push(format!("greater than {max}"));
        }
        if let Some(min) = self.exclusive_minimum
            && value <= min
        {
            errors.push(format!("less than or equal to {min}"));
        }
        if let Some(max) = self.exclusive_maximum
            && value >= max
        {
            errors.push(format!("greater than or equal to {max}"));
        }
        if let Some(factor) = self.multiple_of
            && !is_multiple(data, factor)
        {
            errors.push(format!("not a multiple of {factor}"));
        }
    }

    fn check_str(&self, text: &str, errors: &mut Vec<String>) {
        let length = text.chars().count();
        if let Some(min) = self.min_length
            && length < min
        {
            errors.push(format!("string length lower than {min}"));
        }
        if let Some(max) = self.max_length
            && length > max
        {
            errors.push(format!("string length greater than {max}"));
        }
        if let Some(pattern) = &self.pattern
            && !pattern.find(text).is_some_and(|found| found.start() == 0)
        {
            errors.push(format!("not matching '{}'", pattern.as_str()));
        }
    }

    fn check_items(&self, items: &[Data], errors: &mut Vec<String>) {
        let count = items.len();
        if let Some(min) = self.min_items
            && count < min
        {
            errors.push(format!("item count lower than {min}"));
        }
        if let Some(max) = self.max_items
            && count > max
        {
            errors.push(format!("item count greater than {max}"));
        }
        if self.unique_items {
            let distinct: HashSet<&Data> = items.iter().collect();
            if distinct.len() != count {
                errors.push("duplicate items".into());
            }
        }
    }
}

fn is_multiple(data: &Data, factor: f64) -> bool {
    if factor == 0.0 {
        return true;
    }
    match data {
        Data::Int(value) if factor.fract() == 0.0 => value % (factor as i64) == 0,
        _ => data.as_number().is_some_and(|value| value % factor == 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_value::MapData;

    #[test]
    fn numbers() {
        let constraints = Constraints::new()
            .with_exclusive_minimum(0.0)
            .with_maximum(10.0)
            .with_multiple_of(2.0);
        assert!(constraints.check(&Data::from(4)).is_empty());
        assert_eq!(constraints.check(&Data::from(0)), ["less than or equal to 0"]);
        assert_eq!(
            constraints.check(&Data::from(11)),
            ["greater than 10", "not a multiple of 2"]
        );
        assert_eq!(constraints.check(&Data::Float(2.5)), ["not a multiple of 2"]);
        assert!(constraints.check(&Data::from("11")).is_empty());
    }

    #[test]
    fn strings() {
        let constraints = Constraints::new()
            .with_min_length(2)
            .with_max_length(3)
            .with_pattern(Regex::new("[a-z]+").unwrap());
        assert!(constraints.check(&Data::from("abc")).is_empty());
        assert_eq!(constraints.check(&Data::from("a")), ["string length lower than 2"]);
        assert_eq!(constraints.check(&Data::from("1ab")), ["not matching '[a-z]+'"]);
        assert_eq!(
            constraints.check(&Data::from("ééééé")),
            ["string length greater than 3", "not matching '[a-z]+'"]
        );
    }

    #[test]
    fn items_and_properties() {
        let constraints = Constraints::new()
            .with_min_items(1)
            .with_max_items(3)
            .with_unique_items()
            .with_max_properties(1);
        assert!(constraints.check(&Data::list([Data::from(1), Data::from(2)])).is_empty());
        assert_eq!(constraints.check(&Data::list([])), ["item count lower than 1"]);
        assert_eq!(
            constraints.check(&Data::list([Data::from(1), Data::from(1)])),
            ["duplicate items"]
        );

        let mut map = MapData::new();
        map.insert_str("a", Data::from(1));
        assert!(constraints.check(&Data::map(map.clone())).is_empty());
        map.insert_str("b", Data::from(2));
        assert_eq!(constraints.check(&Data::map(map)), ["property count greater than 1"]);
    }
}
