use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_value::{ClassId, Data, DataClass, MapData};

use crate::conversion::Converter;
use crate::error::{SerializeError, SerializeErrorKind};
use crate::info::Classes;
use crate::recursion::LazyMethod;
use crate::ser::{SerMethod, SerializationMethod};

// -----------------------------------------------------------------------------
// Fallback

/// What a procedure does with a value of an unexpected class.
#[derive(Clone)]
pub(crate) enum Fallback {
    /// Serialize by run-time class.
    Any(SerMethod),
    Fail,
}

impl Fallback {
    pub(crate) fn fall_back(&self, value: &Data, expected: &Arc<str>) -> Result<Data, SerializeError> {
        match self {
            Self::Any(any) => any.serialize(value),
            Self::Fail => Err(SerializeError::mismatch(expected, value.class())),
        }
    }
}

#[inline]
fn seq<'a>(value: &'a Data, expected: &Arc<str>) -> Result<&'a Arc<[Data]>, SerializeError> {
    value
        .as_seq()
        .ok_or_else(|| SerializeError::mismatch(expected, value.class()))
}

// -----------------------------------------------------------------------------
// Identity and type checks

pub(crate) struct IdentityMethod;

impl SerializationMethod for IdentityMethod {
    #[inline]
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        Ok(value.clone())
    }

    #[inline]
    fn is_identity(&self) -> bool {
        true
    }
}

/// Identity restricted to the expected classes.
pub(crate) struct TypeCheckIdentityMethod {
    pub classes: Arc<[DataClass]>,
    pub expected: Arc<str>,
    pub fallback: Fallback,
}

impl SerializationMethod for TypeCheckIdentityMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        if self.classes.contains(&value.class()) {
            Ok(value.clone())
        } else {
            self.fallback.fall_back(value, &self.expected)
        }
    }

    fn is_check_only(&self) -> bool {
        matches!(self.fallback, Fallback::Fail)
    }
}

pub(crate) struct TypeCheckMethod {
    pub classes: Arc<[DataClass]>,
    pub expected: Arc<str>,
    pub method: SerMethod,
    pub fallback: Fallback,
}

impl SerializationMethod for TypeCheckMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        if self.classes.contains(&value.class()) {
            self.method.serialize(value)
        } else {
            self.fallback.fall_back(value, &self.expected)
        }
    }
}

// -----------------------------------------------------------------------------
// Containers

/// Checks every element, then returns the collection as is.
pub(crate) struct CollectionCheckOnlyMethod {
    pub item: SerMethod,
    pub expected: Arc<str>,
}

impl SerializationMethod for CollectionCheckOnlyMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        for (index, item) in seq(value, &self.expected)?.iter().enumerate() {
            self.item.serialize(item).map_err(|error| error.at(index))?;
        }
        Ok(value.clone())
    }

    fn is_check_only(&self) -> bool {
        true
    }
}

/// Maps every element into a new list.
pub(crate) struct CollectionMethod {
    pub item: SerMethod,
    pub expected: Arc<str>,
}

impl SerializationMethod for CollectionMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        let items = seq(value, &self.expected)?;
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            out.push(self.item.serialize(item).map_err(|error| error.at(index))?);
        }
        Ok(Data::List(out.into()))
    }
}

pub(crate) struct MappingMethod {
    pub key: SerMethod,
    pub value: SerMethod,
    pub expected: Arc<str>,
}

impl MappingMethod {
    /// Serializes a key; integer keys are written in decimal.
    fn key(&self, key: &Data) -> Result<Arc<str>, SerializeError> {
        match self.key.serialize(key)? {
            Data::Str(key) => Ok(key),
            Data::Int(int) => Ok(int.to_string().into()),
            other => Err(SerializeError::new(SerializeErrorKind::MapKey(other.class()))),
        }
    }
}

impl SerializationMethod for MappingMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        let map = value
            .as_map()
            .ok_or_else(|| SerializeError::mismatch(&self.expected, value.class()))?;
        let mut out = MapData::with_capacity(map.len());
        for (key, item) in map.iter() {
            let name = self.key(key)?;
            let item = self
                .value
                .serialize(item)
                .map_err(|error| error.at(name.clone()))?;
            out.insert(Data::Str(name), item);
        }
        Ok(Data::map(out))
    }
}

pub(crate) struct TupleMethod {
    pub items: Arc<[SerMethod]>,
    pub expected: Arc<str>,
    /// Set when the arity is checked before converting.
    pub arity_check: Option<Fallback>,
}

impl SerializationMethod for TupleMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        let items = seq(value, &self.expected)?;
        if let Some(fallback) = &self.arity_check
            && items.len() != self.items.len()
        {
            return match fallback {
                Fallback::Any(any) => any.serialize(value),
                Fallback::Fail => Err(SerializeError::new(SerializeErrorKind::Arity {
                    expected: self.items.len(),
                    found: items.len(),
                })),
            };
        }
        let mut out = Vec::with_capacity(self.items.len());
        for (index, (method, item)) in self.items.iter().zip(items.iter()).enumerate() {
            out.push(method.serialize(item).map_err(|error| error.at(index))?);
        }
        Ok(Data::List(out.into()))
    }
}

// -----------------------------------------------------------------------------
// Unions

/// `T | null`.
pub(crate) struct OptionalMethod {
    pub inner: SerMethod,
}

impl SerializationMethod for OptionalMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        if value.is_null() {
            Ok(Data::Null)
        } else {
            self.inner.serialize(value)
        }
    }
}

/// Tries the alternatives whose classes match, in declaration order.
pub(crate) struct UnionMethod {
    pub alternatives: Vec<(Classes, SerMethod)>,
    pub fallback: Option<SerMethod>,
    pub expected: Arc<str>,
}

impl SerializationMethod for UnionMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        let class = value.class();
        let mut last_error = None;
        for (classes, method) in &self.alternatives {
            if !classes.contains(class) {
                continue;
            }
            match method.serialize(value) {
                Ok(result) => return Ok(result),
                Err(error) => last_error = Some(error),
            }
        }
        if let Some(any) = &self.fallback {
            return any.serialize(value);
        }
        Err(last_error.unwrap_or_else(|| SerializeError::mismatch(&self.expected, class)))
    }
}

/// Serializes the alternative whose class is the object's class and
/// writes its tag first.
pub(crate) struct TaggedUnionMethod {
    pub property: Arc<str>,
    pub alternatives: Vec<(ClassId, Arc<str>, SerMethod)>,
    pub fallback: Option<SerMethod>,
    pub expected: Arc<str>,
}

impl SerializationMethod for TaggedUnionMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        let found = value.as_object().and_then(|object| {
            self.alternatives
                .iter()
                .find(|(class, _, _)| *class == object.class())
        });
        let Some((_, tag, method)) = found else {
            return match &self.fallback {
                Some(any) => any.serialize(value),
                None => Err(SerializeError::mismatch(&self.expected, value.class())),
            };
        };
        match method.serialize(value)? {
            Data::Map(map) => {
                let mut out = MapData::with_capacity(map.len() + 1);
                out.insert_str(&*self.property, Data::Str(tag.clone()));
                for (key, item) in map.iter() {
                    if key.as_str() != Some(&*self.property) {
                        out.insert(key.clone(), item.clone());
                    }
                }
                Ok(Data::map(out))
            }
            other => Ok(other),
        }
    }
}

// -----------------------------------------------------------------------------
// Enums

/// Emits the scalar value of an enum member.
pub(crate) struct EnumValueMethod {
    pub expected: Arc<str>,
}

impl SerializationMethod for EnumValueMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        value
            .as_member()
            .map(|member| member.value().clone())
            .ok_or_else(|| SerializeError::mismatch(&self.expected, value.class()))
    }
}

/// Serializes the value of an enum member by its run-time class.
pub(crate) struct EnumAnyMethod {
    pub any: SerMethod,
    pub expected: Arc<str>,
}

impl SerializationMethod for EnumAnyMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        let member = value
            .as_member()
            .ok_or_else(|| SerializeError::mismatch(&self.expected, value.class()))?;
        self.any.serialize(member.value())
    }
}

// -----------------------------------------------------------------------------
// Conversions and recursion

pub(crate) struct ConversionMethod {
    pub converter: Converter,
    pub method: SerMethod,
}

impl SerializationMethod for ConversionMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        let converted = self.converter.convert(value.clone())?;
        self.method.serialize(&converted)
    }
}

impl SerializationMethod for LazyMethod<dyn SerializationMethod> {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        match self.get() {
            Some(method) => method.serialize(value),
            None => Err(SerializeError::new(SerializeErrorKind::Unbound)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ser::identity;
    use crate::error::ConvertError;

    fn failing() -> SerMethod {
        Arc::new(ConversionMethod {
            converter: Converter::new(|_| Err(ConvertError::from("nope"))),
            method: identity(),
        })
    }

    #[test]
    fn union_retries_after_failure() {
        let union = UnionMethod {
            alternatives: alloc::vec![
                (Classes::Only([DataClass::Int].into()), failing()),
                (Classes::Only([DataClass::Int].into()), identity()),
            ],
            fallback: None,
            expected: "a | b".into(),
        };
        assert_eq!(union.serialize(&Data::from(1)).unwrap(), Data::from(1));

        let error = union.serialize(&Data::from("x")).unwrap_err();
        assert_eq!(error.to_string(), "expected a | b, found str (at `$`)");
    }

    #[test]
    fn union_reports_last_error() {
        let union = UnionMethod {
            alternatives: alloc::vec![(Classes::Any, failing())],
            fallback: None,
            expected: "a".into(),
        };
        let error = union.serialize(&Data::Null).unwrap_err();
        assert_eq!(
            error.kind,
            SerializeErrorKind::Conversion(ConvertError::from("nope"))
        );
    }

    #[test]
    fn errors_carry_their_path() {
        let list = CollectionMethod {
            item: Arc::new(TypeCheckIdentityMethod {
                classes: [DataClass::Int].into(),
                expected: "int".into(),
                fallback: Fallback::Fail,
            }),
            expected: "list[int]".into(),
        };
        let value = Data::list([Data::from(1), Data::from("two")]);
        let error = list.serialize(&value).unwrap_err();
        assert_eq!(error.path.to_string(), "$[1]");
    }

    #[test]
    fn mapping_stringifies_int_keys() {
        let mapping = MappingMethod {
            key: identity(),
            value: identity(),
            expected: "map[int, int]".into(),
        };
        let map: MapData = [(Data::from(1), Data::from(2))].into_iter().collect();
        let out = mapping.serialize(&Data::map(map)).unwrap();
        assert_eq!(out.as_map().unwrap().get_str("1"), Some(&Data::from(2)));

        let map: MapData = [(Data::Null, Data::from(2))].into_iter().collect();
        assert!(mapping.serialize(&Data::map(map)).is_err());
    }

    #[test]
    fn checked_tuple_arity() {
        let tuple = TupleMethod {
            items: [identity(), identity()].into(),
            expected: "tuple[int, int]".into(),
            arity_check: Some(Fallback::Fail),
        };
        let error = tuple.serialize(&Data::tuple([Data::from(1)])).unwrap_err();
        assert_eq!(error.kind, SerializeErrorKind::Arity { expected: 2, found: 1 });
        assert_eq!(
            tuple.serialize(&Data::tuple([Data::from(1), Data::from(2)])).unwrap(),
            Data::list([Data::from(1), Data::from(2)])
        );
    }
}
