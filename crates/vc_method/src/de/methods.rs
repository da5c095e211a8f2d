use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_value::{Data, DataClass, EnumData, MapData};

use crate::conversion::Converter;
use crate::de::coercion::coerce;
use crate::de::{DeMethod, DeserializationMethod};
use crate::info::{CollectionKind, Constraints, Primitive};
use crate::recursion::LazyMethod;
use crate::validation::ValidationError;

pub(crate) fn bad_type(expected: &str, found: DataClass) -> ValidationError {
    ValidationError::new(format!("expected type {expected}, found {found}"))
}

fn one_of<'a>(values: impl Iterator<Item = &'a Data>) -> ValidationError {
    let listed: Vec<String> = values.map(|value| format!("{value:?}")).collect();
    ValidationError::new(format!("not one of [{}]", listed.join(", ")))
}

// -----------------------------------------------------------------------------
// Scalars

/// Accepts any tree.
pub(crate) struct AnyMethod;

impl DeserializationMethod for AnyMethod {
    #[inline]
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        Ok(data.clone())
    }

    fn is_check_only(&self) -> bool {
        true
    }
}

pub(crate) struct PrimitiveMethod {
    pub primitive: Primitive,
    pub coerce: bool,
}

impl DeserializationMethod for PrimitiveMethod {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        let class = data.class();
        if self.primitive.classes().contains(&class) {
            return Ok(match (self.primitive, data) {
                (Primitive::Float, Data::Int(int)) => Data::Float(*int as f64),
                _ => data.clone(),
            });
        }
        if self.coerce
            && let Some(coerced) = coerce(self.primitive, data)
        {
            return Ok(coerced);
        }
        Err(bad_type(self.primitive.name(), class))
    }

    fn is_check_only(&self) -> bool {
        !self.coerce && self.primitive != Primitive::Float
    }
}

pub(crate) struct LiteralMethod {
    pub values: Arc<[Data]>,
}

impl DeserializationMethod for LiteralMethod {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        self.values
            .iter()
            .find(|value| *value == data)
            .cloned()
            .ok_or_else(|| one_of(self.values.iter()))
    }
}

pub(crate) struct EnumMethod {
    pub members: Arc<[Arc<EnumData>]>,
}

impl DeserializationMethod for EnumMethod {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        self.members
            .iter()
            .find(|member| member.value() == data)
            .map(|member| Data::Enum(member.clone()))
            .ok_or_else(|| one_of(self.members.iter().map(|member| member.value())))
    }
}

// -----------------------------------------------------------------------------
// Containers

pub(crate) struct CollectionMethod {
    pub item: DeMethod,
    pub kind: CollectionKind,
}

impl DeserializationMethod for CollectionMethod {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        let items = data.as_seq().ok_or_else(|| bad_type("list", data.class()))?;
        let mut errors = ValidationError::default();
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match self.item.deserialize(item) {
                Ok(value) => out.push(value),
                Err(error) => errors.add_child(index, error),
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(match self.kind {
            CollectionKind::List | CollectionKind::Sequence
                if matches!(data, Data::List(_)) && self.item.is_check_only() =>
            {
                data.clone()
            }
            CollectionKind::List | CollectionKind::Sequence => Data::List(out.into()),
            CollectionKind::Set => Data::set(out),
            CollectionKind::Tuple => Data::tuple(out),
        })
    }
}

pub(crate) struct MappingMethod {
    pub key: DeMethod,
    pub value: DeMethod,
}

impl MappingMethod {
    /// Keys are strings in a tree; a rejected decimal key is retried as an
    /// integer.
    fn deserialize_key(&self, key: &Data) -> Result<Data, ValidationError> {
        let error = match self.key.deserialize(key) {
            Ok(key) => return Ok(key),
            Err(error) => error,
        };
        match key.as_str().and_then(|key| key.parse::<i64>().ok()) {
            Some(int) => self.key.deserialize(&Data::Int(int)).map_err(|_| error),
            None => Err(error),
        }
    }
}

impl DeserializationMethod for MappingMethod {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        let map = data.as_map().ok_or_else(|| bad_type("map", data.class()))?;
        let mut errors = ValidationError::default();
        let mut out = MapData::with_capacity(map.len());
        for (key, value) in map.iter() {
            let name: Arc<str> = match key {
                Data::Str(name) => name.clone(),
                other => format!("{other:?}").into(),
            };
            let key = self.deserialize_key(key);
            let value = self.value.deserialize(value);
            match (key, value) {
                (Ok(key), Ok(value)) => {
                    out.insert(key, value);
                }
                (key, value) => {
                    let mut error = key.err().unwrap_or_default();
                    if let Err(value) = value {
                        error.merge_from(value);
                    }
                    errors.add_child(name, error);
                }
            }
        }
        if errors.is_empty() {
            Ok(Data::map(out))
        } else {
            Err(errors)
        }
    }
}

pub(crate) struct TupleMethod {
    pub items: Arc<[DeMethod]>,
}

impl DeserializationMethod for TupleMethod {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        let items = data.as_seq().ok_or_else(|| bad_type("list", data.class()))?;
        if items.len() != self.items.len() {
            return Err(ValidationError::new(format!(
                "expected {} items, found {}",
                self.items.len(),
                items.len()
            )));
        }
        let mut errors = ValidationError::default();
        let mut out = Vec::with_capacity(items.len());
        for (index, (method, item)) in self.items.iter().zip(items.iter()).enumerate() {
            match method.deserialize(item) {
                Ok(value) => out.push(value),
                Err(error) => errors.add_child(index, error),
            }
        }
        if errors.is_empty() {
            Ok(Data::tuple(out))
        } else {
            Err(errors)
        }
    }
}

// -----------------------------------------------------------------------------
// Unions

pub(crate) struct OptionalMethod {
    pub inner: DeMethod,
}

impl DeserializationMethod for OptionalMethod {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        if data.is_null() {
            Ok(Data::Null)
        } else {
            self.inner.deserialize(data)
        }
    }

    fn is_check_only(&self) -> bool {
        self.inner.is_check_only()
    }
}

/// Returns the first alternative that succeeds, or the merge of every
/// failure.
pub(crate) struct UnionMethod {
    pub alternatives: Vec<DeMethod>,
}

impl DeserializationMethod for UnionMethod {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        let mut errors = ValidationError::default();
        for alternative in &self.alternatives {
            match alternative.deserialize(data) {
                Ok(value) => return Ok(value),
                Err(error) => errors.merge_from(error),
            }
        }
        Err(errors)
    }
}

/// Dispatches on the tag property of the input map.
pub(crate) struct DiscriminatorMethod {
    pub property: Arc<str>,
    pub alternatives: Vec<(Arc<str>, DeMethod)>,
}

impl DiscriminatorMethod {
    fn tag_error(&self, error: ValidationError) -> ValidationError {
        ValidationError::default().with_child(self.property.clone(), error)
    }
}

impl DeserializationMethod for DiscriminatorMethod {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        let map = data.as_map().ok_or_else(|| bad_type("map", data.class()))?;
        let tag = map
            .get_str(&self.property)
            .ok_or_else(|| self.tag_error(ValidationError::new("missing property")))?;
        let Some((_, method)) = self
            .alternatives
            .iter()
            .find(|(name, _)| tag.as_str() == Some(&**name))
        else {
            let tags: Vec<Data> = self
                .alternatives
                .iter()
                .map(|(name, _)| Data::Str(name.clone()))
                .collect();
            return Err(self.tag_error(one_of(tags.iter())));
        };
        let rest: MapData = map
            .iter()
            .filter(|(key, _)| key.as_str() != Some(&*self.property))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        method.deserialize(&Data::map(rest))
    }
}

// -----------------------------------------------------------------------------
// Constraints

/// Checks the input against bounds, then deserializes it.
///
/// Violations and the inner failures are reported together.
pub(crate) struct ConstrainedMethod {
    pub method: DeMethod,
    pub constraints: Arc<Constraints>,
}

impl DeserializationMethod for ConstrainedMethod {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        let violations = self.constraints.check(data);
        let result = self.method.deserialize(data);
        if violations.is_empty() {
            return result;
        }
        let mut error = ValidationError::default();
        for violation in violations {
            error.add_message(violation);
        }
        if let Err(inner) = result {
            error.merge_from(inner);
        }
        Err(error)
    }

    fn is_check_only(&self) -> bool {
        self.method.is_check_only()
    }
}

// -----------------------------------------------------------------------------
// Conversions and recursion

/// Deserializes the conversion source, then converts.
pub(crate) struct ConversionMethod {
    pub method: DeMethod,
    pub converter: Converter,
}

impl DeserializationMethod for ConversionMethod {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        let value = self.method.deserialize(data)?;
        self.converter
            .convert(value)
            .map_err(|error| ValidationError::new(error.message()))
    }
}

impl DeserializationMethod for LazyMethod<dyn DeserializationMethod> {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        match self.get() {
            Some(method) => method.deserialize(data),
            None => Err(ValidationError::new("recursive procedure used before it was bound")),
        }
    }
}
