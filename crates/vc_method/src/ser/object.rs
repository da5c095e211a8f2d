use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_value::{Data, MapData, ObjectData};

use crate::error::{SerializeError, SerializeErrorKind};
use crate::info::{FieldDefault, SerializedFn, Skippable};
use crate::ser::{SerMethod, SerializationMethod};

/// A stored field of a compiled object.
pub(crate) struct SerField {
    pub name: Arc<str>,
    pub alias: Arc<str>,
    pub method: SerMethod,
    pub default: Option<FieldDefault>,
    pub skip: Option<Skippable>,
}

impl SerField {
    /// The value to emit, or `None` when the field is left out.
    fn value(&self, object: &ObjectData, exclude_unset: bool) -> Option<Data> {
        if exclude_unset && !object.is_set(&self.name) {
            return None;
        }
        let value = match object.get(&self.name) {
            Some(value) => value.clone(),
            None => self
                .default
                .as_ref()
                .map_or(Data::Undefined, FieldDefault::value),
        };
        if value.is_undefined() || self.skip.as_ref().is_some_and(|skip| skip.skips(&value)) {
            return None;
        }
        Some(value)
    }
}

/// A field computed from the object.
pub(crate) struct SerVirtual {
    pub alias: Arc<str>,
    pub func: SerializedFn,
    pub method: SerMethod,
    pub skip_none: bool,
}

pub(crate) enum SerEntry {
    Field(SerField),
    Virtual(SerVirtual),
}

/// Serializes an object into a map.
///
/// Flattened fields are merged first, so a normal field overwrites a
/// colliding key.
pub(crate) struct ObjectMethod {
    pub expected: Arc<str>,
    pub flattened: Vec<SerField>,
    pub entries: Vec<SerEntry>,
    pub exclude_unset: bool,
}

impl ObjectMethod {
    fn merge_flattened(&self, object: &ObjectData, out: &mut MapData) -> Result<(), SerializeError> {
        for field in &self.flattened {
            let Some(value) = field.value(object, self.exclude_unset) else {
                continue;
            };
            let result = field
                .method
                .serialize(&value)
                .map_err(|error| error.at(field.name.clone()))?;
            match &result {
                Data::Map(map) => out.merge(map),
                other => {
                    return Err(
                        SerializeError::new(SerializeErrorKind::Flatten(other.class()))
                            .at(field.name.clone()),
                    );
                }
            }
        }
        Ok(())
    }
}

impl SerializationMethod for ObjectMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        let object = value
            .as_object()
            .ok_or_else(|| SerializeError::mismatch(&self.expected, value.class()))?;

        let mut out = MapData::with_capacity(self.entries.len());
        self.merge_flattened(object, &mut out)?;

        for entry in &self.entries {
            match entry {
                SerEntry::Field(field) => {
                    let Some(value) = field.value(object, self.exclude_unset) else {
                        continue;
                    };
                    let result = field
                        .method
                        .serialize(&value)
                        .map_err(|error| error.at(field.alias.clone()))?;
                    out.insert(Data::Str(field.alias.clone()), result);
                }
                SerEntry::Virtual(field) => {
                    let value = (field.func)(object)
                        .map_err(|error| SerializeError::from(error).at(field.alias.clone()))?;
                    if value.is_undefined() || (field.skip_none && value.is_null()) {
                        continue;
                    }
                    let result = field
                        .method
                        .serialize(&value)
                        .map_err(|error| error.at(field.alias.clone()))?;
                    out.insert(Data::Str(field.alias.clone()), result);
                }
            }
        }
        Ok(Data::map(out))
    }
}
