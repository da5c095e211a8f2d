use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_value::{ClassId, Data, MapData, ObjectData};

use crate::de::methods::bad_type;
use crate::de::{DeMethod, DeserializationMethod};
use crate::hash::HashSet;
use crate::info::{FieldDefault, Validator};
use crate::validation::ValidationError;

/// A field read from its own key.
pub(crate) struct DeField {
    pub name: Arc<str>,
    pub alias: Arc<str>,
    pub method: DeMethod,
    pub required: bool,
    pub default: Option<FieldDefault>,
    /// Invalid input is replaced by the default instead of failing.
    pub fall_back: bool,
}

/// Which keys of the input a flattened field receives.
pub(crate) enum FlattenedKeys {
    /// The aliases of a flattened object, nested flattenings included.
    Aliases(HashSet<Arc<str>>),
    /// Every key no other field claims.
    Remaining,
}

pub(crate) struct DeFlattened {
    pub name: Arc<str>,
    pub keys: FlattenedKeys,
    pub method: DeMethod,
    pub required: bool,
    pub default: Option<FieldDefault>,
    pub fall_back: bool,
}

/// A validator with its error location resolved.
pub(crate) struct DeValidator {
    pub validator: Validator,
    /// Alias of the field the failures are reported under.
    pub alias: Option<Arc<str>>,
    pub dependencies: Option<Arc<[Arc<str>]>>,
}

impl DeValidator {
    /// Validators wait for their dependencies; without declared
    /// dependencies, for every field.
    fn runs(&self, object: &ObjectData, failed: &HashSet<Arc<str>>) -> bool {
        match &self.dependencies {
            Some(dependencies) => {
                dependencies.iter().any(|name| object.is_set(name))
                    && !dependencies.iter().any(|name| failed.contains(name))
            }
            None => failed.is_empty(),
        }
    }
}

/// Builds an object from a map.
pub(crate) struct ObjectMethod {
    pub class: ClassId,
    pub fields: Vec<DeField>,
    pub flattened: Vec<DeFlattened>,
    /// Fields that are never read from input.
    pub read_only: Vec<(Arc<str>, FieldDefault)>,
    pub validators: Vec<DeValidator>,
    pub additional_properties: bool,
}

impl ObjectMethod {
    fn claims(&self, key: &str) -> bool {
        self.fields.iter().any(|field| &*field.alias == key)
            || self.flattened.iter().any(|flat| match &flat.keys {
                FlattenedKeys::Aliases(aliases) => aliases.contains(key),
                FlattenedKeys::Remaining => false,
            })
    }

    fn has_catch_all(&self) -> bool {
        self.flattened
            .iter()
            .any(|flat| matches!(flat.keys, FlattenedKeys::Remaining))
    }

    fn read_fields(
        &self,
        map: &MapData,
        object: &mut ObjectData,
        errors: &mut ValidationError,
        failed: &mut HashSet<Arc<str>>,
    ) {
        for field in &self.fields {
            match map.get_str(&field.alias) {
                Some(value) => match field.method.deserialize(value) {
                    Ok(value) => object.set(field.name.clone(), value),
                    Err(error) => match &field.default {
                        Some(default) if field.fall_back => {
                            object.set_unset(field.name.clone(), default.value());
                        }
                        _ => {
                            failed.insert(field.name.clone());
                            errors.add_child(field.alias.clone(), error);
                        }
                    },
                },
                None if field.required => {
                    failed.insert(field.name.clone());
                    errors.add_child(field.alias.clone(), ValidationError::new("missing property"));
                }
                None => {
                    if let Some(default) = &field.default {
                        object.set_unset(field.name.clone(), default.value());
                    }
                }
            }
        }
    }

    fn read_flattened(
        &self,
        map: &MapData,
        remaining: &MapData,
        object: &mut ObjectData,
        errors: &mut ValidationError,
        failed: &mut HashSet<Arc<str>>,
    ) {
        for flat in &self.flattened {
            let input = match &flat.keys {
                FlattenedKeys::Remaining => remaining.clone(),
                FlattenedKeys::Aliases(aliases) => map
                    .iter()
                    .filter(|(key, _)| key.as_str().is_some_and(|key| aliases.contains(key)))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            };
            if input.is_empty()
                && !flat.required
                && let Some(default) = &flat.default
            {
                object.set_unset(flat.name.clone(), default.value());
                continue;
            }
            match flat.method.deserialize(&Data::map(input)) {
                Ok(value) => object.set(flat.name.clone(), value),
                Err(error) => match &flat.default {
                    Some(default) if flat.fall_back => {
                        object.set_unset(flat.name.clone(), default.value());
                    }
                    // Errors of a flattened field belong to the parent.
                    _ => {
                        failed.insert(flat.name.clone());
                        errors.merge_from(error);
                    }
                },
            }
        }
    }

    fn validate(&self, object: &ObjectData, failed: &HashSet<Arc<str>>, errors: &mut ValidationError) {
        for entry in &self.validators {
            if !entry.runs(object, failed) {
                continue;
            }
            if let Err(error) = entry.validator.validate(object) {
                match &entry.alias {
                    Some(alias) => errors.add_child(alias.clone(), error),
                    None => errors.merge_from(error),
                }
            }
        }
    }
}

impl DeserializationMethod for ObjectMethod {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError> {
        let map = data.as_map().ok_or_else(|| bad_type("map", data.class()))?;
        let mut object = ObjectData::new(self.class);
        let mut errors = ValidationError::default();
        let mut failed = HashSet::default();

        self.read_fields(map, &mut object, &mut errors, &mut failed);

        let remaining: MapData = map
            .iter()
            .filter(|(key, _)| !key.as_str().is_some_and(|key| self.claims(key)))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        self.read_flattened(map, &remaining, &mut object, &mut errors, &mut failed);

        if !self.additional_properties && !self.has_catch_all() {
            for key in remaining.keys() {
                let key: Arc<str> = match key {
                    Data::Str(key) => key.clone(),
                    other => format!("{other:?}").into(),
                };
                errors.add_child(key, ValidationError::new("unexpected property"));
            }
        }

        for (name, default) in &self.read_only {
            object.set_unset(name.clone(), default.value());
        }
        self.validate(&object, &failed, &mut errors);

        if errors.is_empty() {
            Ok(Data::object(object))
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::de::methods::{AnyMethod, PrimitiveMethod};
    use crate::info::Primitive;

    fn int() -> DeMethod {
        Arc::new(PrimitiveMethod {
            primitive: Primitive::Int,
            coerce: false,
        })
    }

    fn field(name: &str, default: Option<Data>) -> DeField {
        DeField {
            name: name.into(),
            alias: name.into(),
            method: int(),
            required: default.is_none(),
            default: default.map(FieldDefault::Value),
            fall_back: false,
        }
    }

    fn object(fields: Vec<DeField>) -> ObjectMethod {
        ObjectMethod {
            class: ClassId::new(0),
            fields,
            flattened: Vec::new(),
            read_only: Vec::new(),
            validators: Vec::new(),
            additional_properties: false,
        }
    }

    fn input(entries: &[(&str, Data)]) -> Data {
        let mut map = MapData::new();
        for (key, value) in entries {
            map.insert_str(key, value.clone());
        }
        Data::map(map)
    }

    #[test]
    fn defaults_are_not_marked_set() {
        let method = object(alloc::vec![field("a", None), field("b", Some(Data::Null))]);
        let out = method.deserialize(&input(&[("a", Data::from(1))])).unwrap();
        let out = out.as_object().unwrap();
        assert!(out.is_set("a"));
        assert!(!out.is_set("b"));
        assert_eq!(out.get("b"), Some(&Data::Null));
    }

    #[test]
    fn every_problem_is_reported() {
        let method = object(alloc::vec![field("a", None), field("b", None)]);
        let error = method
            .deserialize(&input(&[("b", Data::from("x")), ("c", Data::from(0))]))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "$.a: missing property; $.b: expected type int, found str; $.c: unexpected property"
        );

        let mut lenient = object(alloc::vec![field("a", None)]);
        lenient.additional_properties = true;
        assert!(lenient.deserialize(&input(&[("a", Data::from(1)), ("c", Data::from(0))])).is_ok());
    }

    #[test]
    fn fall_back_on_default() {
        let mut b = field("b", Some(Data::from(0)));
        b.fall_back = true;
        let method = object(alloc::vec![b]);
        let out = method.deserialize(&input(&[("b", Data::from("x"))])).unwrap();
        assert_eq!(out.as_object().unwrap().get("b"), Some(&Data::from(0)));
    }

    #[test]
    fn flattened_catch_all_takes_the_rest() {
        let mut method = object(alloc::vec![field("a", None)]);
        method.flattened.push(DeFlattened {
            name: "extra".into(),
            keys: FlattenedKeys::Remaining,
            method: Arc::new(AnyMethod),
            required: true,
            default: None,
            fall_back: false,
        });
        let out = method
            .deserialize(&input(&[("a", Data::from(1)), ("z", Data::from(2))]))
            .unwrap();
        let extra = out.as_object().unwrap().get("extra").unwrap().as_map().unwrap();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra.get_str("z"), Some(&Data::from(2)));
    }

    #[test]
    fn validators_wait_for_their_dependencies() {
        let positive_sum = Validator::new(|object| {
            let a = object.get("a").and_then(Data::as_int).unwrap_or_default();
            let b = object.get("b").and_then(Data::as_int).unwrap_or_default();
            if a + b > 0 {
                Ok(())
            } else {
                Err(ValidationError::new("sum must be positive"))
            }
        });
        let mut method = object(alloc::vec![field("a", None), field("b", Some(Data::from(0)))]);
        method.validators.push(DeValidator {
            validator: positive_sum.clone(),
            alias: None,
            dependencies: Some(Arc::from([Arc::from("a"), Arc::from("b")])),
        });
        method.validators.push(DeValidator {
            validator: positive_sum,
            alias: Some("b".into()),
            dependencies: Some(Arc::from([Arc::from("b")])),
        });

        let error = method
            .deserialize(&input(&[("a", Data::from(-1)), ("b", Data::from(0))]))
            .unwrap_err();
        assert_eq!(error.to_string(), "$: sum must be positive; $.b: sum must be positive");

        // `b` left to its default: only the first validator runs.
        let error = method.deserialize(&input(&[("a", Data::from(-1))])).unwrap_err();
        assert_eq!(error.to_string(), "$: sum must be positive");

        // `a` failed: the validator reading it is skipped.
        let error = method
            .deserialize(&input(&[("a", Data::from("x")), ("b", Data::from(-5))]))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "$.a: expected type int, found str; $.b: sum must be positive"
        );
        assert!(method.deserialize(&input(&[("a", Data::from(1))])).is_ok());
    }
}
