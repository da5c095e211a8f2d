use alloc::format;

use serde_core::ser::{Error, Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::Data;

impl Serialize for Data {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Data::Undefined => Err(S::Error::custom("undefined value cannot be serialized")),
            Data::Null => serializer.serialize_unit(),
            Data::Bool(value) => serializer.serialize_bool(*value),
            Data::Int(value) => serializer.serialize_i64(*value),
            Data::Float(value) => serializer.serialize_f64(*value),
            Data::Str(value) => serializer.serialize_str(value),
            Data::List(items) | Data::Tuple(items) | Data::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Data::Map(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map.iter() {
                    state.serialize_entry(key, value)?;
                }
                state.end()
            }
            Data::Enum(member) => member.value().serialize(serializer),
            Data::Object(object) => {
                let mut state = serializer.serialize_map(Some(object.len()))?;
                for (name, value) in object.attrs() {
                    state.serialize_entry(name, value)?;
                }
                state.end()
            }
            Data::Opaque(opaque) => Err(S::Error::custom(format!(
                "opaque value `{}` cannot be serialized",
                opaque.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{ClassId, Data, ObjectData};

    #[test]
    fn object_serializes_sorted() {
        let obj = ObjectData::new(ClassId::new(0)).with("b", 1).with("a", true);
        let text = serde_json::to_string(&Data::object(obj)).unwrap();
        assert_eq!(text, r#"{"a":true,"b":1}"#);
    }

    #[test]
    fn undefined_is_rejected() {
        assert!(serde_json::to_string(&Data::Undefined).is_err());
        assert!(serde_json::to_string(&Data::opaque(1_u8)).is_err());
    }
}
