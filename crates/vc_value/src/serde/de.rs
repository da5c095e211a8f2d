use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Formatter};

use serde_core::de::{Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::{Data, MapData};

impl<'de> Deserialize<'de> for Data {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TreeVisitor)
    }
}

/// A [`Visitor`] building tree values only.
struct TreeVisitor;

impl<'de> Visitor<'de> for TreeVisitor {
    type Value = Data;

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("a tree value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Data::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Data::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
        // Out of range integers degrade to floats.
        Ok(i64::try_from(v).map_or(Data::Float(v as f64), Data::Int))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Data::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Data::str(v))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
        Ok(Data::from(v))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(Data::Null)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(Data::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Data::deserialize(deserializer)
    }

    fn visit_seq<V>(self, mut seq: V) -> Result<Self::Value, V::Error>
    where
        V: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or_default());
        while let Some(item) = seq.next_element::<Data>()? {
            items.push(item);
        }
        Ok(Data::from(items))
    }

    fn visit_map<V>(self, mut map: V) -> Result<Self::Value, V::Error>
    where
        V: MapAccess<'de>,
    {
        let mut entries = MapData::with_capacity(map.size_hint().unwrap_or_default());
        while let Some((key, value)) = map.next_entry::<Data, Data>()? {
            entries.insert(key, value);
        }
        Ok(Data::map(entries))
    }
}

#[cfg(test)]
mod tests {
    use crate::Data;
    use serde_json::json;

    #[test]
    fn json_value_to_tree() {
        let tree: Data = serde_json::from_value(json!({"a": [1, "x", null, true]})).unwrap();
        let map = tree.as_map().unwrap();
        let items = map.get_str("a").and_then(Data::as_seq).unwrap();
        assert_eq!(items[0], Data::Int(1));
        assert_eq!(items[1], Data::from("x"));
        assert_eq!(items[2], Data::Null);
        assert_eq!(items[3], Data::Bool(true));
    }

    #[test]
    fn large_unsigned_becomes_float() {
        let tree: Data = serde_json::from_str("18446744073709551615").unwrap();
        assert!(matches!(tree, Data::Float(_)));
    }
}
