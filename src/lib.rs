#![doc = include_str!("../README.md")]

extern crate alloc;

use alloc::sync::Arc;

use once_cell::sync::OnceCell;
use thiserror::Error;

pub use vc_method as method;
pub use vc_value as value;

use vc_method::info::TypeHandle;
use vc_method::registry::TypeRegistry;
use vc_method::{DeserializationOptions, MethodCache, SerializationOptions};
use vc_value::Data;

// -----------------------------------------------------------------------------
// Default cache

static DEFAULT: OnceCell<MethodCache> = OnceCell::new();

/// Failure of the free functions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("the default cache is not initialized")]
    Uninitialized,

    #[error("the default cache is already initialized")]
    AlreadyInitialized,

    #[error(transparent)]
    Method(#[from] vc_method::Error),
}

/// Installs the registry behind the free functions.
///
/// The default cache is set once for the life of the process.
pub fn init(registry: Arc<TypeRegistry>) -> Result<&'static MethodCache, Error> {
    let mut created = false;
    let cache = DEFAULT.get_or_init(|| {
        created = true;
        MethodCache::new(registry)
    });
    if created {
        log::debug!("default method cache initialized");
        Ok(cache)
    } else {
        Err(Error::AlreadyInitialized)
    }
}

/// Returns the cache installed by [`init`].
#[inline]
pub fn default_cache() -> Result<&'static MethodCache, Error> {
    DEFAULT.get().ok_or(Error::Uninitialized)
}

/// Serializes `value` as a `ty` with the default cache.
pub fn serialize(ty: TypeHandle, value: &Data, options: SerializationOptions) -> Result<Data, Error> {
    Ok(default_cache()?.serialize(ty, value, options)?)
}

/// Deserializes `data` into a `ty` with the default cache.
pub fn deserialize(ty: TypeHandle, data: &Data, options: DeserializationOptions) -> Result<Data, Error> {
    Ok(default_cache()?.deserialize(ty, data, options)?)
}

/// Drops the procedures of the default cache, if any.
pub fn clear_cache() {
    if let Some(cache) = DEFAULT.get() {
        cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vc_method::conversion::Conversion;
    use vc_method::info::{FieldInfo, ObjectInfo};
    use vc_method::{CompileError, ConvertError, SerializeErrorKind};
    use vc_value::ObjectData;

    fn tree(value: serde_json::Value) -> Data {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn default_cache_lifecycle() {
        let mut registry = TypeRegistry::new();
        let ints = registry.list_of(registry.int());
        let registry = Arc::new(registry);

        assert!(matches!(
            serialize(ints, &Data::list([]), Default::default()),
            Err(Error::Uninitialized)
        ));
        init(registry.clone()).unwrap();
        assert!(matches!(init(registry), Err(Error::AlreadyInitialized)));

        let data = tree(json!([1, 2]));
        let value = deserialize(ints, &data, Default::default()).unwrap();
        assert_eq!(serialize(ints, &value, Default::default()).unwrap(), data);
        clear_cache();
        assert_eq!(serialize(ints, &value, Default::default()).unwrap(), data);
    }

    #[test]
    fn round_trip() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let str = registry.str();
        let tags = registry.set_of(str);
        let scores = registry.mapping_of(str, int);
        let item = registry.object(
            "Item",
            ObjectInfo::new([
                FieldInfo::new("name", str),
                FieldInfo::new("tags", tags),
                FieldInfo::new("scores", scores),
            ])
            .unwrap(),
        );
        let cache = MethodCache::new(Arc::new(registry));

        let data = tree(json!({"name": "a", "tags": ["x", "y"], "scores": {"x": 1}}));
        let value = cache.deserialize(item, &data, Default::default()).unwrap();
        assert!(matches!(
            value.as_object().unwrap().get("tags"),
            Some(Data::Set(_))
        ));
        assert_eq!(cache.serialize(item, &value, Default::default()).unwrap(), data);
    }

    #[test]
    fn integer_keys_round_trip() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let counts = registry.mapping_of(int, int);
        let cache = MethodCache::new(Arc::new(registry));

        let data = tree(json!({"1": 10, "-2": 20}));
        let value = cache.deserialize(counts, &data, Default::default()).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get(&Data::Int(1)), Some(&Data::from(10)));
        assert_eq!(map.get(&Data::Int(-2)), Some(&Data::from(20)));
        assert_eq!(cache.serialize(counts, &value, Default::default()).unwrap(), data);

        let error = cache
            .deserialize(counts, &tree(json!({"x": 1})), Default::default())
            .unwrap_err();
        assert_eq!(error.to_string(), "$.x: expected type int, found str");
    }

    #[test]
    fn tagged_union_round_trip() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let str = registry.str();
        let cat = registry.object("Cat", ObjectInfo::new([FieldInfo::new("lives", int)]).unwrap());
        let dog = registry.object("Dog", ObjectInfo::new([FieldInfo::new("name", str)]).unwrap());
        let pet = registry.tagged_union("kind", [("cat", cat), ("dog", dog)]).unwrap();
        let pets = registry.list_of(pet);
        let cache = MethodCache::new(Arc::new(registry));

        let data = tree(json!([{"kind": "cat", "lives": 9}, {"kind": "dog", "name": "rex"}]));
        let value = cache.deserialize(pets, &data, Default::default()).unwrap();
        assert_eq!(cache.serialize(pets, &value, Default::default()).unwrap(), data);
    }

    #[test]
    fn recursive_node() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let node = registry.declare_object("Node");
        let next = registry.optional(node);
        registry
            .define_object(
                node,
                ObjectInfo::new([FieldInfo::new("value", int), FieldInfo::new("next", next)]).unwrap(),
            )
            .unwrap();
        let cache = MethodCache::new(Arc::new(registry));

        let last = ObjectData::new(node.class_id())
            .with("value", 2)
            .with("next", Data::Null);
        let first = ObjectData::new(node.class_id())
            .with("value", 1)
            .with("next", Data::object(last));
        let out = cache
            .serialize(node, &Data::object(first), Default::default())
            .unwrap();
        let expected = tree(json!({"value": 1, "next": {"value": 2, "next": null}}));
        assert_eq!(out, expected);

        let back = cache.deserialize(node, &expected, Default::default()).unwrap();
        assert_eq!(cache.serialize(node, &back, Default::default()).unwrap(), expected);
    }

    #[test]
    fn union_order_and_fallback() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let str = registry.str();
        let list = registry.list_of(int);
        let sequence = registry.sequence_of(int);
        registry
            .register_serializer(Conversion::new(list, str, |value: Data| {
                let count = value.as_seq().map_or(0, |items| items.len());
                Ok(Data::str(alloc::format!("{count} items")))
            }))
            .unwrap();
        let list_first = registry.union_of([list, sequence]);
        let sequence_first = registry.union_of([sequence, list]);
        let cache = MethodCache::new(Arc::new(registry));

        let value = Data::list([Data::from(1), Data::from(2)]);
        let options = SerializationOptions::default();
        assert_eq!(
            cache.serialize(list_first, &value, options).unwrap(),
            Data::from("2 items")
        );
        assert_eq!(cache.serialize(sequence_first, &value, options).unwrap(), value);

        let error = cache.serialize(list_first, &Data::from("x"), options).unwrap_err();
        assert!(matches!(
            error,
            vc_method::Error::Serialize(ref error)
                if matches!(error.kind, SerializeErrorKind::TypeMismatch { .. })
        ));

        let lenient = SerializationOptions {
            fall_back_on_any: true,
            ..options
        };
        assert_eq!(
            cache.serialize(list_first, &Data::from("x"), lenient).unwrap(),
            Data::from("x")
        );
    }

    #[test]
    fn exclude_unset_suppresses_defaults() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let maybe = registry.optional(int);
        let foo = registry.object(
            "Foo",
            ObjectInfo::new([
                FieldInfo::new("bar", int),
                FieldInfo::new("baz", maybe).with_default(Data::Null),
            ])
            .unwrap(),
        );
        let cache = MethodCache::new(Arc::new(registry));

        let value = cache
            .deserialize(foo, &tree(json!({"bar": 0})), Default::default())
            .unwrap();
        assert_eq!(
            cache.serialize(foo, &value, Default::default()).unwrap(),
            tree(json!({"bar": 0}))
        );
        let everything = SerializationOptions {
            exclude_unset: false,
            ..Default::default()
        };
        assert_eq!(
            cache.serialize(foo, &value, everything).unwrap(),
            tree(json!({"bar": 0, "baz": null}))
        );
    }

    #[test]
    fn missing_properties_accumulate() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let point = registry.object(
            "Point",
            ObjectInfo::new([FieldInfo::new("x", int), FieldInfo::new("y", int)]).unwrap(),
        );
        let cache = MethodCache::new(Arc::new(registry));

        let error = cache
            .deserialize(point, &tree(json!({})), Default::default())
            .unwrap_err();
        let error = match error {
            vc_method::Error::Validation(error) => error,
            other => panic!("unexpected {other}"),
        };
        let flat: Vec<(String, String)> = error
            .flatten()
            .into_iter()
            .map(|(path, message)| (path.to_string(), message.to_string()))
            .collect();
        assert_eq!(
            flat,
            [
                ("$.x".to_string(), "missing property".to_string()),
                ("$.y".to_string(), "missing property".to_string()),
            ]
        );
    }

    #[test]
    fn conversion_cycle_is_rejected() {
        struct X;
        struct Y;

        let mut registry = TypeRegistry::new();
        let x = registry.custom::<X>("X");
        let y = registry.custom::<Y>("Y");
        registry
            .register_serializer(Conversion::new(x, y, |_| Err(ConvertError::from("unreachable"))))
            .unwrap();
        registry
            .register_serializer(Conversion::new(y, x, |_| Err(ConvertError::from("unreachable"))))
            .unwrap();
        let cache = MethodCache::new(Arc::new(registry));

        let error = cache
            .serialization_method(x, None, Default::default())
            .err()
            .unwrap();
        assert_eq!(
            error,
            CompileError::NonTerminating { name: "X".into() }
        );
    }
}
