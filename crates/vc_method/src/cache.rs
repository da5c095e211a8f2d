use alloc::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use vc_value::Data;

use crate::conversion::Conversions;
use crate::de::{self, DeMethod, DeserializationMethod};
use crate::error::{CompileError, Error};
use crate::hash::HashMap;
use crate::info::TypeHandle;
use crate::options::{DeserializationOptions, SerializationOptions};
use crate::registry::TypeRegistry;
use crate::ser::{self, SerMethod, SerializationMethod};

// -----------------------------------------------------------------------------
// MethodTable

type Slot<M> = Arc<OnceCell<Arc<M>>>;

/// Procedures of one options value, keyed by type and conversions.
///
/// Each key owns a cell; concurrent callers for the same key block on the
/// cell, not on the table, and the first one to succeed publishes.
struct MethodTable<M: ?Sized> {
    slots: Mutex<HashMap<(TypeHandle, Option<Conversions>), Slot<M>>>,
}

impl<M: ?Sized> MethodTable<M> {
    fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::default()),
        }
    }

    fn slot(&self, ty: TypeHandle, conversions: Option<&Conversions>) -> Slot<M> {
        self.slots
            .lock()
            .entry((ty, conversions.cloned()))
            .or_default()
            .clone()
    }

    fn peek(&self, ty: TypeHandle, conversions: Option<&Conversions>) -> Option<Arc<M>> {
        let slots = self.slots.lock();
        slots.get(&(ty, conversions.cloned()))?.get().cloned()
    }
}

// -----------------------------------------------------------------------------
// CacheInner

pub(crate) struct CacheInner {
    registry: Arc<TypeRegistry>,
    serializers: RwLock<HashMap<SerializationOptions, Arc<MethodTable<dyn SerializationMethod>>>>,
    deserializers: RwLock<HashMap<DeserializationOptions, Arc<MethodTable<dyn DeserializationMethod>>>>,
}

/// Returns the table of `options`, creating it under the write lock.
fn table_of<O, M>(tables: &RwLock<HashMap<O, Arc<MethodTable<M>>>>, options: O) -> Arc<MethodTable<M>>
where
    O: Eq + core::hash::Hash,
    M: ?Sized,
{
    if let Some(table) = tables.read().get(&options) {
        return table.clone();
    }
    tables
        .write()
        .entry(options)
        .or_insert_with(|| Arc::new(MethodTable::new()))
        .clone()
}

impl CacheInner {
    pub(crate) fn serialization_method(
        self: &Arc<Self>,
        ty: TypeHandle,
        conversions: Option<&Conversions>,
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        let slot = table_of(&self.serializers, options).slot(ty, conversions);
        slot.get_or_try_init(|| {
            log::trace!("serialization cache miss for {ty}");
            ser::compile(&self.registry, Arc::downgrade(self), ty, conversions, options)
        })
        .cloned()
    }

    pub(crate) fn deserialization_method(
        &self,
        ty: TypeHandle,
        conversions: Option<&Conversions>,
        options: DeserializationOptions,
    ) -> Result<DeMethod, CompileError> {
        let slot = table_of(&self.deserializers, options).slot(ty, conversions);
        slot.get_or_try_init(|| {
            log::trace!("deserialization cache miss for {ty}");
            de::compile(&self.registry, ty, conversions, options)
        })
        .cloned()
    }

    fn clear(&self) {
        self.serializers.write().clear();
        self.deserializers.write().clear();
    }
}

// -----------------------------------------------------------------------------
// MethodCache

/// Memoized procedures for one registry.
///
/// Compilation is keyed by type, conversions and options. Repeated
/// requests return the same shared procedure; a compile error is not
/// cached, so a later request retries.
///
/// Cloning is cheap and clones share their storage.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_method::registry::TypeRegistry;
/// use vc_method::{MethodCache, SerializationOptions};
///
/// let mut registry = TypeRegistry::new();
/// let ints = registry.set_of(registry.int());
/// let cache = MethodCache::new(Arc::new(registry));
///
/// let options = SerializationOptions::default();
/// let first = cache.serialization_method(ints, None, options).unwrap();
/// let second = cache.serialization_method(ints, None, options).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Clone)]
pub struct MethodCache(Arc<CacheInner>);

impl MethodCache {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self(Arc::new(CacheInner {
            registry,
            serializers: RwLock::new(HashMap::default()),
            deserializers: RwLock::new(HashMap::default()),
        }))
    }

    #[inline]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.0.registry
    }

    /// Returns the serialization procedure of `ty`, compiling it once.
    pub fn serialization_method(
        &self,
        ty: TypeHandle,
        conversions: Option<&Conversions>,
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        self.0.serialization_method(ty, conversions, options)
    }

    /// Returns the deserialization procedure of `ty`, compiling it once.
    pub fn deserialization_method(
        &self,
        ty: TypeHandle,
        conversions: Option<&Conversions>,
        options: DeserializationOptions,
    ) -> Result<DeMethod, CompileError> {
        self.0.deserialization_method(ty, conversions, options)
    }

    /// Serializes `value` as a `ty`.
    pub fn serialize(
        &self,
        ty: TypeHandle,
        value: &Data,
        options: SerializationOptions,
    ) -> Result<Data, Error> {
        let method = self.serialization_method(ty, None, options)?;
        Ok(method.serialize(value)?)
    }

    /// Validates `data` and builds a `ty` from it.
    pub fn deserialize(
        &self,
        ty: TypeHandle,
        data: &Data,
        options: DeserializationOptions,
    ) -> Result<Data, Error> {
        let method = self.deserialization_method(ty, None, options)?;
        Ok(method.deserialize(data)?)
    }

    /// Returns the cached serialization procedure without compiling.
    pub fn peek_serialization(
        &self,
        ty: TypeHandle,
        conversions: Option<&Conversions>,
        options: SerializationOptions,
    ) -> Option<SerMethod> {
        self.0.serializers.read().get(&options)?.peek(ty, conversions)
    }

    /// Returns the cached deserialization procedure without compiling.
    pub fn peek_deserialization(
        &self,
        ty: TypeHandle,
        conversions: Option<&Conversions>,
        options: DeserializationOptions,
    ) -> Option<DeMethod> {
        self.0.deserializers.read().get(&options)?.peek(ty, conversions)
    }

    /// Drops every cached procedure.
    ///
    /// Procedures already handed out keep working.
    pub fn clear(&self) {
        log::debug!("clearing method cache");
        self.0.clear();
    }
}

impl core::fmt::Debug for MethodCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MethodCache")
            .field("serializers", &self.0.serializers.read().len())
            .field("deserializers", &self.0.deserializers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{FieldInfo, ObjectInfo};
    use alloc::vec::Vec;
    use vc_value::{MapData, ObjectData};

    fn registry() -> (Arc<TypeRegistry>, TypeHandle, TypeHandle) {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let point = registry.object(
            "Point",
            ObjectInfo::new([FieldInfo::new("x", int), FieldInfo::new("y", int)]).unwrap(),
        );
        let any = registry.list_of(registry.any());
        (Arc::new(registry), point, any)
    }

    #[test]
    fn repeated_requests_share_one_procedure() {
        let (registry, point, _) = registry();
        let cache = MethodCache::new(registry);
        let options = SerializationOptions::default();

        assert!(cache.peek_serialization(point, None, options).is_none());
        let first = cache.serialization_method(point, None, options).unwrap();
        let second = cache.serialization_method(point, None, options).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.peek_serialization(point, None, options).is_some());

        let other = SerializationOptions {
            exclude_unset: false,
            ..options
        };
        let third = cache.serialization_method(point, None, other).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));

        let de_options = DeserializationOptions::default();
        let first = cache.deserialization_method(point, None, de_options).unwrap();
        let second = cache.deserialization_method(point, None, de_options).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn clear_recompiles_equivalent_procedures() {
        let (registry, point, _) = registry();
        let cache = MethodCache::new(registry);
        let value = Data::object(ObjectData::new(point.class_id()).with("x", 1).with("y", 2));
        let options = SerializationOptions::default();

        let before = cache.serialize(point, &value, options).unwrap();
        let method = cache.serialization_method(point, None, options).unwrap();
        cache.clear();
        assert!(cache.peek_serialization(point, None, options).is_none());

        let after = cache.serialize(point, &value, options).unwrap();
        assert_eq!(before, after);
        assert_eq!(method.serialize(&value).unwrap(), after);
    }

    #[test]
    fn any_dispatch_outlives_the_cache() {
        let (registry, point, any_list) = registry();
        let cache = MethodCache::new(registry);
        let options = SerializationOptions::default();
        let method = cache.serialization_method(any_list, None, options).unwrap();

        let value = Data::list([Data::object(ObjectData::new(point.class_id()).with("x", 1).with("y", 2))]);
        let expected = Data::list([Data::map(
            [(Data::from("x"), Data::from(1)), (Data::from("y"), Data::from(2))]
                .into_iter()
                .collect::<MapData>(),
        )]);

        assert_eq!(method.serialize(&value).unwrap(), expected);
        cache.clear();
        assert_eq!(method.serialize(&value).unwrap(), expected);
        drop(cache);
        assert_eq!(method.serialize(&value).unwrap(), expected);
    }

    #[test]
    fn errors_are_not_cached() {
        struct Opaque;

        let mut registry = TypeRegistry::new();
        let opaque = registry.custom::<Opaque>("Opaque");
        let cache = MethodCache::new(Arc::new(registry));
        let options = SerializationOptions::default();

        for _ in 0..2 {
            let error = cache.serialization_method(opaque, None, options).err().unwrap();
            assert_eq!(error.to_string(), "unsupported type `Opaque`");
        }
        assert!(cache.peek_serialization(opaque, None, options).is_none());
    }

    #[test]
    fn concurrent_requests_agree() {
        let (registry, point, _) = registry();
        let cache = MethodCache::new(registry);
        let options = DeserializationOptions::default();

        let methods: Vec<DeMethod> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| cache.deserialization_method(point, None, options).unwrap()))
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });
        assert!(methods.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }
}
