use alloc::sync::{Arc, Weak};

use vc_value::Data;

use crate::cache::CacheInner;
use crate::error::{CompileError, SerializeError, SerializeErrorKind};
use crate::info::TypeHandle;
use crate::options::SerializationOptions;
use crate::registry::TypeRegistry;
use crate::ser::{SerializationMethod, compile};

/// Serializes a value by its run-time class.
///
/// The procedure for the class is fetched from the cache on every call,
/// so it keeps working after the cache is cleared; once the cache itself
/// is gone it compiles without caching.
pub(crate) struct AnyMethod {
    cache: Weak<CacheInner>,
    registry: Arc<TypeRegistry>,
    options: SerializationOptions,
    origin: Option<TypeHandle>,
}

impl AnyMethod {
    pub(crate) fn new(
        cache: Weak<CacheInner>,
        registry: Arc<TypeRegistry>,
        options: SerializationOptions,
    ) -> Self {
        Self {
            cache,
            registry,
            options,
            origin: None,
        }
    }

    /// Never dispatches back to `origin`, whose procedure is this one.
    pub(crate) fn excluding(mut self, origin: TypeHandle) -> Self {
        self.origin = Some(origin);
        self
    }
}

impl SerializationMethod for AnyMethod {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError> {
        if value.is_scalar() {
            return Ok(value.clone());
        }
        let class = value.class();
        let Some(ty) = self.registry.type_of_class(class) else {
            log::warn!("no type registered for class {class}");
            return Err(SerializeError::new(SerializeErrorKind::UnknownClass(class)));
        };
        if self.origin == Some(ty) {
            let name = self.registry.name(ty).unwrap_or_default().into();
            return Err(CompileError::Unsupported { name }.into());
        }

        let method = match self.cache.upgrade() {
            Some(cache) => cache.serialization_method(ty, None, self.options)?,
            None => compile(&self.registry, Weak::new(), ty, None, self.options)?,
        };
        method.serialize(value)
    }
}
