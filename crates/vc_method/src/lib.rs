//! Type-directed serialization and deserialization procedures.
//!
//! Types are described once in a [`TypeRegistry`](registry::TypeRegistry).
//! For each (type, conversions, options) the compiler walks the
//! description and builds a shared procedure:
//!
//! - [`ser::SerializationMethod`] turns a value into a tree of null,
//!   booleans, numbers, strings, lists and string-keyed maps;
//! - [`de::DeserializationMethod`] validates a tree and builds the value,
//!   reporting every problem at once in a [`ValidationError`].
//!
//! [`MethodCache`] memoizes the procedures of one registry. Recursive types
//! compile to procedures that reference themselves; a recursion that can
//! never produce a value is rejected with [`CompileError::NonTerminating`].
//!
//! ```
//! use std::sync::Arc;
//! use vc_method::info::{FieldInfo, ObjectInfo};
//! use vc_method::registry::TypeRegistry;
//! use vc_method::{DeserializationOptions, MethodCache, SerializationOptions};
//! use vc_value::{Data, MapData};
//!
//! let mut registry = TypeRegistry::new();
//! let int = registry.int();
//! let point = registry.object(
//!     "Point",
//!     ObjectInfo::new([FieldInfo::new("x", int), FieldInfo::new("y", int)]).unwrap(),
//! );
//! let cache = MethodCache::new(Arc::new(registry));
//!
//! let mut tree = MapData::new();
//! tree.insert_str("x", Data::from(1));
//! tree.insert_str("y", Data::from(2));
//! let tree = Data::map(tree);
//!
//! let value = cache.deserialize(point, &tree, DeserializationOptions::default()).unwrap();
//! let back = cache.serialize(point, &value, SerializationOptions::default()).unwrap();
//! assert_eq!(back, tree);
//! ```

extern crate alloc;

pub(crate) use vc_value::hash;

// -----------------------------------------------------------------------------
// Modules

mod cache;
mod error;
mod options;
mod recursion;
mod validation;

pub mod conversion;
pub mod de;
pub mod info;
pub mod registry;
pub mod ser;
pub mod shape;

// -----------------------------------------------------------------------------
// Exports

pub use cache::MethodCache;
pub use error::{CompileError, ConvertError, Error, ErrorKey, ErrorPath};
pub use error::{FieldError, RegistryError, SerializeError, SerializeErrorKind};
pub use options::{AliasStyle, DeserializationOptions, PassThrough, SerializationOptions};
pub use validation::ValidationError;

use alloc::sync::{Arc, Weak};

use conversion::Conversions;
use de::DeMethod;
use info::TypeHandle;
use registry::TypeRegistry;
use ser::SerMethod;

/// Compiles the serialization procedure of `ty` without caching it.
///
/// Values typed `Any` inside `ty` compile their procedure on each call;
/// prefer [`MethodCache`] when serializing repeatedly.
pub fn compile_serialization(
    registry: &Arc<TypeRegistry>,
    ty: TypeHandle,
    conversions: Option<&Conversions>,
    options: SerializationOptions,
) -> Result<SerMethod, CompileError> {
    ser::compile(registry, Weak::new(), ty, conversions, options)
}

/// Compiles the deserialization procedure of `ty` without caching it.
pub fn compile_deserialization(
    registry: &Arc<TypeRegistry>,
    ty: TypeHandle,
    conversions: Option<&Conversions>,
    options: DeserializationOptions,
) -> Result<DeMethod, CompileError> {
    de::compile(registry, ty, conversions, options)
}
