//! Deserialization procedures and their compiler.
//!
//! A [`DeserializationMethod`] validates a tree against one static type and
//! builds the in-memory value. Errors are accumulated: a malformed input
//! reports every failing field and element, not only the first one.
//!
//! ```
//! use std::sync::Arc;
//! use vc_method::info::{FieldInfo, ObjectInfo};
//! use vc_method::registry::TypeRegistry;
//! use vc_method::{DeserializationOptions, compile_deserialization};
//! use vc_value::{Data, MapData};
//!
//! let mut registry = TypeRegistry::new();
//! let int = registry.int();
//! let point = registry.object(
//!     "Point",
//!     ObjectInfo::new([FieldInfo::new("x", int), FieldInfo::new("y", int)]).unwrap(),
//! );
//! let registry = Arc::new(registry);
//!
//! let method = compile_deserialization(&registry, point, None, DeserializationOptions::default()).unwrap();
//! let error = method.deserialize(&Data::map(MapData::new())).unwrap_err();
//!
//! assert_eq!(error.to_string(), "$.x: missing property; $.y: missing property");
//! ```

use alloc::sync::Arc;

use vc_value::Data;

use crate::validation::ValidationError;

// -----------------------------------------------------------------------------
// Modules

mod coercion;
mod methods;
mod object;
mod visitor;

// -----------------------------------------------------------------------------
// DeserializationMethod

/// A compiled tree-to-value procedure.
pub trait DeserializationMethod: Send + Sync + 'static {
    fn deserialize(&self, data: &Data) -> Result<Data, ValidationError>;

    /// Returns `true` if a successful call returns its input unchanged.
    fn is_check_only(&self) -> bool {
        false
    }
}

/// A shared deserialization procedure.
pub type DeMethod = Arc<dyn DeserializationMethod>;

// -----------------------------------------------------------------------------
// Exports

pub(crate) use visitor::compile;
