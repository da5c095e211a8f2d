//! Serialization procedures and their compiler.
//!
//! A [`SerializationMethod`] turns an in-memory [`Data`] value of one static
//! type into a tree. Procedures are compiled once per (type, conversions,
//! options) and shared as [`SerMethod`].
//!
//! Procedures that leave their input untouched collapse to the shared
//! [`identity`] procedure, so callers can detect them by pointer:
//!
//! ```
//! use std::sync::Arc;
//! use vc_method::registry::TypeRegistry;
//! use vc_method::{SerializationOptions, compile_serialization, ser};
//!
//! let mut registry = TypeRegistry::new();
//! let ints = registry.list_of(registry.int());
//! let registry = Arc::new(registry);
//!
//! let method = compile_serialization(&registry, ints, None, SerializationOptions::default()).unwrap();
//! assert!(Arc::ptr_eq(&method, &ser::identity()));
//! ```

use alloc::sync::Arc;

use once_cell::sync::Lazy;
use vc_value::Data;

use crate::error::SerializeError;

// -----------------------------------------------------------------------------
// Modules

mod any;
mod methods;
mod object;
mod visitor;

// -----------------------------------------------------------------------------
// SerializationMethod

/// A compiled value-to-tree procedure.
pub trait SerializationMethod: Send + Sync + 'static {
    fn serialize(&self, value: &Data) -> Result<Data, SerializeError>;

    /// Returns `true` if the procedure returns its input unchanged and
    /// never fails.
    fn is_identity(&self) -> bool {
        false
    }

    /// Returns `true` if the procedure returns its input unchanged, though
    /// it may fail.
    fn is_check_only(&self) -> bool {
        self.is_identity()
    }
}

/// A shared serialization procedure.
pub type SerMethod = Arc<dyn SerializationMethod>;

static IDENTITY: Lazy<SerMethod> = Lazy::new(|| Arc::new(methods::IdentityMethod));

/// The shared identity procedure.
#[inline]
pub fn identity() -> SerMethod {
    IDENTITY.clone()
}

// -----------------------------------------------------------------------------
// Exports

pub(crate) use any::AnyMethod;
pub(crate) use visitor::compile;
