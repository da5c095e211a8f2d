//! The arena of type descriptions.
//!
//! - [`TypeRegistry`]: builds and stores types, interns structural ones,
//!   and maps run-time classes back to types.
//! - [`TypeMeta`]: one entry: name, [`TypeInfo`](crate::info::TypeInfo) and
//!   static conversions.

// -----------------------------------------------------------------------------
// Modules

mod type_meta;
mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use type_meta::TypeMeta;
pub use type_registry::TypeRegistry;
