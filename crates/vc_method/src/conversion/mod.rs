//! Conversions between types and their resolution.
//!
//! A [`Conversion`] maps values of a source type to a target type. Static
//! conversions are registered per type in the
//! [`TypeRegistry`](crate::registry::TypeRegistry); dynamic ones are passed
//! with a single compile request as [`Conversions`].
//!
//! [`resolve_serialization`] and [`resolve_deserialization`] decide which
//! conversion applies to a type, and are public so that schema generators
//! walk types exactly like the compiler does.

// -----------------------------------------------------------------------------
// Modules

mod conversion;
mod conversions;
mod resolver;

// -----------------------------------------------------------------------------
// Exports

pub use conversion::{Conversion, ConversionOverrides, Converter, ConverterFn};
pub use conversions::Conversions;
pub use resolver::{DeserializationResolution, ResolvedConversion, SerializationResolution};
pub use resolver::{resolve_deserialization, resolve_serialization};
