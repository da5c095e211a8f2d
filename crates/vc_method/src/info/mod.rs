//! Type descriptions consumed by the compiler.
//!
//! - [`TypeHandle`]: a stable index into a [`TypeRegistry`](crate::registry::TypeRegistry).
//! - [`TypeInfo`]: the closed set of shapes, one of:
//!     - [`Primitive`]: null, bool, int, float and str.
//!     - [`ObjectInfo`]: ordered [`FieldInfo`] entries plus [`SerializedField`] virtual fields.
//!     - [`CollectionInfo`]: list, set, variadic tuple or any sequence of one item type.
//!     - [`MappingInfo`]: key and value types.
//!     - [`TupleInfo`]: fixed-arity positions.
//!     - [`UnionInfo`]: alternatives in declaration order, optionally tagged by a [`Discriminator`].
//!     - [`EnumInfo`]: members enclosing values.
//!     - [`LiteralInfo`]: allowed values.
//!     - `Any`: resolved at run time from the value's class.
//!     - [`CustomInfo`]: a host type only reachable through conversions.
//! - [`ShapeKind`]: the kind of a `TypeInfo`.
//! - [`Constraints`] and [`Validator`]: input bounds and object checks applied
//!   while deserializing.

// -----------------------------------------------------------------------------
// Modules

mod collection_info;
mod composite_info;
mod constraints;
mod enum_info;
mod field_info;
mod object_info;
mod type_handle;
mod type_info;
mod validator;

// -----------------------------------------------------------------------------
// Exports

pub use collection_info::{CollectionInfo, CollectionKind, MappingInfo};
pub use composite_info::{Discriminator, TupleInfo, UnionInfo};
pub use constraints::Constraints;
pub use enum_info::{EnumInfo, LiteralInfo};
pub use field_info::{FieldDefault, FieldInfo, FieldKind};
pub use field_info::{SkipPolicy, SkipPredicate, Skippable};
pub use object_info::{ObjectInfo, SerializedField, SerializedFn};
pub use type_handle::TypeHandle;
pub use type_info::{Classes, CustomInfo, Primitive, ShapeKind, ShapeKindError, TypeInfo};
pub use validator::{Validator, ValidatorFn};
