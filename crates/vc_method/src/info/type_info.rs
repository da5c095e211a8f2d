use alloc::sync::Arc;
use core::any::TypeId;
use core::fmt;

use thiserror::Error;
use vc_value::DataClass;

use crate::info::{CollectionInfo, EnumInfo, LiteralInfo, MappingInfo};
use crate::info::{ObjectInfo, TupleInfo, UnionInfo};

// -----------------------------------------------------------------------------
// ShapeKind

/// The closed set of structural categories a type can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Primitive,
    Object,
    Collection,
    Mapping,
    Tuple,
    Union,
    Enum,
    Literal,
    Any,
    Custom,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive => f.pad("Primitive"),
            Self::Object => f.pad("Object"),
            Self::Collection => f.pad("Collection"),
            Self::Mapping => f.pad("Mapping"),
            Self::Tuple => f.pad("Tuple"),
            Self::Union => f.pad("Union"),
            Self::Enum => f.pad("Enum"),
            Self::Literal => f.pad("Literal"),
            Self::Any => f.pad("Any"),
            Self::Custom => f.pad("Custom"),
        }
    }
}

/// Error returned when a [`TypeInfo`] is not the expected [`ShapeKind`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("shape kind mismatch: expected {expected}, received {received}")]
pub struct ShapeKindError {
    pub expected: ShapeKind,
    pub received: ShapeKind,
}

// -----------------------------------------------------------------------------
// Primitive

/// Scalar types that are their own tree representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

impl Primitive {
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
        }
    }

    /// Classes a value of this primitive may have. Ints are valid floats.
    pub const fn classes(self) -> &'static [DataClass] {
        match self {
            Self::Null => &[DataClass::Null],
            Self::Bool => &[DataClass::Bool],
            Self::Int => &[DataClass::Int],
            Self::Float => &[DataClass::Float, DataClass::Int],
            Self::Str => &[DataClass::Str],
        }
    }
}

// -----------------------------------------------------------------------------
// CustomInfo

/// A host type known only through its conversions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomInfo {
    type_id: TypeId,
    type_name: &'static str,
}

impl CustomInfo {
    #[inline]
    pub const fn new(type_id: TypeId, type_name: &'static str) -> Self {
        Self { type_id, type_name }
    }

    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// The shape of one registered type.
///
/// Nested types are referenced through [`TypeHandle`](crate::info::TypeHandle),
/// so a `TypeInfo` is a single node of a possibly cyclic type graph.
#[derive(Debug, Clone)]
pub enum TypeInfo {
    Primitive(Primitive),
    Object(ObjectInfo),
    Collection(CollectionInfo),
    Mapping(MappingInfo),
    Tuple(TupleInfo),
    Union(UnionInfo),
    Enum(EnumInfo),
    Literal(LiteralInfo),
    Any,
    Custom(CustomInfo),
}

macro_rules! impl_cast_method {
    ($name:ident : $kind:ident => $info:ident) => {
        /// Convert [`TypeInfo`] to specific shape information.
        pub const fn $name(&self) -> Result<&$info, ShapeKindError> {
            match self {
                Self::$kind(info) => Ok(info),
                _ => Err(ShapeKindError {
                    expected: ShapeKind::$kind,
                    received: self.kind(),
                }),
            }
        }
    };
}

impl TypeInfo {
    impl_cast_method!(as_object: Object => ObjectInfo);
    impl_cast_method!(as_collection: Collection => CollectionInfo);
    impl_cast_method!(as_mapping: Mapping => MappingInfo);
    impl_cast_method!(as_tuple: Tuple => TupleInfo);
    impl_cast_method!(as_union: Union => UnionInfo);
    impl_cast_method!(as_enum: Enum => EnumInfo);
    impl_cast_method!(as_literal: Literal => LiteralInfo);
    impl_cast_method!(as_custom: Custom => CustomInfo);

    /// Returns the shape kind.
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Primitive(_) => ShapeKind::Primitive,
            Self::Object(_) => ShapeKind::Object,
            Self::Collection(_) => ShapeKind::Collection,
            Self::Mapping(_) => ShapeKind::Mapping,
            Self::Tuple(_) => ShapeKind::Tuple,
            Self::Union(_) => ShapeKind::Union,
            Self::Enum(_) => ShapeKind::Enum,
            Self::Literal(_) => ShapeKind::Literal,
            Self::Any => ShapeKind::Any,
            Self::Custom(_) => ShapeKind::Custom,
        }
    }

    /// Returns `true` if conversions may be attached to this type.
    ///
    /// Unions, literals and `Any` are resolved through their members.
    #[inline]
    pub const fn is_convertible(&self) -> bool {
        !matches!(self, Self::Union(_) | Self::Literal(_) | Self::Any)
    }

    /// Returns `true` for shapes whose call-site conversions flow down to
    /// their items.
    #[inline]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Collection(_) | Self::Mapping(_) | Self::Tuple(_))
    }
}

/// Classes accepted for a type, or any class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classes {
    Any,
    Only(Arc<[DataClass]>),
}

impl Classes {
    #[inline]
    pub fn contains(&self, class: DataClass) -> bool {
        match self {
            Self::Any => true,
            Self::Only(classes) => classes.contains(&class),
        }
    }
}
