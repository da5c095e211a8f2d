use vc_value::DataClass;

use crate::info::TypeHandle;

// -----------------------------------------------------------------------------
// CollectionKind

/// The concrete container of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// An ordered list, already a tree sequence.
    List,
    /// A set, serialized as a list.
    Set,
    /// A variadic homogeneous tuple, serialized as a list.
    Tuple,
    /// Any sequence: list, tuple or set are all accepted.
    Sequence,
}

impl CollectionKind {
    pub const fn classes(self) -> &'static [DataClass] {
        match self {
            Self::List => &[DataClass::List],
            Self::Set => &[DataClass::Set],
            Self::Tuple => &[DataClass::Tuple],
            Self::Sequence => &[DataClass::List, DataClass::Tuple, DataClass::Set],
        }
    }

    /// Returns `true` when the container already is a tree sequence.
    #[inline]
    pub const fn is_tree(self) -> bool {
        matches!(self, Self::List)
    }

    pub(crate) const fn prefix(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Set => "set",
            Self::Tuple => "tuple",
            Self::Sequence => "sequence",
        }
    }
}

// -----------------------------------------------------------------------------
// CollectionInfo

/// A homogeneous collection of `item`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionInfo {
    kind: CollectionKind,
    item: TypeHandle,
}

impl CollectionInfo {
    #[inline]
    pub const fn new(kind: CollectionKind, item: TypeHandle) -> Self {
        Self { kind, item }
    }

    #[inline]
    pub const fn kind(&self) -> CollectionKind {
        self.kind
    }

    #[inline]
    pub const fn item(&self) -> TypeHandle {
        self.item
    }
}

// -----------------------------------------------------------------------------
// MappingInfo

/// A mapping from `key` to `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappingInfo {
    key: TypeHandle,
    value: TypeHandle,
}

impl MappingInfo {
    #[inline]
    pub const fn new(key: TypeHandle, value: TypeHandle) -> Self {
        Self { key, value }
    }

    #[inline]
    pub const fn key(&self) -> TypeHandle {
        self.key
    }

    #[inline]
    pub const fn value(&self) -> TypeHandle {
        self.value
    }
}
