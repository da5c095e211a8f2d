use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use thiserror::Error;
use vc_value::DataClass;

use crate::info::TypeHandle;
use crate::validation::ValidationError;

// -----------------------------------------------------------------------------
// ErrorKey / ErrorPath

/// One step of a location inside a value or a tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKey {
    Index(usize),
    Key(Arc<str>),
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Key(key) => write!(f, ".{key}"),
        }
    }
}

impl From<usize> for ErrorKey {
    #[inline]
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl From<&str> for ErrorKey {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Key(value.into())
    }
}

impl From<Arc<str>> for ErrorKey {
    #[inline]
    fn from(value: Arc<str>) -> Self {
        Self::Key(value)
    }
}

/// A location from the root, displayed as `$.field[0]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ErrorPath(Vec<ErrorKey>);

impl ErrorPath {
    #[inline]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    #[inline]
    pub fn keys(&self) -> &[ErrorKey] {
        &self.0
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn prepend(&mut self, key: ErrorKey) {
        self.0.insert(0, key);
    }
}

impl From<Vec<ErrorKey>> for ErrorPath {
    #[inline]
    fn from(value: Vec<ErrorKey>) -> Self {
        Self(value)
    }
}

impl fmt::Display for ErrorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for key in &self.0 {
            fmt::Display::fmt(key, f)?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// ConvertError

/// Failure reported by a user supplied converter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ConvertError {
    message: Arc<str>,
}

impl ConvertError {
    pub fn new(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string().into(),
        }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for ConvertError {
    #[inline]
    fn from(value: &str) -> Self {
        Self {
            message: value.into(),
        }
    }
}

impl From<String> for ConvertError {
    #[inline]
    fn from(value: String) -> Self {
        Self {
            message: value.into(),
        }
    }
}

// -----------------------------------------------------------------------------
// CompileError

/// Failure to build a procedure for a type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompileError {
    #[error("unsupported type `{name}`")]
    Unsupported { name: Arc<str> },

    #[error("recursive type `{name}` never terminates, it needs an explicit reference")]
    NonTerminating { name: Arc<str> },

    #[error("type handle {0} is not registered")]
    UnknownType(TypeHandle),

    #[error("flattened field `{field}` of `{object}` must be an object or a mapping")]
    InvalidFlatten { object: Arc<str>, field: Arc<str> },

    #[error("alias `{alias}` is used by more than one field of `{object}`")]
    DuplicateAlias { object: Arc<str>, alias: Arc<str> },
}

impl CompileError {
    /// Returns `true` for the errors a union skips instead of failing.
    #[inline]
    pub const fn is_skippable(&self) -> bool {
        matches!(self, Self::Unsupported { .. } | Self::NonTerminating { .. })
    }
}

// -----------------------------------------------------------------------------
// SerializeError

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SerializeErrorKind {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: Arc<str>, found: DataClass },

    #[error("expected {expected} items, found {found}")]
    Arity { expected: usize, found: usize },

    #[error("conversion failed: {0}")]
    Conversion(ConvertError),

    #[error("map key of class {0} does not serialize to a string")]
    MapKey(DataClass),

    #[error("flattened field must serialize to a map, found {0}")]
    Flatten(DataClass),

    #[error("no type registered for class {0}")]
    UnknownClass(DataClass),

    #[error("recursive procedure used before it was bound")]
    Unbound,

    #[error(transparent)]
    Compile(CompileError),
}

/// Failure while running a serialization procedure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} (at `{path}`)")]
pub struct SerializeError {
    pub path: ErrorPath,
    pub kind: SerializeErrorKind,
}

impl SerializeError {
    #[inline]
    pub fn new(kind: SerializeErrorKind) -> Self {
        Self {
            path: ErrorPath::root(),
            kind,
        }
    }

    pub(crate) fn mismatch(expected: &Arc<str>, found: DataClass) -> Self {
        Self::new(SerializeErrorKind::TypeMismatch {
            expected: expected.clone(),
            found,
        })
    }

    /// Prefixes the error location with `key`.
    pub(crate) fn at(mut self, key: impl Into<ErrorKey>) -> Self {
        self.path.prepend(key.into());
        self
    }
}

impl From<ConvertError> for SerializeError {
    #[inline]
    fn from(value: ConvertError) -> Self {
        Self::new(SerializeErrorKind::Conversion(value))
    }
}

impl From<CompileError> for SerializeError {
    #[inline]
    fn from(value: CompileError) -> Self {
        Self::new(SerializeErrorKind::Compile(value))
    }
}

// -----------------------------------------------------------------------------
// FieldError / RegistryError

/// An inconsistent field declaration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldError {
    #[error("field `{0}` is not required but has no default")]
    MissingDefault(Arc<str>),

    #[error("field `{0}` is read-only and must have a default")]
    ReadOnlyRequired(Arc<str>),

    #[error("flattened field `{0}` cannot have an alias")]
    FlattenedAlias(Arc<str>),

    #[error("alias `{0}` is used by more than one field")]
    DuplicateAlias(Arc<str>),

    #[error("validator refers to unknown field `{0}`")]
    UnknownField(Arc<str>),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("type handle {0} is not registered")]
    UnknownType(TypeHandle),

    #[error("type `{name}` is not a declared object")]
    NotAnObject { name: Arc<str> },

    #[error("object `{name}` is already defined")]
    AlreadyDefined { name: Arc<str> },

    #[error("type `{name}` does not accept conversions")]
    NotConvertible { name: Arc<str> },

    #[error("type `{name}` cannot carry constraints")]
    NotConstrainable { name: Arc<str> },

    #[error("tag `{tag}` is used by more than one alternative")]
    DuplicateTag { tag: Arc<str> },

    #[error(transparent)]
    Field(#[from] FieldError),
}

// -----------------------------------------------------------------------------
// Error

/// Any error raised by this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display() {
        let error = SerializeError::mismatch(&"int".into(), DataClass::Str)
            .at(1_usize)
            .at("items");
        assert_eq!(error.path.to_string(), "$.items[1]");
        assert_eq!(error.to_string(), "expected int, found str (at `$.items[1]`)");
    }

    #[test]
    fn skippable_errors() {
        assert!(CompileError::Unsupported { name: "x".into() }.is_skippable());
        assert!(!CompileError::UnknownType(TypeHandle::new(3)).is_skippable());
    }
}
