use core::fmt;

use vc_value::ClassId;

/// A stable index into a [`TypeRegistry`](crate::registry::TypeRegistry).
///
/// Handles are cheap to copy and compare, which is what makes them usable
/// as cache and recursion keys. A handle is only meaningful for the
/// registry that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(u32);

impl TypeHandle {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The class id carried by values of a class-like type (object, enum).
    #[inline]
    pub const fn class_id(self) -> ClassId {
        ClassId::new(self.0)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
