use alloc::sync::Arc;

use crate::info::TypeHandle;

// -----------------------------------------------------------------------------
// TupleInfo

/// A fixed-arity heterogeneous tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleInfo {
    items: Arc<[TypeHandle]>,
}

impl TupleInfo {
    #[inline]
    pub fn new(items: impl Into<Arc<[TypeHandle]>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    #[inline]
    pub fn items(&self) -> &[TypeHandle] {
        &self.items
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.items.len()
    }
}

// -----------------------------------------------------------------------------
// Discriminator

/// The property naming which alternative of a tagged union a map holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Discriminator {
    property: Arc<str>,
    /// One tag per alternative, in the same order.
    tags: Arc<[Arc<str>]>,
}

impl Discriminator {
    #[inline]
    pub fn new(property: impl Into<Arc<str>>, tags: impl Into<Arc<[Arc<str>]>>) -> Self {
        Self {
            property: property.into(),
            tags: tags.into(),
        }
    }

    #[inline]
    pub fn property(&self) -> &Arc<str> {
        &self.property
    }

    #[inline]
    pub fn tags(&self) -> &[Arc<str>] {
        &self.tags
    }
}

// -----------------------------------------------------------------------------
// UnionInfo

/// Alternatives in declaration order.
///
/// Order matters: serialization picks the first eligible alternative.
/// A tagged union instead selects its alternative by the
/// [`Discriminator`] property of the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionInfo {
    alternatives: Arc<[TypeHandle]>,
    discriminator: Option<Discriminator>,
}

impl UnionInfo {
    #[inline]
    pub fn new(alternatives: impl Into<Arc<[TypeHandle]>>) -> Self {
        Self {
            alternatives: alternatives.into(),
            discriminator: None,
        }
    }

    #[inline]
    pub fn tagged(alternatives: impl Into<Arc<[TypeHandle]>>, discriminator: Discriminator) -> Self {
        Self {
            alternatives: alternatives.into(),
            discriminator: Some(discriminator),
        }
    }

    #[inline]
    pub fn alternatives(&self) -> &[TypeHandle] {
        &self.alternatives
    }

    #[inline]
    pub const fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    /// Pairs each alternative with its tag; empty for untagged unions.
    pub fn tagged_alternatives(&self) -> impl Iterator<Item = (&Arc<str>, TypeHandle)> {
        self.discriminator
            .iter()
            .flat_map(|discriminator| discriminator.tags.iter())
            .zip(self.alternatives.iter().copied())
    }
}
