use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_value::{ClassId, Data, EnumData};

// -----------------------------------------------------------------------------
// EnumInfo

/// An enumeration class: named members, each enclosing a value.
#[derive(Debug, Clone)]
pub struct EnumInfo {
    class: ClassId,
    members: Arc<[Arc<EnumData>]>,
}

impl EnumInfo {
    pub(crate) fn new(class: ClassId, members: Vec<(Arc<str>, Data)>) -> Self {
        let members = members
            .into_iter()
            .map(|(name, value)| Arc::new(EnumData::new(class, name, value)))
            .collect();
        Self { class, members }
    }

    #[inline]
    pub const fn class(&self) -> ClassId {
        self.class
    }

    #[inline]
    pub fn members(&self) -> &[Arc<EnumData>] {
        &self.members
    }

    /// Looks a member up by name.
    pub fn member(&self, name: &str) -> Option<Data> {
        self.members
            .iter()
            .find(|member| member.name() == name)
            .map(|member| Data::Enum(member.clone()))
    }

    /// Returns `true` if every member encloses a primitive scalar.
    pub fn has_scalar_values(&self) -> bool {
        self.members.iter().all(|member| member.value().is_scalar())
    }
}

// -----------------------------------------------------------------------------
// LiteralInfo

/// A fixed set of allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiteralInfo {
    values: Arc<[Data]>,
}

impl LiteralInfo {
    #[inline]
    pub fn new(values: impl Into<Arc<[Data]>>) -> Self {
        Self {
            values: values.into(),
        }
    }

    #[inline]
    pub fn values(&self) -> &[Data] {
        &self.values
    }

    /// Returns `true` if every literal is a primitive scalar.
    pub fn has_scalar_values(&self) -> bool {
        self.values.iter().all(Data::is_scalar)
    }
}
