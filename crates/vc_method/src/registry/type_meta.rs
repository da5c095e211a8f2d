use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::conversion::{Conversion, Conversions};
use crate::info::{Constraints, TypeInfo};

// -----------------------------------------------------------------------------
// TypeMeta

/// Everything the registry stores for one type: its display name, its
/// shape, its static conversions and the constraints of its input.
#[derive(Debug, Clone)]
pub struct TypeMeta {
    name: Arc<str>,
    info: TypeInfo,
    serialization: Option<Conversions>,
    deserializers: Vec<Conversion>,
    deserialization: Option<Conversions>,
    constraints: Option<Arc<Constraints>>,
    defined: bool,
}

impl TypeMeta {
    pub(crate) fn new(name: impl Into<Arc<str>>, info: TypeInfo) -> Self {
        Self {
            name: name.into(),
            info,
            serialization: None,
            deserializers: Vec::new(),
            deserialization: None,
            constraints: None,
            defined: true,
        }
    }

    pub(crate) fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(Arc::new(constraints));
        self
    }

    /// A declared object whose fields are given later.
    pub(crate) fn declared(name: impl Into<Arc<str>>, info: TypeInfo) -> Self {
        Self {
            defined: false,
            ..Self::new(name, info)
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    pub const fn info(&self) -> &TypeInfo {
        &self.info
    }

    /// The registered serialization conversion.
    #[inline]
    pub const fn serialization(&self) -> Option<&Conversions> {
        self.serialization.as_ref()
    }

    /// The registered deserialization alternatives, in registration order.
    #[inline]
    pub const fn deserialization(&self) -> Option<&Conversions> {
        self.deserialization.as_ref()
    }

    /// Bounds checked on the input before structural deserialization.
    #[inline]
    pub const fn constraints(&self) -> Option<&Arc<Constraints>> {
        self.constraints.as_ref()
    }

    #[inline]
    pub const fn is_defined(&self) -> bool {
        self.defined
    }

    pub(crate) fn define(&mut self, info: TypeInfo) {
        self.info = info;
        self.defined = true;
    }

    /// Replaces the serializer, returning `true` if one was registered.
    pub(crate) fn set_serializer(&mut self, conversion: Conversion) -> bool {
        self.serialization
            .replace(Conversions::from(conversion))
            .is_some()
    }

    pub(crate) fn add_deserializer(&mut self, conversion: Conversion) {
        self.deserializers.push(conversion);
        self.deserialization = Some(Conversions::new(self.deserializers.iter().cloned()));
    }
}
