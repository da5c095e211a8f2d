use alloc::sync::Arc;
use core::fmt;

use vc_value::Data;

use crate::conversion::Conversions;
use crate::error::ConvertError;
use crate::info::TypeHandle;

// -----------------------------------------------------------------------------
// Converter

/// The function of a converter.
pub type ConverterFn = Arc<dyn Fn(Data) -> Result<Data, ConvertError> + Send + Sync>;

/// Converts a value of a conversion's source into its target.
#[derive(Clone)]
pub enum Converter {
    Identity,
    Function(ConverterFn),
}

impl Converter {
    pub fn new(f: impl Fn(Data) -> Result<Data, ConvertError> + Send + Sync + 'static) -> Self {
        Self::Function(Arc::new(f))
    }

    #[inline]
    pub fn convert(&self, value: Data) -> Result<Data, ConvertError> {
        match self {
            Self::Identity => Ok(value),
            Self::Function(f) => f(value),
        }
    }

    #[inline]
    pub const fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

// -----------------------------------------------------------------------------
// ConversionOverrides

/// Options forced within the subtree of a conversion.
///
/// `None` keeps the caller's value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ConversionOverrides {
    pub exclude_unset: Option<bool>,
    pub fall_back_on_any: Option<bool>,
    pub additional_properties: Option<bool>,
    pub coerce: Option<bool>,
    pub fall_back_on_default: Option<bool>,
}

// -----------------------------------------------------------------------------
// Conversion

/// A transformation from `source` to `target` applied around the
/// structural walk.
///
/// Serialization converts a `source` value and continues with the
/// procedure of `target`; deserialization runs the procedure of `source`
/// and converts its result into `target`.
///
/// # Examples
///
/// ```
/// use vc_method::conversion::Conversion;
/// use vc_method::registry::TypeRegistry;
/// use vc_value::Data;
///
/// let registry = TypeRegistry::new();
/// let to_str = Conversion::new(registry.int(), registry.str(), |value: Data| {
///     Ok(Data::from(format!("{}", value.as_int().unwrap_or_default())))
/// })
/// .fall_back_on_any(true);
///
/// assert_eq!(to_str.target(), registry.str());
/// assert_eq!(to_str.overrides().fall_back_on_any, Some(true));
/// ```
#[derive(Clone, Debug)]
pub struct Conversion {
    source: TypeHandle,
    target: TypeHandle,
    converter: Converter,
    sub_conversion: Option<Conversions>,
    overrides: ConversionOverrides,
}

impl Conversion {
    pub fn new(
        source: TypeHandle,
        target: TypeHandle,
        f: impl Fn(Data) -> Result<Data, ConvertError> + Send + Sync + 'static,
    ) -> Self {
        Self::with_converter(source, target, Converter::new(f))
    }

    pub fn with_converter(source: TypeHandle, target: TypeHandle, converter: Converter) -> Self {
        Self {
            source,
            target,
            converter,
            sub_conversion: None,
            overrides: ConversionOverrides::default(),
        }
    }

    /// A conversion meaning "no conversion" for `ty`.
    ///
    /// Registered or passed for a type, it stops any further lookup and the
    /// type is walked structurally.
    pub fn identity(ty: TypeHandle) -> Self {
        Self::with_converter(ty, ty, Converter::Identity)
    }

    /// Conversions applied while walking the target (or the source, when
    /// deserializing).
    pub fn with_sub_conversion(mut self, sub_conversion: Conversions) -> Self {
        self.sub_conversion = Some(sub_conversion);
        self
    }

    pub fn with_overrides(mut self, overrides: ConversionOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn exclude_unset(mut self, value: bool) -> Self {
        self.overrides.exclude_unset = Some(value);
        self
    }

    pub fn fall_back_on_any(mut self, value: bool) -> Self {
        self.overrides.fall_back_on_any = Some(value);
        self
    }

    pub fn additional_properties(mut self, value: bool) -> Self {
        self.overrides.additional_properties = Some(value);
        self
    }

    pub fn coerce(mut self, value: bool) -> Self {
        self.overrides.coerce = Some(value);
        self
    }

    pub fn fall_back_on_default(mut self, value: bool) -> Self {
        self.overrides.fall_back_on_default = Some(value);
        self
    }

    #[inline]
    pub const fn source(&self) -> TypeHandle {
        self.source
    }

    #[inline]
    pub const fn target(&self) -> TypeHandle {
        self.target
    }

    #[inline]
    pub const fn converter(&self) -> &Converter {
        &self.converter
    }

    #[inline]
    pub const fn sub_conversion(&self) -> Option<&Conversions> {
        self.sub_conversion.as_ref()
    }

    #[inline]
    pub const fn overrides(&self) -> &ConversionOverrides {
        &self.overrides
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.converter.is_identity() && self.source == self.target
    }
}
