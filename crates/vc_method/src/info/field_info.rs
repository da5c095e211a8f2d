use alloc::sync::Arc;
use core::fmt;

use vc_value::Data;

use crate::conversion::Conversions;
use crate::error::FieldError;
use crate::info::TypeHandle;
use crate::options::AliasStyle;

// -----------------------------------------------------------------------------
// FieldKind

/// Which directions a field takes part in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FieldKind {
    #[default]
    Normal,
    /// Serialized, but never read from input; it keeps its default.
    ReadOnly,
    /// Read from input, but never serialized.
    WriteOnly,
}

// -----------------------------------------------------------------------------
// FieldDefault

/// A field default: a constant, or a factory called for every use.
#[derive(Clone)]
pub enum FieldDefault {
    Value(Data),
    Factory(Arc<dyn Fn() -> Data + Send + Sync>),
}

impl FieldDefault {
    #[inline]
    pub fn value(&self) -> Data {
        match self {
            Self::Value(value) => value.clone(),
            Self::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

// -----------------------------------------------------------------------------
// SkipPolicy / Skippable

/// Value-dependent predicate deciding that a field is left out.
pub type SkipPredicate = Arc<dyn Fn(&Data) -> bool + Send + Sync>;

/// What a field itself declares about being left out of the output.
#[derive(Clone, Default)]
pub struct SkipPolicy {
    predicate: Option<SkipPredicate>,
    skip_none: bool,
    skip_default: bool,
}

impl fmt::Debug for SkipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipPolicy")
            .field("predicate", &self.predicate.is_some())
            .field("skip_none", &self.skip_none)
            .field("skip_default", &self.skip_default)
            .finish()
    }
}

/// The resolved skip test of one field under one set of options.
#[derive(Clone)]
pub struct Skippable {
    predicate: Option<SkipPredicate>,
    default: Option<Data>,
    none: bool,
}

impl Skippable {
    /// Returns `true` if a field holding `value` is left out.
    pub fn skips(&self, value: &Data) -> bool {
        (self.none && value.is_null())
            || self.default.as_ref().is_some_and(|default| default == value)
            || self.predicate.as_ref().is_some_and(|predicate| predicate(value))
    }
}

impl fmt::Debug for Skippable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Skippable")
            .field("predicate", &self.predicate.is_some())
            .field("default", &self.default)
            .field("none", &self.none)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// FieldInfo

/// One member of an object type.
///
/// A field is required unless it has a default. A field with a default
/// can still be made required with [`FieldInfo::required`]; a field cannot
/// be optional without a default, which [`FieldInfo::validate`] rejects.
///
/// # Examples
///
/// ```
/// use vc_method::info::FieldInfo;
/// use vc_method::registry::TypeRegistry;
/// use vc_value::Data;
///
/// let registry = TypeRegistry::new();
/// let baz = FieldInfo::new("baz", registry.int())
///     .with_default(Data::Null)
///     .with_alias("bazAlias")
///     .skip_none();
///
/// assert!(!baz.is_required());
/// assert_eq!(baz.alias(), Some("bazAlias"));
/// assert!(baz.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct FieldInfo {
    name: Arc<str>,
    ty: TypeHandle,
    required: Option<bool>,
    default: Option<FieldDefault>,
    alias: Option<Arc<str>>,
    flattened: bool,
    kind: FieldKind,
    order: Option<i64>,
    skip: SkipPolicy,
    serialization: Option<Conversions>,
    deserialization: Option<Conversions>,
    fall_back_on_default: bool,
}

impl FieldInfo {
    /// Creates a required field named `name` of type `ty`.
    pub fn new(name: impl Into<Arc<str>>, ty: TypeHandle) -> Self {
        Self {
            name: name.into(),
            ty,
            required: None,
            default: None,
            alias: None,
            flattened: false,
            kind: FieldKind::Normal,
            order: None,
            skip: SkipPolicy::default(),
            serialization: None,
            deserialization: None,
            fall_back_on_default: false,
        }
    }

    pub fn with_default(mut self, default: impl Into<Data>) -> Self {
        self.default = Some(FieldDefault::Value(default.into()));
        self
    }

    pub fn with_default_factory(mut self, factory: impl Fn() -> Data + Send + Sync + 'static) -> Self {
        self.default = Some(FieldDefault::Factory(Arc::new(factory)));
        self
    }

    /// Requires the field in input even though it has a default.
    pub fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }

    /// Declares the field optional; it must then have a default.
    pub fn optional(mut self) -> Self {
        self.required = Some(false);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<Arc<str>>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Merges the field's own output into its parent instead of nesting it.
    pub fn flattened(mut self) -> Self {
        self.flattened = true;
        self
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets an explicit ordering key.
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn skip_if(mut self, predicate: impl Fn(&Data) -> bool + Send + Sync + 'static) -> Self {
        self.skip.predicate = Some(Arc::new(predicate));
        self
    }

    /// Leaves the field out when null, treating null as its default.
    pub fn skip_none(mut self) -> Self {
        self.skip.skip_none = true;
        self
    }

    /// Leaves the field out when equal to its default.
    pub fn skip_default(mut self) -> Self {
        self.skip.skip_default = true;
        self
    }

    pub fn serialize_with(mut self, conversions: Conversions) -> Self {
        self.serialization = Some(conversions);
        self
    }

    pub fn deserialize_with(mut self, conversions: Conversions) -> Self {
        self.deserialization = Some(conversions);
        self
    }

    /// Uses the default when the input for this field is invalid.
    pub fn fall_back_on_default(mut self) -> Self {
        self.fall_back_on_default = true;
        self
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
    pub const fn ty(&self) -> TypeHandle {
        self.ty
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(self.default.is_none())
    }

    #[inline]
    pub const fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }

    #[inline]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The external name: the explicit alias, else the styled field name.
    pub fn alias_for(&self, style: AliasStyle) -> Arc<str> {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => style.apply(&self.name),
        }
    }

    #[inline]
    pub const fn is_flattened(&self) -> bool {
        self.flattened
    }

    #[inline]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    #[inline]
    pub const fn order(&self) -> Option<i64> {
        self.order
    }

    #[inline]
    pub const fn skip_policy(&self) -> &SkipPolicy {
        &self.skip
    }

    #[inline]
    pub const fn serialization(&self) -> Option<&Conversions> {
        self.serialization.as_ref()
    }

    #[inline]
    pub const fn deserialization(&self) -> Option<&Conversions> {
        self.deserialization.as_ref()
    }

    #[inline]
    pub const fn falls_back_on_default(&self) -> bool {
        self.fall_back_on_default
    }

    /// Checks the declaration is consistent.
    pub fn validate(&self) -> Result<(), FieldError> {
        if !self.is_required() && self.default.is_none() {
            return Err(FieldError::MissingDefault(self.name.clone()));
        }
        if self.kind == FieldKind::ReadOnly && self.default.is_none() {
            return Err(FieldError::ReadOnlyRequired(self.name.clone()));
        }
        if self.flattened && self.alias.is_some() {
            return Err(FieldError::FlattenedAlias(self.name.clone()));
        }
        Ok(())
    }

    /// Resolves the skip test of this field.
    ///
    /// Returns `None` when nothing but the unset placeholder can make the
    /// field disappear.
    pub fn skippable(&self, exclude_defaults: bool, exclude_none: bool) -> Option<Skippable> {
        let default = if exclude_defaults || self.skip.skip_default {
            self.default.as_ref().map(FieldDefault::value)
        } else {
            None
        };
        let none = exclude_none || self.skip.skip_none;

        if default.is_none() && !none && self.skip.predicate.is_none() {
            return None;
        }
        Some(Skippable {
            predicate: self.skip.predicate.clone(),
            default,
            none,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> TypeHandle {
        TypeHandle::new(2)
    }

    #[test]
    fn required_defaults() {
        assert!(FieldInfo::new("a", int()).is_required());
        assert!(!FieldInfo::new("a", int()).with_default(0).is_required());
        assert!(FieldInfo::new("a", int()).with_default(0).required().is_required());
    }

    #[test]
    fn validation() {
        let optional = FieldInfo::new("a", int()).optional();
        assert_eq!(optional.validate(), Err(FieldError::MissingDefault("a".into())));

        let read_only = FieldInfo::new("b", int()).with_kind(FieldKind::ReadOnly);
        assert_eq!(read_only.validate(), Err(FieldError::ReadOnlyRequired("b".into())));

        let flat = FieldInfo::new("c", int()).flattened().with_alias("x");
        assert_eq!(flat.validate(), Err(FieldError::FlattenedAlias("c".into())));

        assert!(FieldInfo::new("d", int()).with_default(1).required().validate().is_ok());
    }

    #[test]
    fn skippable_is_pure() {
        let field = FieldInfo::new("baz", int()).with_default(Data::Null);
        assert!(field.skippable(false, false).is_none());

        let skip = field.skippable(true, false).unwrap();
        assert!(skip.skips(&Data::Null));
        assert!(!skip.skips(&Data::from(1)));

        let skip = field.skippable(false, true).unwrap();
        assert!(skip.skips(&Data::Null));

        let field = FieldInfo::new("n", int())
            .with_default(0)
            .skip_if(|v| v.as_int().is_some_and(|n| n < 0));
        let skip = field.skippable(false, false).unwrap();
        assert!(skip.skips(&Data::from(-3)));
        assert!(!skip.skips(&Data::from(0)));
        assert!(field.skippable(true, false).unwrap().skips(&Data::from(0)));
    }

    #[test]
    fn alias_style() {
        let field = FieldInfo::new("foo_bar", int());
        assert_eq!(&*field.alias_for(AliasStyle::AsIs), "foo_bar");
        assert_eq!(&*field.alias_for(AliasStyle::CamelCase), "fooBar");
        assert_eq!(&*field.with_alias("x").alias_for(AliasStyle::CamelCase), "x");
    }
}
