use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use vc_value::{Data, ObjectData};

use crate::conversion::Conversions;
use crate::error::{ConvertError, FieldError};
use crate::hash::HashSet;
use crate::info::{Constraints, FieldInfo, TypeHandle, Validator};

// -----------------------------------------------------------------------------
// SerializedField

/// Computes a virtual field from the object being serialized.
pub type SerializedFn = Arc<dyn Fn(&ObjectData) -> Result<Data, ConvertError> + Send + Sync>;

/// A serialization-only field that is not backed by a stored attribute.
///
/// The function result goes through the procedure compiled for `ty`;
/// returning [`Data::Undefined`] leaves the field out.
#[derive(Clone)]
pub struct SerializedField {
    alias: Arc<str>,
    ty: TypeHandle,
    func: SerializedFn,
    order: Option<i64>,
    skip_none: bool,
    conversion: Option<Conversions>,
}

impl SerializedField {
    pub fn new(
        alias: impl Into<Arc<str>>,
        ty: TypeHandle,
        func: impl Fn(&ObjectData) -> Result<Data, ConvertError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            alias: alias.into(),
            ty,
            func: Arc::new(func),
            order: None,
            skip_none: false,
            conversion: None,
        }
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn skip_none(mut self) -> Self {
        self.skip_none = true;
        self
    }

    pub fn serialize_with(mut self, conversions: Conversions) -> Self {
        self.conversion = Some(conversions);
        self
    }

    #[inline]
    pub fn alias(&self) -> &Arc<str> {
        &self.alias
    }

    #[inline]
    pub const fn ty(&self) -> TypeHandle {
        self.ty
    }

    #[inline]
    pub fn func(&self) -> &SerializedFn {
        &self.func
    }

    #[inline]
    pub const fn order(&self) -> Option<i64> {
        self.order
    }

    #[inline]
    pub const fn is_skip_none(&self) -> bool {
        self.skip_none
    }

    #[inline]
    pub const fn conversion(&self) -> Option<&Conversions> {
        self.conversion.as_ref()
    }
}

impl fmt::Debug for SerializedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializedField")
            .field("alias", &self.alias)
            .field("ty", &self.ty)
            .field("order", &self.order)
            .field("skip_none", &self.skip_none)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ObjectInfo

/// The ordered fields of an object type.
///
/// Construction validates every field and rejects duplicated explicit
/// aliases. Constraints on the input map and validators of the built
/// object are added afterwards.
#[derive(Clone, Debug, Default)]
pub struct ObjectInfo {
    fields: Arc<[FieldInfo]>,
    serialized: Arc<[SerializedField]>,
    constraints: Option<Arc<Constraints>>,
    validators: Arc<[Validator]>,
}

impl ObjectInfo {
    pub fn new(fields: impl IntoIterator<Item = FieldInfo>) -> Result<Self, FieldError> {
        Self::with_serialized(fields, [])
    }

    pub fn with_serialized(
        fields: impl IntoIterator<Item = FieldInfo>,
        serialized: impl IntoIterator<Item = SerializedField>,
    ) -> Result<Self, FieldError> {
        let fields: Vec<FieldInfo> = fields.into_iter().collect();
        let serialized: Vec<SerializedField> = serialized.into_iter().collect();

        {
            let mut aliases: HashSet<&str> = HashSet::default();
            for field in &fields {
                field.validate()?;
                if field.is_flattened() {
                    continue;
                }
                let alias = field.alias().unwrap_or(field.name());
                if !aliases.insert(alias) {
                    return Err(FieldError::DuplicateAlias(alias.into()));
                }
            }
            for field in &serialized {
                if !aliases.insert(field.alias()) {
                    return Err(FieldError::DuplicateAlias(field.alias().clone()));
                }
            }
        }

        Ok(Self {
            fields: fields.into(),
            serialized: serialized.into(),
            constraints: None,
            validators: Arc::default(),
        })
    }

    /// Checks the input map, typically its property count.
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(Arc::new(constraints));
        self
    }

    /// Appends a validator; the fields it names must exist.
    pub fn with_validator(mut self, validator: Validator) -> Result<Self, FieldError> {
        let named = validator.field().map(Arc::<str>::from);
        let dependencies = validator.dependencies().unwrap_or_default();
        for name in named.into_iter().chain(dependencies.iter().cloned()) {
            if self.field(&name).is_none() {
                return Err(FieldError::UnknownField(name));
            }
        }
        let mut validators = self.validators.to_vec();
        validators.push(validator);
        self.validators = validators.into();
        Ok(self)
    }

    #[inline]
    pub fn constraints(&self) -> Option<&Arc<Constraints>> {
        self.constraints.as_ref()
    }

    #[inline]
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    #[inline]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    #[inline]
    pub fn serialized(&self) -> &[SerializedField] {
        &self.serialized
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::FieldKind;

    #[test]
    fn duplicated_alias_is_rejected() {
        let int = TypeHandle::new(2);
        let result = ObjectInfo::new([
            FieldInfo::new("a", int),
            FieldInfo::new("b", int).with_alias("a"),
        ]);
        assert_eq!(result.unwrap_err(), FieldError::DuplicateAlias("a".into()));

        let result = ObjectInfo::with_serialized(
            [FieldInfo::new("a", int)],
            [SerializedField::new("a", int, |_| Ok(Data::Null))],
        );
        assert!(result.is_err());
    }

    #[test]
    fn invalid_field_is_rejected() {
        let int = TypeHandle::new(2);
        let result = ObjectInfo::new([FieldInfo::new("a", int).with_kind(FieldKind::ReadOnly)]);
        assert!(matches!(result, Err(FieldError::ReadOnlyRequired(_))));

        let info = ObjectInfo::new([FieldInfo::new("a", int)]).unwrap();
        assert!(info.field("a").is_some());
        assert!(info.field("b").is_none());

        let result = info.clone().with_validator(Validator::new(|_| Ok(())).for_field("b"));
        assert_eq!(result.unwrap_err(), FieldError::UnknownField("b".into()));
        let info = info
            .with_validator(Validator::new(|_| Ok(())).depends_on(["a"]))
            .unwrap();
        assert_eq!(info.validators().len(), 1);
    }
}
