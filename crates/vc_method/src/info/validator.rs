use alloc::sync::Arc;
use core::fmt;

use vc_value::ObjectData;

use crate::validation::ValidationError;

/// Checks a freshly deserialized object.
pub type ValidatorFn = Arc<dyn Fn(&ObjectData) -> Result<(), ValidationError> + Send + Sync>;

/// A check run on an object once its fields are deserialized.
///
/// Validators see the object with its defaults applied. When some fields
/// failed, only the validators whose declared dependencies all succeeded
/// run; a validator without declared dependencies is then skipped. A
/// validator whose dependencies were all left to their default is skipped
/// as well.
///
/// # Examples
///
/// ```
/// use vc_method::ValidationError;
/// use vc_method::info::Validator;
/// use vc_value::Data;
///
/// let ordered = Validator::new(|range| {
///     let start = range.get("start").and_then(Data::as_int);
///     let end = range.get("end").and_then(Data::as_int);
///     if start > end {
///         return Err(ValidationError::new("start is after end"));
///     }
///     Ok(())
/// })
/// .depends_on(["start", "end"]);
///
/// assert_eq!(ordered.dependencies().unwrap().len(), 2);
/// ```
#[derive(Clone)]
pub struct Validator {
    func: ValidatorFn,
    field: Option<Arc<str>>,
    dependencies: Option<Arc<[Arc<str>]>>,
}

impl Validator {
    pub fn new(func: impl Fn(&ObjectData) -> Result<(), ValidationError> + Send + Sync + 'static) -> Self {
        Self {
            func: Arc::new(func),
            field: None,
            dependencies: None,
        }
    }

    /// Reports failures under the alias of the field named `name`.
    ///
    /// Without explicit dependencies, the validator depends on that field.
    pub fn for_field(mut self, name: impl Into<Arc<str>>) -> Self {
        self.field = Some(name.into());
        self
    }

    /// Declares the fields, by name, the validator reads.
    pub fn depends_on<N: Into<Arc<str>>>(mut self, names: impl IntoIterator<Item = N>) -> Self {
        self.dependencies = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[inline]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// The declared dependencies, falling back on the target field.
    pub fn dependencies(&self) -> Option<Arc<[Arc<str>]>> {
        match (&self.dependencies, &self.field) {
            (Some(dependencies), _) => Some(dependencies.clone()),
            (None, Some(field)) => Some([field.clone()].into()),
            (None, None) => None,
        }
    }

    #[inline]
    pub fn validate(&self, object: &ObjectData) -> Result<(), ValidationError> {
        (self.func)(object)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("field", &self.field)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}
