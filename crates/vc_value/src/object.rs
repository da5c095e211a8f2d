use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::Data;
use crate::data::unordered_hash;
use crate::hash::{HashMap, HashSet};

// -----------------------------------------------------------------------------
// ClassId

/// Identity of a user declared class (an object or an enumeration).
///
/// Ids are handed out by whoever owns the type descriptions; the value
/// model only compares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// -----------------------------------------------------------------------------
// ObjectData

/// An instance of an object class: named attributes plus the set of
/// attributes that were explicitly provided.
///
/// An attribute stored with [`ObjectData::with_unset`] holds a value but is
/// not part of the fields-set, which is what exclude-unset serialization
/// looks at.
///
/// # Examples
///
/// ```
/// use vc_value::{ClassId, Data, ObjectData};
///
/// let foo = ObjectData::new(ClassId::new(1))
///     .with("bar", 0)
///     .with_unset("baz", Data::Null);
///
/// assert!(foo.is_set("bar"));
/// assert!(!foo.is_set("baz"));
/// assert_eq!(foo.get("baz"), Some(&Data::Null));
/// ```
#[derive(Clone, Debug)]
pub struct ObjectData {
    class: ClassId,
    attrs: HashMap<Arc<str>, Data>,
    fields_set: HashSet<Arc<str>>,
}

impl ObjectData {
    #[inline]
    pub fn new(class: ClassId) -> Self {
        Self {
            class,
            attrs: HashMap::default(),
            fields_set: HashSet::default(),
        }
    }

    /// Sets an attribute and marks it as provided.
    pub fn with(mut self, name: impl Into<Arc<str>>, value: impl Into<Data>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets an attribute without marking it as provided.
    pub fn with_unset(mut self, name: impl Into<Arc<str>>, value: impl Into<Data>) -> Self {
        self.set_unset(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<Arc<str>>, value: impl Into<Data>) {
        let name = name.into();
        self.fields_set.insert(name.clone());
        self.attrs.insert(name, value.into());
    }

    pub fn set_unset(&mut self, name: impl Into<Arc<str>>, value: impl Into<Data>) {
        let name = name.into();
        self.fields_set.remove(&*name);
        self.attrs.insert(name, value.into());
    }

    #[inline]
    pub const fn class(&self) -> ClassId {
        self.class
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Data> {
        self.attrs.get(name)
    }

    /// Returns `true` if the attribute was explicitly provided.
    #[inline]
    pub fn is_set(&self, name: &str) -> bool {
        self.fields_set.contains(name)
    }

    /// Iterates the attributes sorted by name.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Data)> {
        let mut attrs: Vec<_> = self.attrs.iter().map(|(k, v)| (&**k, v)).collect();
        attrs.sort_unstable_by(|a, b| a.0.cmp(b.0));
        attrs.into_iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }
}

impl PartialEq for ObjectData {
    /// The fields-set does not take part in equality.
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.attrs == other.attrs
    }
}

impl Eq for ObjectData {}

impl Hash for ObjectData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class.hash(state);
        state.write_usize(self.attrs.len());
        state.write_u64(unordered_hash(self.attrs.iter()));
    }
}

// -----------------------------------------------------------------------------
// EnumData

/// A member of an enumeration class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumData {
    class: ClassId,
    name: Arc<str>,
    value: Data,
}

impl EnumData {
    #[inline]
    pub fn new(class: ClassId, name: impl Into<Arc<str>>, value: impl Into<Data>) -> Self {
        Self {
            class,
            name: name.into(),
            value: value.into(),
        }
    }

    #[inline]
    pub const fn class(&self) -> ClassId {
        self.class
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the member's enclosed value.
    #[inline]
    pub const fn value(&self) -> &Data {
        &self.value
    }
}

// -----------------------------------------------------------------------------
// OpaqueData

/// A host value carried through the data model untouched.
///
/// Only conversions registered for its Rust type can look inside.
#[derive(Clone)]
pub struct OpaqueData {
    value: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl OpaqueData {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
        }
    }

    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    #[inline]
    fn addr(&self) -> usize {
        Arc::as_ptr(&self.value).cast::<()>().addr()
    }
}

impl PartialEq for OpaqueData {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for OpaqueData {}

impl Hash for OpaqueData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.addr());
    }
}

impl fmt::Debug for OpaqueData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_set_tracking() {
        let mut obj = ObjectData::new(ClassId::new(0)).with("a", 1);
        obj.set_unset("a", 2);
        assert!(!obj.is_set("a"));
        assert_eq!(obj.get("a"), Some(&Data::from(2)));
        obj.set("b", Data::Null);
        assert!(obj.is_set("b"));
    }

    #[test]
    fn equality_ignores_fields_set() {
        let a = ObjectData::new(ClassId::new(0)).with("a", 1);
        let b = ObjectData::new(ClassId::new(0)).with_unset("a", 1);
        let c = ObjectData::new(ClassId::new(1)).with("a", 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn opaque_downcast() {
        let opaque = OpaqueData::new(42_u128);
        assert_eq!(opaque.downcast_ref::<u128>(), Some(&42));
        assert!(opaque.downcast_ref::<u64>().is_none());
        assert_eq!(opaque.type_id(), TypeId::of::<u128>());
        assert_eq!(opaque.clone(), opaque);
        assert_ne!(OpaqueData::new(42_u128), opaque);
    }
}
