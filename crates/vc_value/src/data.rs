use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::hash::{HashSet, hash_one};
use crate::{ClassId, EnumData, MapData, ObjectData, OpaqueData};

// Discriminant bytes written before the payload when hashing.
// `MapData` relies on `TAG_STR` to look up string keys without allocating.
pub(crate) const TAG_STR: u8 = 5;

// -----------------------------------------------------------------------------
// DataClass

/// The run-time class of a [`Data`] value.
///
/// Compiled procedures compare a value's class against the classes they
/// expect, and the any-dispatch procedure uses it to find the type to
/// compile for a value whose static type is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataClass {
    Undefined,
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Tuple,
    Set,
    Map,
    Enum(ClassId),
    Object(ClassId),
    Opaque(TypeId),
}

impl DataClass {
    /// Returns `true` for the classes a tree value may have.
    #[inline]
    pub const fn is_tree(self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool | Self::Int | Self::Float | Self::Str | Self::List | Self::Map
        )
    }
}

impl fmt::Display for DataClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.pad("undefined"),
            Self::Null => f.pad("null"),
            Self::Bool => f.pad("bool"),
            Self::Int => f.pad("int"),
            Self::Float => f.pad("float"),
            Self::Str => f.pad("str"),
            Self::List => f.pad("list"),
            Self::Tuple => f.pad("tuple"),
            Self::Set => f.pad("set"),
            Self::Map => f.pad("map"),
            Self::Enum(id) => write!(f, "enum {id}"),
            Self::Object(id) => write!(f, "object {id}"),
            Self::Opaque(_) => f.pad("opaque"),
        }
    }
}

// -----------------------------------------------------------------------------
// Data

/// A dynamically typed value.
///
/// One enum covers both sides of a conversion: in-memory values (objects,
/// enum members, tuples, sets, opaque host values) and trees (null, bool,
/// numbers, strings, lists and string-keyed maps).
///
/// Container variants are reference counted, so cloning is cheap and a
/// pass-through procedure can hand back the very same allocation; see
/// [`Data::same`].
///
/// # Equality
///
/// Equality is structural. Floats compare by bit pattern so that `Data`
/// can be `Eq` and `Hash`; maps, sets and objects compare regardless of
/// order; opaque values compare by address.
#[derive(Clone, Debug)]
pub enum Data {
    /// The unset placeholder. Never part of a tree.
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<[Data]>),
    Tuple(Arc<[Data]>),
    Set(Arc<[Data]>),
    Map(Arc<MapData>),
    Enum(Arc<EnumData>),
    Object(Arc<ObjectData>),
    Opaque(OpaqueData),
}

impl Data {
    /// Creates a string value.
    #[inline]
    pub fn str(value: impl Into<Arc<str>>) -> Self {
        Self::Str(value.into())
    }

    /// Creates a list from an iterator.
    pub fn list(items: impl IntoIterator<Item = Data>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Creates a tuple from an iterator.
    pub fn tuple(items: impl IntoIterator<Item = Data>) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    /// Creates a set, dropping duplicated items but keeping first-seen order.
    pub fn set(items: impl IntoIterator<Item = Data>) -> Self {
        let mut seen: HashSet<Data> = HashSet::default();
        let mut unique = Vec::new();
        for item in items {
            if seen.insert(item.clone()) {
                unique.push(item);
            }
        }
        Self::Set(unique.into())
    }

    /// Creates a map value.
    #[inline]
    pub fn map(map: MapData) -> Self {
        Self::Map(Arc::new(map))
    }

    /// Creates an object value.
    #[inline]
    pub fn object(object: ObjectData) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Creates an enum member value.
    #[inline]
    pub fn member(member: EnumData) -> Self {
        Self::Enum(Arc::new(member))
    }

    /// Wraps a host value that the data model knows nothing about.
    #[inline]
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(OpaqueData::new(value))
    }

    /// Returns the run-time class of this value.
    pub fn class(&self) -> DataClass {
        match self {
            Self::Undefined => DataClass::Undefined,
            Self::Null => DataClass::Null,
            Self::Bool(_) => DataClass::Bool,
            Self::Int(_) => DataClass::Int,
            Self::Float(_) => DataClass::Float,
            Self::Str(_) => DataClass::Str,
            Self::List(_) => DataClass::List,
            Self::Tuple(_) => DataClass::Tuple,
            Self::Set(_) => DataClass::Set,
            Self::Map(_) => DataClass::Map,
            Self::Enum(member) => DataClass::Enum(member.class()),
            Self::Object(object) => DataClass::Object(object.class()),
            Self::Opaque(opaque) => DataClass::Opaque(opaque.type_id()),
        }
    }

    #[inline]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for null, booleans, numbers and strings.
    #[inline]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_)
        )
    }

    /// Returns `true` if this value, recursively, only contains tree classes
    /// and every map key is a string.
    pub fn is_tree(&self) -> bool {
        match self {
            Self::List(items) => items.iter().all(Self::is_tree),
            Self::Map(map) => map
                .iter()
                .all(|(key, value)| matches!(key, Self::Str(_)) && value.is_tree()),
            other => other.is_scalar(),
        }
    }

    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the numeric value of an int or a float.
    #[inline]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the items of a list, a tuple or a set.
    #[inline]
    pub fn as_seq(&self) -> Option<&Arc<[Data]>> {
        match self {
            Self::List(items) | Self::Tuple(items) | Self::Set(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&MapData> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&ObjectData> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    #[inline]
    pub fn as_member(&self) -> Option<&EnumData> {
        match self {
            Self::Enum(member) => Some(member),
            _ => None,
        }
    }

    #[inline]
    pub fn as_opaque(&self) -> Option<&OpaqueData> {
        match self {
            Self::Opaque(opaque) => Some(opaque),
            _ => None,
        }
    }

    /// Returns `true` if both values share the same allocation.
    ///
    /// Scalars are never "the same", even when equal.
    pub fn same(&self, other: &Data) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b))
            | (Self::Tuple(a), Self::Tuple(b))
            | (Self::Set(a), Self::Set(b)) => Arc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
            (Self::Enum(a), Self::Enum(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            _ => false,
        }
    }

    const fn tag(&self) -> u8 {
        match self {
            Self::Undefined => 0,
            Self::Null => 1,
            Self::Bool(_) => 2,
            Self::Int(_) => 3,
            Self::Float(_) => 4,
            Self::Str(_) => TAG_STR,
            Self::List(_) => 6,
            Self::Tuple(_) => 7,
            Self::Set(_) => 8,
            Self::Map(_) => 9,
            Self::Enum(_) => 10,
            Self::Object(_) => 11,
            Self::Opaque(_) => 12,
        }
    }
}

/// Order independent hash of a sequence of items.
pub(crate) fn unordered_hash<T: Hash>(items: impl Iterator<Item = T>) -> u64 {
    items.map(|item| hash_one(&item)).fold(0, u64::wrapping_add)
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Data {}

impl Hash for Data {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.tag());
        match self {
            Self::Undefined | Self::Null => {}
            Self::Bool(value) => value.hash(state),
            Self::Int(value) => value.hash(state),
            Self::Float(value) => value.to_bits().hash(state),
            Self::Str(value) => value.hash(state),
            Self::List(items) | Self::Tuple(items) => items.hash(state),
            Self::Set(items) => {
                state.write_usize(items.len());
                state.write_u64(unordered_hash(items.iter()));
            }
            Self::Map(map) => map.hash(state),
            Self::Enum(member) => member.hash(state),
            Self::Object(object) => object.hash(state),
            Self::Opaque(opaque) => opaque.hash(state),
        }
    }
}

// -----------------------------------------------------------------------------
// Conversions

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Data {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Data {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Data {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Data {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Data {
    #[inline]
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

impl From<Arc<str>> for Data {
    #[inline]
    fn from(value: Arc<str>) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<Data>> for Data {
    #[inline]
    fn from(value: Vec<Data>) -> Self {
        Self::List(value.into())
    }
}

impl From<MapData> for Data {
    #[inline]
    fn from(value: MapData) -> Self {
        Self::map(value)
    }
}

impl From<ObjectData> for Data {
    #[inline]
    fn from(value: ObjectData) -> Self {
        Self::object(value)
    }
}

impl From<EnumData> for Data {
    #[inline]
    fn from(value: EnumData) -> Self {
        Self::member(value)
    }
}

impl<T: Into<Data>> From<Option<T>> for Data {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
