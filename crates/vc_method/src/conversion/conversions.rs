use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};

use once_cell::sync::Lazy;

use crate::conversion::Conversion;

type LazyInit = Box<dyn FnOnce() -> Vec<Conversion> + Send>;

enum Repr {
    List(Vec<Conversion>),
    Lazy(Lazy<Vec<Conversion>, LazyInit>),
    Chain(Conversions, Conversions),
}

// -----------------------------------------------------------------------------
// Conversions

/// An ordered, shared list of conversions.
///
/// Equality and hashing are by identity: two `Conversions` are equal when
/// they are the same allocation, or chains of equal parts. This keeps
/// cache and recursion keys cheap and allows lists that are built lazily
/// and refer to themselves.
///
/// # Examples
///
/// ```
/// use vc_method::conversion::{Conversion, Conversions};
/// use vc_method::registry::TypeRegistry;
///
/// let registry = TypeRegistry::new();
/// let a = Conversions::from(Conversion::identity(registry.int()));
/// let b = Conversions::from(Conversion::identity(registry.int()));
///
/// assert_eq!(a, a.clone());
/// assert_ne!(a, b);
/// assert_eq!(a.iter().count(), 1);
/// ```
#[derive(Clone)]
pub struct Conversions(Arc<Repr>);

impl Conversions {
    pub fn new(conversions: impl IntoIterator<Item = Conversion>) -> Self {
        Self(Arc::new(Repr::List(conversions.into_iter().collect())))
    }

    /// Builds the list on first use.
    ///
    /// A conversion whose sub-conversion refers back to the list being
    /// built needs this.
    pub fn lazy(init: impl FnOnce() -> Vec<Conversion> + Send + 'static) -> Self {
        let init: LazyInit = Box::new(init);
        Self(Arc::new(Repr::Lazy(Lazy::new(init))))
    }

    /// `first` followed by `second`.
    pub fn chain(first: Conversions, second: Conversions) -> Self {
        Self(Arc::new(Repr::Chain(first, second)))
    }

    /// Chains optional lists, allocating only when both are present.
    pub fn chain_opt(first: Option<&Conversions>, second: Option<&Conversions>) -> Option<Self> {
        match (first, second) {
            (Some(first), Some(second)) => Some(Self::chain(first.clone(), second.clone())),
            (Some(one), None) | (None, Some(one)) => Some(one.clone()),
            (None, None) => None,
        }
    }

    /// Iterates the conversions in order, forcing lazy parts.
    pub fn iter(&self) -> impl Iterator<Item = &Conversion> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out.into_iter()
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a Conversion>) {
        match &*self.0 {
            Repr::List(list) => out.extend(list.iter()),
            Repr::Lazy(lazy) => out.extend(Lazy::force(lazy).iter()),
            Repr::Chain(first, second) => {
                first.collect_into(out);
                second.collect_into(out);
            }
        }
    }

    #[inline]
    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).addr()
    }
}

impl From<Conversion> for Conversions {
    #[inline]
    fn from(value: Conversion) -> Self {
        Self::new([value])
    }
}

impl FromIterator<Conversion> for Conversions {
    #[inline]
    fn from_iter<T: IntoIterator<Item = Conversion>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl PartialEq for Conversions {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (&*self.0, &*other.0) {
            (Repr::Chain(a, b), Repr::Chain(c, d)) => a == c && b == d,
            _ => false,
        }
    }
}

impl Eq for Conversions {}

impl Hash for Conversions {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &*self.0 {
            Repr::Chain(first, second) => {
                state.write_u8(1);
                first.hash(state);
                second.hash(state);
            }
            _ => {
                state.write_u8(0);
                state.write_usize(self.addr());
            }
        }
    }
}

impl fmt::Debug for Conversions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Repr::List(list) => f.debug_list().entries(list.iter()).finish(),
            Repr::Lazy(lazy) => match Lazy::get(lazy) {
                Some(list) => f.debug_list().entries(list.iter()).finish(),
                None => f.write_str("Lazy(..)"),
            },
            Repr::Chain(first, second) => f.debug_tuple("Chain").field(first).field(second).finish(),
        }
    }
}
