use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};

use hashbrown::Equivalent;

use crate::Data;
use crate::data::{TAG_STR, unordered_hash};
use crate::hash::HashMap;

// -----------------------------------------------------------------------------
// StrKey

// Looks up a `Data::Str` key from a borrowed `&str`.
// Must hash exactly like `Data::Str`.
struct StrKey<'a>(&'a str);

impl Hash for StrKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(TAG_STR);
        self.0.hash(state);
    }
}

impl Equivalent<Data> for StrKey<'_> {
    #[inline]
    fn equivalent(&self, key: &Data) -> bool {
        matches!(key, Data::Str(s) if **s == *self.0)
    }
}

// -----------------------------------------------------------------------------
// MapData

/// An insertion ordered map from [`Data`] to [`Data`].
///
/// Entries live in a `Vec`; a side index gives constant time lookups.
/// Inserting an existing key overwrites the value in place, keeping the
/// original position.
///
/// # Examples
///
/// ```
/// use vc_value::{Data, MapData};
///
/// let mut map = MapData::new();
/// map.insert_str("b", Data::from(1));
/// map.insert_str("a", Data::from(2));
/// map.insert_str("b", Data::from(3));
///
/// let keys: Vec<_> = map.keys().filter_map(Data::as_str).collect();
/// assert_eq!(keys, ["b", "a"]);
/// assert_eq!(map.get_str("b"), Some(&Data::from(3)));
/// ```
#[derive(Clone, Default)]
pub struct MapData {
    entries: Vec<(Data, Data)>,
    index: HashMap<Data, usize>,
}

impl MapData {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an entry, returning the previous value of `key` if any.
    pub fn insert(&mut self, key: Data, value: Data) -> Option<Data> {
        match self.index.get(&key) {
            Some(&at) => Some(core::mem::replace(&mut self.entries[at].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Inserts an entry with a string key.
    #[inline]
    pub fn insert_str(&mut self, key: &str, value: Data) -> Option<Data> {
        self.insert(Data::str(key), value)
    }

    #[inline]
    pub fn get(&self, key: &Data) -> Option<&Data> {
        self.index.get(key).map(|&at| &self.entries[at].1)
    }

    /// Looks up a string key without allocating.
    #[inline]
    pub fn get_str(&self, key: &str) -> Option<&Data> {
        self.index.get(&StrKey(key)).map(|&at| &self.entries[at].1)
    }

    #[inline]
    pub fn contains_str(&self, key: &str) -> bool {
        self.index.contains_key(&StrKey(key))
    }

    /// Inserts every entry of `other`, overwriting existing keys.
    pub fn merge(&mut self, other: &MapData) {
        for (key, value) in other.iter() {
            self.insert(key.clone(), value.clone());
        }
    }

    /// Iterates entries in insertion order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&Data, &Data)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    #[inline]
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &Data> {
        self.entries.iter().map(|(key, _)| key)
    }

    #[inline]
    pub fn values(&self) -> impl ExactSizeIterator<Item = &Data> {
        self.entries.iter().map(|(_, value)| value)
    }
}

impl FromIterator<(Data, Data)> for MapData {
    fn from_iter<T: IntoIterator<Item = (Data, Data)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0);
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl PartialEq for MapData {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl Eq for MapData {}

impl Hash for MapData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        state.write_u64(unordered_hash(self.iter()));
    }
}

impl fmt::Debug for MapData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_keeps_position() {
        let mut map = MapData::new();
        assert_eq!(map.insert_str("x", Data::from(1)), None);
        map.insert_str("y", Data::from(2));
        assert_eq!(map.insert_str("x", Data::from(3)), Some(Data::from(1)));

        let entries: Vec<_> = map.iter().collect();
        assert_eq!(entries[0], (&Data::from("x"), &Data::from(3)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn str_lookup_matches_data_key() {
        let mut map = MapData::new();
        map.insert(Data::from("key"), Data::Null);
        map.insert(Data::from(1), Data::Bool(true));
        assert!(map.contains_str("key"));
        assert!(!map.contains_str("1"));
        assert_eq!(map.get(&Data::from(1)), Some(&Data::Bool(true)));
    }

    #[test]
    fn equality_ignores_order() {
        let a: MapData = [(Data::from("a"), Data::from(1)), (Data::from("b"), Data::from(2))]
            .into_iter()
            .collect();
        let b: MapData = [(Data::from("b"), Data::from(2)), (Data::from("a"), Data::from(1))]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        assert_eq!(crate::hash::hash_one(&a), crate::hash::hash_one(&b));
    }
}
