//! Deterministic hash containers shared by the value model and the compiler.
//!
//! Every map in this workspace hashes through [`FixedHashState`], a `foldhash`
//! state with a fixed seed, so hashing only depends on the input.

use core::hash::{BuildHasher, Hash};

use foldhash::fast::{FixedState, FoldHasher};

const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x2F6B_97A4_51C3_E80D);

/// Fixed hash state based on `foldhash` with a constant seed.
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FoldHasher<'static>;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

/// A [`hashbrown::HashMap`] using [`FixedHashState`].
pub type HashMap<K, V> = hashbrown::HashMap<K, V, FixedHashState>;

/// A [`hashbrown::HashSet`] using [`FixedHashState`].
pub type HashSet<T> = hashbrown::HashSet<T, FixedHashState>;

/// Hash a single value with the fixed state.
#[inline]
pub fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    FixedHashState.hash_one(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_state_is_stable() {
        assert_eq!(hash_one("node"), hash_one("node"));
        assert_ne!(hash_one(&1_u64), hash_one(&2_u64));

        let mut map: HashMap<&str, i32> = HashMap::default();
        map.insert("a", 1);
        assert_eq!(map.get("a"), Some(&1));
    }
}
