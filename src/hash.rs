//! The 32-bit hash oracle feeding trie addressing.
//!
//! The trie consumes a 32-bit hash in 5-bit slices. Hashing is pluggable
//! through a [`BuildHasher`] type parameter on the map types; the build
//! hasher must be a pure function, identical across instances, so that two
//! maps of the same type always agree on key placement (three-way merge
//! reconciles maps structurally and relies on this). The default satisfies
//! the rule; seeded hashers such as `RandomState` do not.

use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};

/// Default build-hasher: deterministic and identical across instances.
pub type DefaultHashBuilder = BuildHasherDefault<DefaultHasher>;

/// Computes the 32-bit trie hash of `key` under `hasher`.
///
/// The 64-bit hasher output is truncated to its low 32 bits.
#[must_use]
pub fn hash_key<K: Hash + ?Sized, S: BuildHasher>(hasher: &S, key: &K) -> u32 {
    hasher.hash_one(key) as u32
}
