//! Small linear map with a two-slice membership bitmap.
//!
//! Pairs live in one short vector; a 64-bit bitmap claims one of two
//! hash-derived candidate bits per key and gives the pair's position by
//! popcount. Growing past the linear threshold, or finding both candidate
//! bits taken by foreign keys, promotes the whole map into a
//! [`HamtMap`]. Lookup never converts.

use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::hash::{hash_key, DefaultHashBuilder};
use crate::DuplicateKey;
use crate::HamtMap;

/// Maximum number of key/value cells held linearly; an insertion past
/// this promotes to the trie.
const LINEAR_THRESHOLD: usize = 16;

/// Persistent map for very small entry counts.
///
/// A companion to [`HamtMap`]: cheaper below the linear threshold, and
/// promoted into the trie through its transient facade once it outgrows
/// the threshold. The same hasher-purity rule applies to `S`.
#[derive(Clone)]
pub struct BitmapMap<K, V, S = DefaultHashBuilder> {
    bitmap: u64,
    entries: Vec<(K, V)>,
    hasher: S,
}

/// Result of inserting into a [`BitmapMap`].
pub enum Promoted<K, V, S = DefaultHashBuilder> {
    /// The map stayed linear.
    Linear(BitmapMap<K, V, S>),
    /// The insertion crossed the linear threshold or hit a double-bit
    /// conflict, moving every entry into a trie.
    Trie(HamtMap<K, V, S>),
}

const fn primary_bit(hash: u32) -> u64 {
    1 << (hash & 0x3F)
}

const fn secondary_bit(hash: u32) -> u64 {
    1 << ((hash >> 6) & 0x3F)
}

const fn index(bitmap: u64, bit: u64) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

enum Placement {
    /// The key is present: its claimed bit and pair index.
    At(u64, usize),
    /// The key is absent; this candidate bit is free for it.
    Free(u64),
    /// Both candidate bits are claimed by foreign keys.
    Conflict,
}

// ---------------------------------------------------------------------------
// Construction & accessors
// ---------------------------------------------------------------------------

impl<K, V> BitmapMap<K, V> {
    /// Creates an empty map with the default hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V, S> BitmapMap<K, V, S> {
    /// Creates an empty map that hashes with `hasher`.
    #[must_use]
    pub const fn with_hasher(hasher: S) -> Self {
        Self {
            bitmap: 0,
            entries: Vec::new(),
            hasher,
        }
    }

    /// Returns the number of key-value pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over `(&K, &V)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

// ---------------------------------------------------------------------------
// Read operations
// ---------------------------------------------------------------------------

impl<K: Hash + Eq, V, S: BuildHasher> BitmapMap<K, V, S> {
    fn placement(&self, key: &K) -> Placement {
        let hash = hash_key(&self.hasher, key);
        let first = primary_bit(hash);
        let second = secondary_bit(hash);
        if self.bitmap & first != 0 {
            let i = index(self.bitmap, first);
            if self.entries[i].0 == *key {
                return Placement::At(first, i);
            }
            // Claimed by a foreign key; fall back to the secondary bit.
            if self.bitmap & second == 0 {
                return Placement::Free(second);
            }
            let j = index(self.bitmap, second);
            if self.entries[j].0 == *key {
                Placement::At(second, j)
            } else {
                Placement::Conflict
            }
        } else if self.bitmap & second != 0 {
            let j = index(self.bitmap, second);
            if self.entries[j].0 == *key {
                Placement::At(second, j)
            } else {
                Placement::Free(first)
            }
        } else {
            Placement::Free(first)
        }
    }

    /// Returns a reference to the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        match self.placement(key) {
            Placement::At(_, i) => Some(&self.entries[i].1),
            _ => None,
        }
    }

    /// Returns `true` if the map contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        matches!(self.placement(key), Placement::At(..))
    }
}

// ---------------------------------------------------------------------------
// Write operations
// ---------------------------------------------------------------------------

impl<K, V, S> BitmapMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher + Clone,
{
    /// Returns a map with `key` bound to `value`, promoting to a trie
    /// when the linear representation is exhausted.
    #[must_use]
    pub fn assoc(&self, key: K, value: V) -> Promoted<K, V, S> {
        match self.placement(&key) {
            Placement::At(_, i) => {
                if self.entries[i].1 == value {
                    return Promoted::Linear(self.clone());
                }
                let mut entries = self.entries.clone();
                entries[i].1 = value;
                Promoted::Linear(Self {
                    bitmap: self.bitmap,
                    entries,
                    hasher: self.hasher.clone(),
                })
            }
            Placement::Conflict => Promoted::Trie(self.promote().assoc(key, value)),
            Placement::Free(bit) => {
                if 2 * self.entries.len() >= LINEAR_THRESHOLD {
                    return Promoted::Trie(self.promote().assoc(key, value));
                }
                let i = index(self.bitmap, bit);
                let mut entries = self.entries.clone();
                entries.insert(i, (key, value));
                Promoted::Linear(Self {
                    bitmap: self.bitmap | bit,
                    entries,
                    hasher: self.hasher.clone(),
                })
            }
        }
    }

    /// Like [`assoc`](Self::assoc), failing if the key is already present.
    ///
    /// # Errors
    ///
    /// [`DuplicateKey`] when the map already contains `key`.
    pub fn assoc_strict(&self, key: K, value: V) -> Result<Promoted<K, V, S>, DuplicateKey> {
        if self.contains_key(&key) {
            return Err(DuplicateKey);
        }
        Ok(self.assoc(key, value))
    }

    /// Returns a map without `key`. Never changes representation.
    #[must_use]
    pub fn dissoc(&self, key: &K) -> Self {
        match self.placement(key) {
            Placement::At(bit, i) => {
                let mut entries = self.entries.clone();
                entries.remove(i);
                Self {
                    bitmap: self.bitmap ^ bit,
                    entries,
                    hasher: self.hasher.clone(),
                }
            }
            _ => self.clone(),
        }
    }

    /// Moves every pair into a [`HamtMap`] through its transient facade.
    #[must_use]
    pub fn promote(&self) -> HamtMap<K, V, S> {
        let mut transient = HamtMap::with_hasher(self.hasher.clone()).as_transient();
        for (k, v) in &self.entries {
            transient
                .assoc(k.clone(), v.clone())
                .expect("fresh transient is editable");
        }
        transient.persistent().expect("fresh transient is editable")
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<K, V, S: Default> Default for BitmapMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> fmt::Debug for BitmapMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitmapMap")
            .field("len", &self.entries.len())
            .field("bitmap", &format_args!("{:#018x}", self.bitmap))
            .finish_non_exhaustive()
    }
}
