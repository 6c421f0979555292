//! Persistent hash array mapped trie map.

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::ops;

use crate::edit::Editor;
use crate::hash::{hash_key, DefaultHashBuilder};
use crate::iter::Iter;
use crate::node::NodeRef;
use crate::ops::get::lookup_recursive;
use crate::ops::insert::{assoc_recursive, singleton_root, AssocOutcome};
use crate::ops::merge::{merge_views, Merged, View};
use crate::ops::remove::{dissoc_recursive, RemoveOutcome};
use crate::transient::TransientHamtMap;
use crate::DuplicateKey;

/// Persistent hash map backed by a hash array mapped trie.
///
/// Every mutating operation returns a new map and leaves the receiver
/// intact; the two share all unchanged subtrees. A published map is
/// immutable and may be read from any number of threads.
///
/// The `S` build hasher must be a pure function identical across
/// instances; see [`hash`](crate::hash).
pub struct HamtMap<K, V, S = DefaultHashBuilder> {
    root: Option<NodeRef<K, V>>,
    size: usize,
    hasher: S,
}

// ---------------------------------------------------------------------------
// Construction & accessors — no key/value bounds
// ---------------------------------------------------------------------------

impl<K, V> HamtMap<K, V> {
    /// Creates an empty map with the default hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V, S> HamtMap<K, V, S> {
    /// Creates an empty map that hashes with `hasher`.
    #[must_use]
    pub const fn with_hasher(hasher: S) -> Self {
        Self {
            root: None,
            size: 0,
            hasher,
        }
    }

    /// Returns the number of key-value pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns `true` if both maps share the same root node.
    ///
    /// A pointer-equal pair is guaranteed equal; the converse does not
    /// hold.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => NodeRef::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns an iterator over `(&K, &V)` pairs.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.root.as_ref(), self.size)
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Folds `f` over every entry.
    pub fn kv_reduce<A, F>(&self, init: A, mut f: F) -> A
    where
        F: FnMut(A, &K, &V) -> A,
    {
        let mut acc = init;
        for (k, v) in self.iter() {
            acc = f(acc, k, v);
        }
        acc
    }

    pub(crate) fn root(&self) -> Option<&NodeRef<K, V>> {
        self.root.as_ref()
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn from_parts(root: Option<NodeRef<K, V>>, size: usize, hasher: S) -> Self {
        Self { root, size, hasher }
    }
}

// ---------------------------------------------------------------------------
// Read operations
// ---------------------------------------------------------------------------

impl<K: Hash + Eq, V, S: BuildHasher> HamtMap<K, V, S> {
    /// Returns a reference to the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let root = self.root.as_ref()?;
        lookup_recursive(root, hash_key(&self.hasher, key), key, 0)
    }

    /// Returns `true` if the map contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }
}

// ---------------------------------------------------------------------------
// Write operations
// ---------------------------------------------------------------------------

impl<K, V, S> HamtMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher + Clone,
{
    /// Returns a map with `key` bound to `value`.
    ///
    /// Binding a key to a value equal to its current one returns a map
    /// sharing the receiver's root (see [`ptr_eq`](Self::ptr_eq)).
    #[must_use]
    pub fn assoc(&self, key: K, value: V) -> Self {
        let hash = hash_key(&self.hasher, &key);
        let Some(root) = &self.root else {
            let root = singleton_root(&Editor::Persistent, hash, key, value);
            return Self::from_parts(Some(root), 1, self.hasher.clone());
        };
        let mut new_root = NodeRef::clone(root);
        match assoc_recursive(
            &self.hasher,
            &Editor::Persistent,
            &mut new_root,
            0,
            hash,
            key,
            value,
        ) {
            AssocOutcome::Unchanged => self.clone(),
            AssocOutcome::Updated => Self::from_parts(Some(new_root), self.size, self.hasher.clone()),
            AssocOutcome::Added => {
                Self::from_parts(Some(new_root), self.size + 1, self.hasher.clone())
            }
        }
    }

    /// Returns a map with `key` bound to `value`, failing if the key is
    /// already present.
    ///
    /// # Errors
    ///
    /// [`DuplicateKey`] when the map already contains `key`; the map is
    /// unchanged.
    pub fn assoc_strict(&self, key: K, value: V) -> Result<Self, DuplicateKey> {
        if self.contains_key(&key) {
            return Err(DuplicateKey);
        }
        Ok(self.assoc(key, value))
    }

    /// Returns a map without `key`.
    ///
    /// Removing an absent key returns a map sharing the receiver's root.
    #[must_use]
    pub fn dissoc(&self, key: &K) -> Self {
        let Some(root) = &self.root else {
            return self.clone();
        };
        let hash = hash_key(&self.hasher, key);
        let mut new_root = NodeRef::clone(root);
        match dissoc_recursive(&Editor::Persistent, &mut new_root, 0, hash, key) {
            RemoveOutcome::NotFound => self.clone(),
            RemoveOutcome::Removed => {
                Self::from_parts(Some(new_root), self.size - 1, self.hasher.clone())
            }
            RemoveOutcome::Collapsed(k, v) => {
                let h = hash_key(&self.hasher, &k);
                let root = singleton_root(&Editor::Persistent, h, k, v);
                Self::from_parts(Some(root), self.size - 1, self.hasher.clone())
            }
            RemoveOutcome::Emptied => Self::from_parts(None, 0, self.hasher.clone()),
        }
    }

    /// Returns an empty map with the same hasher.
    #[must_use]
    pub fn empty(&self) -> Self {
        Self::from_parts(None, 0, self.hasher.clone())
    }

    /// Opens a transient bound to the calling thread, sharing this map's
    /// structure until it is mutated.
    #[must_use]
    pub fn as_transient(&self) -> TransientHamtMap<K, V, S> {
        TransientHamtMap::from_map(self)
    }

    /// Three-way structural merge of `a` and `b` against their common
    /// `ancestor`.
    ///
    /// Keys changed on only one side take that side's value; agreeing
    /// changes are taken once; a key changed on both sides to different
    /// values is handed to `resolve` as
    /// `(ancestor value, a's value, b's value)` exactly once, with `None`
    /// standing for "absent". `resolve` returning `None` deletes the key.
    /// Subtrees shared by pointer identity with the ancestor are skipped
    /// wholesale, so the cost is proportional to the changed portions.
    #[must_use]
    pub fn merge<F>(ancestor: &Self, a: &Self, b: &Self, mut resolve: F) -> Self
    where
        F: FnMut(Option<&V>, Option<&V>, Option<&V>) -> Option<V>,
    {
        if ancestor.ptr_eq(a) {
            return b.clone();
        }
        if ancestor.ptr_eq(b) || a.ptr_eq(b) {
            return a.clone();
        }
        let merged = merge_views(
            &a.hasher,
            &mut resolve,
            View::of_root(ancestor.root.as_ref()),
            View::of_root(a.root.as_ref()),
            View::of_root(b.root.as_ref()),
            0,
        );
        match merged {
            Merged::Empty => Self::from_parts(None, 0, a.hasher.clone()),
            Merged::Leaf(k, v) => {
                let h = hash_key(&a.hasher, &k);
                let root = singleton_root(&Editor::Persistent, h, k, v);
                Self::from_parts(Some(root), 1, a.hasher.clone())
            }
            Merged::Tree(node) => {
                let size = node.count();
                Self::from_parts(Some(node), size, a.hasher.clone())
            }
        }
    }
}

impl<K, V, S> HamtMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher + Clone + Default,
{
    /// Builds a map from entries, failing on the first duplicate key.
    ///
    /// # Errors
    ///
    /// [`DuplicateKey`] when two entries share a key.
    pub fn from_entries_strict<I>(entries: I) -> Result<Self, DuplicateKey>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut transient = Self::with_hasher(S::default()).as_transient();
        for (key, value) in entries {
            if transient
                .contains_key(&key)
                .expect("fresh transient is editable")
            {
                return Err(DuplicateKey);
            }
            transient
                .assoc(key, value)
                .expect("fresh transient is editable");
        }
        Ok(transient.persistent().expect("fresh transient is editable"))
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<K, V, S: Clone> Clone for HamtMap<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            size: self.size,
            hasher: self.hasher.clone(),
        }
    }
}

impl<K, V, S: Default> Default for HamtMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> fmt::Debug for HamtMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HamtMap")
            .field("len", &self.size)
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq, V: PartialEq, S: BuildHasher> PartialEq for HamtMap<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Hash + Eq, V: Eq, S: BuildHasher> Eq for HamtMap<K, V, S> {}

impl<K, V, S> FromIterator<(K, V)> for HamtMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut transient = Self::with_hasher(S::default()).as_transient();
        for (key, value) in iter {
            transient
                .assoc(key, value)
                .expect("fresh transient is editable");
        }
        transient.persistent().expect("fresh transient is editable")
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ops::Index<&K> for HamtMap<K, V, S> {
    type Output = V;

    fn index(&self, key: &K) -> &V {
        self.get(key).expect("key not found")
    }
}

impl<'a, K, V, S> IntoIterator for &'a HamtMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}
