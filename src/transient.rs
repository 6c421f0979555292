//! Transient facade — single-owner batched mutation.

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use crate::edit::{next_token, Editor};
use crate::hash::{hash_key, DefaultHashBuilder};
use crate::node::NodeRef;
use crate::ops::get::lookup_recursive;
use crate::ops::insert::{assoc_recursive, singleton_root, AssocOutcome};
use crate::ops::remove::{dissoc_recursive, RemoveOutcome};
use crate::HamtMap;
use crate::TransientError;

/// Mutable staging area over a [`HamtMap`], bound to the thread that
/// opened it.
///
/// Nodes created by this transient carry its editor token and are mutated
/// in place on later operations; everything inherited from the source map
/// is copied on first write. [`persistent`](Self::persistent) clears the
/// token, after which every operation fails with
/// [`TransientError::AfterPersistent`]; operations from any other thread
/// fail with [`TransientError::NotOwner`].
pub struct TransientHamtMap<K, V, S = DefaultHashBuilder> {
    root: Option<NodeRef<K, V>>,
    size: usize,
    token: AtomicU64,
    owner: ThreadId,
    hasher: S,
}

impl<K, V, S: Clone> TransientHamtMap<K, V, S> {
    pub(crate) fn from_map(map: &HamtMap<K, V, S>) -> Self {
        Self {
            root: map.root().cloned(),
            size: map.len(),
            token: AtomicU64::new(next_token()),
            owner: thread::current().id(),
            hasher: map.hasher().clone(),
        }
    }
}

impl<K, V, S> TransientHamtMap<K, V, S> {
    fn ensure_editable(&self) -> Result<Editor, TransientError> {
        if thread::current().id() != self.owner {
            return Err(TransientError::NotOwner);
        }
        match self.token.load(Ordering::Acquire) {
            0 => Err(TransientError::AfterPersistent),
            token => Ok(Editor::Transient(token)),
        }
    }

    /// Returns the number of key-value pairs.
    ///
    /// # Errors
    ///
    /// [`TransientError`] on lifecycle misuse, like every operation here.
    pub fn len(&self) -> Result<usize, TransientError> {
        self.ensure_editable()?;
        Ok(self.size)
    }

    /// Returns `true` if the map contains no entries.
    ///
    /// # Errors
    ///
    /// [`TransientError`] on lifecycle misuse.
    pub fn is_empty(&self) -> Result<bool, TransientError> {
        Ok(self.len()? == 0)
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> TransientHamtMap<K, V, S> {
    /// Returns a reference to the value associated with `key`.
    ///
    /// # Errors
    ///
    /// [`TransientError`] on lifecycle misuse.
    pub fn get(&self, key: &K) -> Result<Option<&V>, TransientError> {
        self.ensure_editable()?;
        let Some(root) = &self.root else {
            return Ok(None);
        };
        Ok(lookup_recursive(
            root,
            hash_key(&self.hasher, key),
            key,
            0,
        ))
    }

    /// Returns `true` if the map contains the given key.
    ///
    /// # Errors
    ///
    /// [`TransientError`] on lifecycle misuse.
    pub fn contains_key(&self, key: &K) -> Result<bool, TransientError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<K, V, S> TransientHamtMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher,
{
    /// Binds `key` to `value`.
    ///
    /// # Errors
    ///
    /// [`TransientError`] on lifecycle misuse; the map is unchanged.
    pub fn assoc(&mut self, key: K, value: V) -> Result<(), TransientError> {
        let editor = self.ensure_editable()?;
        let hash = hash_key(&self.hasher, &key);
        match &mut self.root {
            None => {
                self.root = Some(singleton_root(&editor, hash, key, value));
                self.size = 1;
            }
            Some(root) => {
                if let AssocOutcome::Added =
                    assoc_recursive(&self.hasher, &editor, root, 0, hash, key, value)
                {
                    self.size += 1;
                }
            }
        }
        Ok(())
    }

    /// Removes `key` if present.
    ///
    /// # Errors
    ///
    /// [`TransientError`] on lifecycle misuse; the map is unchanged.
    pub fn dissoc(&mut self, key: &K) -> Result<(), TransientError> {
        let editor = self.ensure_editable()?;
        let Some(root) = &mut self.root else {
            return Ok(());
        };
        let hash = hash_key(&self.hasher, key);
        match dissoc_recursive(&editor, root, 0, hash, key) {
            RemoveOutcome::NotFound => {}
            RemoveOutcome::Removed => self.size -= 1,
            RemoveOutcome::Collapsed(k, v) => {
                let h = hash_key(&self.hasher, &k);
                self.root = Some(singleton_root(&editor, h, k, v));
                self.size -= 1;
            }
            RemoveOutcome::Emptied => {
                self.root = None;
                self.size = 0;
            }
        }
        Ok(())
    }
}

impl<K, V, S: Clone> TransientHamtMap<K, V, S> {
    /// Publishes the staged map, invalidating this transient.
    ///
    /// One-shot: the editor token is cleared, and every later operation on
    /// this transient fails.
    ///
    /// # Errors
    ///
    /// [`TransientError`] when already published or called from a
    /// non-owner thread.
    pub fn persistent(&mut self) -> Result<HamtMap<K, V, S>, TransientError> {
        self.ensure_editable()?;
        self.token.store(0, Ordering::Release);
        let size = std::mem::replace(&mut self.size, 0);
        Ok(HamtMap::from_parts(
            self.root.take(),
            size,
            self.hasher.clone(),
        ))
    }
}

impl<K, V, S> fmt::Debug for TransientHamtMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransientHamtMap")
            .field("len", &self.size)
            .finish_non_exhaustive()
    }
}
