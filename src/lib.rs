//! Persistent hash map based on a hash array mapped trie.
//!
//! The trie addresses keys by 5-bit slices of a 32-bit hash; each node's
//! 64-bit bitmap spends two bits per slot, so a singleton branch stores
//! its key/value pair inline in the parent instead of behind a pointer.
//!
//! # Key properties
//!
//! - **Structural sharing**: `assoc`/`dissoc` return new maps allocating
//!   O(log₃₂ n) fresh nodes; old versions stay live and readable
//! - **Transients**: single-owner batched mutation behind an editor token
//! - **Three-way merge**: structural reconciliation against a common
//!   ancestor, with pointer-identity fast paths over shared subtrees
//! - **Zero `unsafe`**: enforced by `#![forbid(unsafe_code)]`
//!
//! # References
//!
//! - Bagwell, 2001 — "Ideal Hash Trees"

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

use std::error::Error;
use std::fmt;

pub mod hash;
pub mod iter;
pub mod node;

mod bitmap_map;
mod edit;
mod map;
mod ops;
mod transient;

#[cfg(test)]
mod tests;

pub use bitmap_map::{BitmapMap, Promoted};
pub use iter::Iter;
pub use map::HamtMap;
pub use transient::TransientHamtMap;

/// The key was already present where the operation required it absent.
///
/// Returned by the `assoc_strict` family; the map is left unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DuplicateKey;

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key already present")
    }
}

impl Error for DuplicateKey {}

/// Lifecycle error from a transient map operation.
///
/// A transient is bound to the thread that opened it and dies when
/// published; every operation verifies both before touching the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransientError {
    /// The transient was already published with `persistent`.
    AfterPersistent,
    /// The operation came from a thread other than the owner.
    NotOwner,
}

impl fmt::Display for TransientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AfterPersistent => f.write_str("transient used after persistent call"),
            Self::NotOwner => f.write_str("transient used by non-owner thread"),
        }
    }
}

impl Error for TransientError {}
