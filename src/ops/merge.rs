//! Three-way structural merge.
//!
//! Reconciles two descendant maps against their common ancestor, subtree
//! by subtree. Identity fast paths apply at every level: a side whose
//! subtree is pointer-equal to the ancestor's contributed no changes
//! there, so the other side's subtree is adopted wholesale. Only where
//! both sides are bitmap nodes does the merge recurse slot-wise over the
//! union bitmap; every slot involving an inline entry, a collision node or
//! an absent side reconciles key by key. Subtrees reconciling to a single
//! entry are installed inline, preserving the collapse invariant.

use std::hash::{BuildHasher, Hash};

use crate::edit::Editor;
use crate::hash::hash_key;
use crate::iter::Iter;
use crate::node::{self, BitmapNode, Cell, Node, NodeRef};
use crate::ops::get::lookup_recursive;
use crate::ops::insert::{assoc_recursive, make_branch};

/// A subtree projection during merge: nothing, one entry, or a node.
pub enum View<'a, K, V> {
    /// No entries on this side.
    Empty,
    /// A single inline entry.
    Leaf(&'a K, &'a V),
    /// A whole node.
    Tree(&'a NodeRef<K, V>),
}

impl<K, V> Clone for View<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for View<'_, K, V> {}

impl<'a, K, V> View<'a, K, V> {
    /// Wraps a map root.
    pub fn of_root(root: Option<&'a NodeRef<K, V>>) -> Self {
        match root {
            None => View::Empty,
            Some(node) => View::Tree(node),
        }
    }
}

/// An owned merge result for one subtree.
pub enum Merged<K, V> {
    /// All entries reconciled away.
    Empty,
    /// A single surviving entry, to be installed inline.
    Leaf(K, V),
    /// A node holding two or more entries.
    Tree(NodeRef<K, V>),
}

fn merged_count<K, V>(merged: &Merged<K, V>) -> usize {
    match merged {
        Merged::Empty => 0,
        Merged::Leaf(..) => 1,
        Merged::Tree(node) => node.count(),
    }
}

fn view_eq<K, V>(a: View<'_, K, V>, b: View<'_, K, V>) -> bool {
    match (a, b) {
        (View::Empty, View::Empty) => true,
        (View::Tree(x), View::Tree(y)) => NodeRef::ptr_eq(x, y),
        _ => false,
    }
}

fn take_view<K: Clone, V: Clone>(view: View<'_, K, V>) -> Merged<K, V> {
    match view {
        View::Empty => Merged::Empty,
        View::Leaf(k, v) => Merged::Leaf(k.clone(), v.clone()),
        View::Tree(node) => Merged::Tree(NodeRef::clone(node)),
    }
}

/// Merges the subtrees `a` and `b` against `anc`, all rooted at `shift`.
pub fn merge_views<K, V, S, F>(
    hasher: &S,
    resolve: &mut F,
    anc: View<'_, K, V>,
    a: View<'_, K, V>,
    b: View<'_, K, V>,
    shift: u32,
) -> Merged<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher,
    F: FnMut(Option<&V>, Option<&V>, Option<&V>) -> Option<V>,
{
    if view_eq(a, anc) {
        return take_view(b);
    }
    if view_eq(b, anc) || view_eq(a, b) {
        return take_view(a);
    }
    if let (View::Tree(na), View::Tree(nb)) = (a, b) {
        if let (Node::Bitmap(ba), Node::Bitmap(bb)) = (na.as_ref(), nb.as_ref()) {
            return merge_bitmap(hasher, resolve, anc, ba, bb, shift);
        }
    }
    merge_keywise(hasher, resolve, anc, a, b, shift)
}

// ---------------------------------------------------------------------------
// Slot-wise recursion over two bitmap nodes
// ---------------------------------------------------------------------------

fn merge_bitmap<K, V, S, F>(
    hasher: &S,
    resolve: &mut F,
    anc: View<'_, K, V>,
    a: &BitmapNode<K, V>,
    b: &BitmapNode<K, V>,
    shift: u32,
) -> Merged<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher,
    F: FnMut(Option<&V>, Option<&V>, Option<&V>) -> Option<V>,
{
    let union = a.bitmap | b.bitmap;
    let mut results: Vec<(u32, Merged<K, V>)> = Vec::new();
    let mut count = 0;
    for slot in 0..32 {
        if node::slot_bits(union, slot) == node::SLOT_EMPTY {
            continue;
        }
        let merged = merge_views(
            hasher,
            resolve,
            slot_view(hasher, anc, slot, shift),
            bitmap_slot_view(a, slot),
            bitmap_slot_view(b, slot),
            shift + node::BITS_PER_LEVEL,
        );
        if let Merged::Empty = merged {
            continue;
        }
        count += merged_count(&merged);
        results.push((slot, merged));
    }

    match count {
        0 => Merged::Empty,
        1 => {
            // A single survivor is always a leaf: adopted subtrees hold at
            // least two entries and built subtrees demote singletons.
            let (_, merged) = results
                .into_iter()
                .next()
                .expect("one survivor implies one result");
            merged
        }
        _ => {
            let mut bitmap = 0;
            let mut cells = Vec::new();
            for (slot, merged) in results {
                match merged {
                    Merged::Leaf(k, v) => {
                        bitmap |= node::SLOT_ENTRY << (2 * slot);
                        cells.push(Cell::Key(k));
                        cells.push(Cell::Value(v));
                    }
                    Merged::Tree(child) => {
                        bitmap |= node::SLOT_BRANCH << (2 * slot);
                        cells.push(Cell::Branch(child));
                    }
                    Merged::Empty => unreachable!("empty results are skipped"),
                }
            }
            Merged::Tree(Editor::Persistent.new_bitmap(count, bitmap, cells))
        }
    }
}

/// Projects a view rooted at `shift` onto one of its slots.
fn slot_view<'a, K, V, S>(
    hasher: &S,
    view: View<'a, K, V>,
    slot: u32,
    shift: u32,
) -> View<'a, K, V>
where
    K: Hash,
    S: BuildHasher,
{
    match view {
        View::Empty => View::Empty,
        View::Leaf(k, v) => {
            if node::slot(hash_key(hasher, k), shift) == slot {
                View::Leaf(k, v)
            } else {
                View::Empty
            }
        }
        View::Tree(n) => match n.as_ref() {
            Node::Bitmap(bitmap_node) => bitmap_slot_view(bitmap_node, slot),
            Node::Collision(c) => {
                if node::slot(c.hash, shift) == slot {
                    View::Tree(n)
                } else {
                    View::Empty
                }
            }
        },
    }
}

fn bitmap_slot_view<K, V>(n: &BitmapNode<K, V>, slot: u32) -> View<'_, K, V> {
    match node::slot_bits(n.bitmap, slot) {
        node::SLOT_EMPTY => View::Empty,
        node::SLOT_BRANCH => View::Tree(n.branch_at(n.cell_index(slot))),
        _ => {
            let (k, v) = n.entry_at(n.cell_index(slot));
            View::Leaf(k, v)
        }
    }
}

// ---------------------------------------------------------------------------
// Key-wise reconciliation
// ---------------------------------------------------------------------------

fn merge_keywise<K, V, S, F>(
    hasher: &S,
    resolve: &mut F,
    anc: View<'_, K, V>,
    a: View<'_, K, V>,
    b: View<'_, K, V>,
    shift: u32,
) -> Merged<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher,
    F: FnMut(Option<&V>, Option<&V>, Option<&V>) -> Option<V>,
{
    let mut survivors: Vec<(K, V)> = Vec::new();
    for (key, va) in view_entries(a) {
        let hash = hash_key(hasher, key);
        let vb = view_get(b, hash, key, shift);
        let vanc = view_get(anc, hash, key, shift);
        if let Some(value) = resolve_entry(resolve, vanc, Some(va), vb) {
            survivors.push((key.clone(), value));
        }
    }
    for (key, vb) in view_entries(b) {
        let hash = hash_key(hasher, key);
        if view_get(a, hash, key, shift).is_some() {
            continue; // reconciled in the first pass
        }
        let vanc = view_get(anc, hash, key, shift);
        if let Some(value) = resolve_entry(resolve, vanc, None, Some(vb)) {
            survivors.push((key.clone(), value));
        }
    }
    from_entries(hasher, survivors, shift)
}

/// The per-key decision table.
///
/// `None` stands for "absent"; the resolver is consulted only when both
/// sides changed the entry in different ways, and may delete the key by
/// returning `None`.
fn resolve_entry<V, F>(
    resolve: &mut F,
    anc: Option<&V>,
    a: Option<&V>,
    b: Option<&V>,
) -> Option<V>
where
    V: PartialEq + Clone,
    F: FnMut(Option<&V>, Option<&V>, Option<&V>) -> Option<V>,
{
    if a == b {
        return a.cloned();
    }
    match anc {
        None => match (a, b) {
            (Some(va), None) => Some(va.clone()),
            (None, Some(vb)) => Some(vb.clone()),
            _ => resolve(None, a, b),
        },
        Some(v0) => {
            if a == Some(v0) {
                b.cloned()
            } else if b == Some(v0) {
                a.cloned()
            } else {
                resolve(anc, a, b)
            }
        }
    }
}

fn view_get<'a, K: Eq, V>(
    view: View<'a, K, V>,
    hash: u32,
    key: &K,
    shift: u32,
) -> Option<&'a V> {
    match view {
        View::Empty => None,
        View::Leaf(k, v) => {
            if k == key {
                Some(v)
            } else {
                None
            }
        }
        View::Tree(n) => lookup_recursive(n, hash, key, shift),
    }
}

enum ViewEntries<'a, K, V> {
    Empty,
    One(Option<(&'a K, &'a V)>),
    Tree(Iter<'a, K, V>),
}

fn view_entries<K, V>(view: View<'_, K, V>) -> ViewEntries<'_, K, V> {
    match view {
        View::Empty => ViewEntries::Empty,
        View::Leaf(k, v) => ViewEntries::One(Some((k, v))),
        View::Tree(n) => ViewEntries::Tree(Iter::of_node(n)),
    }
}

impl<'a, K, V> Iterator for ViewEntries<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ViewEntries::Empty => None,
            ViewEntries::One(entry) => entry.take(),
            ViewEntries::Tree(iter) => iter.next(),
        }
    }
}

/// Builds a subtree rooted at `shift` from reconciled entries.
fn from_entries<K, V, S>(hasher: &S, entries: Vec<(K, V)>, shift: u32) -> Merged<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher,
{
    let mut iter = entries.into_iter();
    let Some((k0, v0)) = iter.next() else {
        return Merged::Empty;
    };
    let Some((k1, v1)) = iter.next() else {
        return Merged::Leaf(k0, v0);
    };
    let h0 = hash_key(hasher, &k0);
    let h1 = hash_key(hasher, &k1);
    let mut node = make_branch(&Editor::Persistent, shift, h0, k0, v0, h1, k1, v1);
    for (key, value) in iter {
        let hash = hash_key(hasher, &key);
        assoc_recursive(
            hasher,
            &Editor::Persistent,
            &mut node,
            shift,
            hash,
            key,
            value,
        );
    }
    Merged::Tree(node)
}
