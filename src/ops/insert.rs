//! Insertion operation — editor-driven copy-on-write descent.

use std::hash::{BuildHasher, Hash};

use crate::edit::Editor;
use crate::hash::hash_key;
use crate::node::{self, Cell, Node, NodeRef};

/// Outcome of a recursive assoc.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AssocOutcome {
    /// Key was present with an equal value — tree untouched.
    Unchanged,
    /// Key was present — its value was replaced, counts unchanged.
    Updated,
    /// Key was absent — an entry was added, counts grew by one.
    Added,
}

enum Target {
    Empty,
    Entry,
    Branch,
    CollisionSame,
    CollisionLift { cslot: u32, count: usize },
}

/// Inserts `key`/`value` into the subtree rooted at `node`.
///
/// `node` is rewritten in place to the new subtree root; whether the nodes
/// along the path are mutated or copied is the editor's decision.
pub fn assoc_recursive<K, V, S>(
    hasher: &S,
    editor: &Editor,
    node: &mut NodeRef<K, V>,
    shift: u32,
    hash: u32,
    key: K,
    value: V,
) -> AssocOutcome
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
    S: BuildHasher,
{
    let slot = node::slot(hash, shift);
    let target = match node.as_ref() {
        Node::Collision(c) if c.hash == hash => Target::CollisionSame,
        Node::Collision(c) => Target::CollisionLift {
            cslot: node::slot(c.hash, shift),
            count: c.entries.len(),
        },
        Node::Bitmap(n) => match node::slot_bits(n.bitmap, slot) {
            node::SLOT_EMPTY => Target::Empty,
            node::SLOT_BRANCH => Target::Branch,
            _ => Target::Entry,
        },
    };

    match target {
        Target::CollisionSame => assoc_collision(editor, node, key, value),

        Target::CollisionLift { cslot, count } => {
            // A collision node with a different full hash sits in the way.
            // Lift it under a fresh single-branch bitmap node and retry at
            // this level; the two hashes diverge by MAX_SHIFT.
            let lifted = editor.new_bitmap(
                count,
                node::SLOT_BRANCH << (2 * cslot),
                vec![Cell::Branch(NodeRef::clone(node))],
            );
            *node = lifted;
            assoc_recursive(hasher, editor, node, shift, hash, key, value)
        }

        Target::Empty => {
            let Node::Bitmap(n) = editor.edit(node) else {
                unreachable!()
            };
            n.insert_entry(slot, key, value);
            AssocOutcome::Added
        }

        Target::Entry => {
            let (same_key, same_value) = {
                let Node::Bitmap(n) = node.as_ref() else {
                    unreachable!()
                };
                let (k, v) = n.entry_at(n.cell_index(slot));
                let same_key = *k == key;
                (same_key, same_key && *v == value)
            };
            if same_value {
                return AssocOutcome::Unchanged;
            }
            if same_key {
                let Node::Bitmap(n) = editor.edit(node) else {
                    unreachable!()
                };
                n.set_value(slot, value);
                return AssocOutcome::Updated;
            }
            // Different key in the slot: push both entries into a subtree.
            let (stored_key, stored_value) = {
                let Node::Bitmap(n) = node.as_ref() else {
                    unreachable!()
                };
                let (k, v) = n.entry_at(n.cell_index(slot));
                (k.clone(), v.clone())
            };
            let stored_hash = hash_key(hasher, &stored_key);
            let child = make_branch(
                editor,
                shift + node::BITS_PER_LEVEL,
                hash,
                key,
                value,
                stored_hash,
                stored_key,
                stored_value,
            );
            let Node::Bitmap(n) = editor.edit(node) else {
                unreachable!()
            };
            n.promote_entry(slot, child);
            AssocOutcome::Added
        }

        Target::Branch => {
            if editor.owns(node) {
                // Owned by this editor: descend through the cell in place.
                let Node::Bitmap(n) = editor.edit(node) else {
                    unreachable!()
                };
                let pos = n.cell_index(slot);
                let outcome = assoc_recursive(
                    hasher,
                    editor,
                    n.branch_mut_at(pos),
                    shift + node::BITS_PER_LEVEL,
                    hash,
                    key,
                    value,
                );
                if outcome == AssocOutcome::Added {
                    n.count += 1;
                }
                outcome
            } else {
                // Shared: descend on a detached pointer and touch this node
                // only if the child actually changed.
                let mut child = {
                    let Node::Bitmap(n) = node.as_ref() else {
                        unreachable!()
                    };
                    NodeRef::clone(n.branch_at(n.cell_index(slot)))
                };
                let outcome = assoc_recursive(
                    hasher,
                    editor,
                    &mut child,
                    shift + node::BITS_PER_LEVEL,
                    hash,
                    key,
                    value,
                );
                if outcome == AssocOutcome::Unchanged {
                    return outcome;
                }
                let Node::Bitmap(n) = editor.edit(node) else {
                    unreachable!()
                };
                n.set_branch(slot, child);
                if outcome == AssocOutcome::Added {
                    n.count += 1;
                }
                outcome
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Collision node insert (full hashes already known equal)
// ---------------------------------------------------------------------------

fn assoc_collision<K, V>(
    editor: &Editor,
    node: &mut NodeRef<K, V>,
    key: K,
    value: V,
) -> AssocOutcome
where
    K: Eq + Clone,
    V: PartialEq + Clone,
{
    enum Hit {
        Same,
        Replace(usize),
        Append,
    }
    let hit = {
        let Node::Collision(c) = node.as_ref() else {
            unreachable!()
        };
        match c.entries.iter().position(|(k, _)| *k == key) {
            Some(i) if c.entries[i].1 == value => Hit::Same,
            Some(i) => Hit::Replace(i),
            None => Hit::Append,
        }
    };
    match hit {
        Hit::Same => AssocOutcome::Unchanged,
        Hit::Replace(i) => {
            let Node::Collision(c) = editor.edit(node) else {
                unreachable!()
            };
            c.entries[i].1 = value;
            AssocOutcome::Updated
        }
        Hit::Append => {
            let Node::Collision(c) = editor.edit(node) else {
                unreachable!()
            };
            c.entries.push((key, value));
            AssocOutcome::Added
        }
    }
}

// ---------------------------------------------------------------------------
// Subtree creation
// ---------------------------------------------------------------------------

/// Builds a one-entry root node.
pub(crate) fn singleton_root<K, V>(
    editor: &Editor,
    hash: u32,
    key: K,
    value: V,
) -> NodeRef<K, V> {
    let slot = node::slot(hash, 0);
    editor.new_bitmap(
        1,
        node::SLOT_ENTRY << (2 * slot),
        vec![Cell::Key(key), Cell::Value(value)],
    )
}

/// Builds a node at `shift` holding two entries with distinct keys.
///
/// Descends while the 5-bit hash slices agree, producing a chain of
/// single-branch nodes; fully equal hashes short-circuit to a two-entry
/// collision node.
pub(crate) fn make_branch<K, V>(
    editor: &Editor,
    shift: u32,
    h1: u32,
    k1: K,
    v1: V,
    h2: u32,
    k2: K,
    v2: V,
) -> NodeRef<K, V> {
    if h1 == h2 {
        return editor.new_collision(h1, vec![(k1, v1), (k2, v2)]);
    }
    debug_assert!(
        shift <= node::MAX_SHIFT,
        "distinct hashes diverge within the hash width"
    );
    let s1 = node::slot(h1, shift);
    let s2 = node::slot(h2, shift);
    if s1 == s2 {
        let child = make_branch(editor, shift + node::BITS_PER_LEVEL, h1, k1, v1, h2, k2, v2);
        editor.new_bitmap(
            2,
            node::SLOT_BRANCH << (2 * s1),
            vec![Cell::Branch(child)],
        )
    } else {
        let bitmap = (node::SLOT_ENTRY << (2 * s1)) | (node::SLOT_ENTRY << (2 * s2));
        let cells = if s1 < s2 {
            vec![
                Cell::Key(k1),
                Cell::Value(v1),
                Cell::Key(k2),
                Cell::Value(v2),
            ]
        } else {
            vec![
                Cell::Key(k2),
                Cell::Value(v2),
                Cell::Key(k1),
                Cell::Value(v1),
            ]
        };
        editor.new_bitmap(2, bitmap, cells)
    }
}
