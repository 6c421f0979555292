//! Removal operation — collapse-aware copy-on-write descent.
//!
//! Deletion maintains the collapse invariant in a single pass: a child
//! that would be left with exactly one entry hands the survivor up as
//! [`RemoveOutcome::Collapsed`] instead of materialising a singleton node,
//! and the parent rewrites its branch slot to an inline entry. Through a
//! chain of two-entry nodes the survivor propagates untouched, so a deep
//! single-child chain collapses in one traversal.

use crate::edit::Editor;
use crate::node::{self, Node, NodeRef};

/// Outcome of a recursive dissoc.
pub enum RemoveOutcome<K, V> {
    /// Key was not found — tree untouched.
    NotFound,
    /// Key was removed; the subtree still holds at least two entries.
    Removed,
    /// Key was removed and the subtree reduced to this single surviving
    /// entry; the caller installs it inline.
    Collapsed(K, V),
    /// Key was removed and the subtree is empty. Only the root can report
    /// this: every deeper subtree holds two entries before a removal and
    /// collapses instead.
    Emptied,
}

enum Target {
    Miss,
    Entry,
    Branch,
    Collision,
}

/// Removes `key` from the subtree rooted at `node`.
pub fn dissoc_recursive<K, V>(
    editor: &Editor,
    node: &mut NodeRef<K, V>,
    shift: u32,
    hash: u32,
    key: &K,
) -> RemoveOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone,
{
    let slot = node::slot(hash, shift);
    let target = match node.as_ref() {
        Node::Collision(_) => Target::Collision,
        Node::Bitmap(n) => match node::slot_bits(n.bitmap, slot) {
            node::SLOT_EMPTY => Target::Miss,
            node::SLOT_BRANCH => Target::Branch,
            _ => Target::Entry,
        },
    };

    match target {
        Target::Miss => RemoveOutcome::NotFound,
        Target::Collision => dissoc_collision(editor, node, hash, key),

        Target::Entry => {
            enum Hit<K, V> {
                Miss,
                Emptied,
                Collapse(K, V),
                Remove,
            }
            let hit = {
                let Node::Bitmap(n) = node.as_ref() else {
                    unreachable!()
                };
                let (k, _) = n.entry_at(n.cell_index(slot));
                if k != key {
                    Hit::Miss
                } else if n.count == 1 {
                    Hit::Emptied
                } else if n.count == 2 {
                    // The only other occupant is inline too: a branch child
                    // would carry at least two entries of its own.
                    let other = n.other_entry_slot(slot);
                    let (k, v) = n.entry_at(n.cell_index(other));
                    Hit::Collapse(k.clone(), v.clone())
                } else {
                    Hit::Remove
                }
            };
            match hit {
                Hit::Miss => RemoveOutcome::NotFound,
                Hit::Emptied => RemoveOutcome::Emptied,
                Hit::Collapse(k, v) => RemoveOutcome::Collapsed(k, v),
                Hit::Remove => {
                    let Node::Bitmap(n) = editor.edit(node) else {
                        unreachable!()
                    };
                    n.remove_entry(slot);
                    RemoveOutcome::Removed
                }
            }
        }

        Target::Branch => {
            let parent_count = node.count();
            if editor.owns(node) {
                let Node::Bitmap(n) = editor.edit(node) else {
                    unreachable!()
                };
                let pos = n.cell_index(slot);
                let outcome = dissoc_recursive(
                    editor,
                    n.branch_mut_at(pos),
                    shift + node::BITS_PER_LEVEL,
                    hash,
                    key,
                );
                match outcome {
                    RemoveOutcome::NotFound => RemoveOutcome::NotFound,
                    RemoveOutcome::Removed => {
                        n.count -= 1;
                        RemoveOutcome::Removed
                    }
                    RemoveOutcome::Collapsed(k, v) => {
                        if parent_count == 2 {
                            // This node would shrink to one entry as well;
                            // keep handing the survivor upward.
                            return RemoveOutcome::Collapsed(k, v);
                        }
                        n.demote_branch(slot, k, v);
                        RemoveOutcome::Removed
                    }
                    RemoveOutcome::Emptied => {
                        unreachable!("child subtrees hold at least two entries")
                    }
                }
            } else {
                let mut child = {
                    let Node::Bitmap(n) = node.as_ref() else {
                        unreachable!()
                    };
                    NodeRef::clone(n.branch_at(n.cell_index(slot)))
                };
                match dissoc_recursive(editor, &mut child, shift + node::BITS_PER_LEVEL, hash, key)
                {
                    RemoveOutcome::NotFound => RemoveOutcome::NotFound,
                    RemoveOutcome::Removed => {
                        let Node::Bitmap(n) = editor.edit(node) else {
                            unreachable!()
                        };
                        n.set_branch(slot, child);
                        n.count -= 1;
                        RemoveOutcome::Removed
                    }
                    RemoveOutcome::Collapsed(k, v) => {
                        if parent_count == 2 {
                            return RemoveOutcome::Collapsed(k, v);
                        }
                        let Node::Bitmap(n) = editor.edit(node) else {
                            unreachable!()
                        };
                        n.demote_branch(slot, k, v);
                        RemoveOutcome::Removed
                    }
                    RemoveOutcome::Emptied => {
                        unreachable!("child subtrees hold at least two entries")
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Collision node remove
// ---------------------------------------------------------------------------

fn dissoc_collision<K, V>(
    editor: &Editor,
    node: &mut NodeRef<K, V>,
    hash: u32,
    key: &K,
) -> RemoveOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone,
{
    enum Hit<K, V> {
        Miss,
        Collapse(K, V),
        Remove(usize),
    }
    let hit = {
        let Node::Collision(c) = node.as_ref() else {
            unreachable!()
        };
        if c.hash != hash {
            Hit::Miss
        } else {
            match c.entries.iter().position(|(k, _)| k == key) {
                None => Hit::Miss,
                Some(i) if c.entries.len() == 2 => {
                    let (k, v) = &c.entries[1 - i];
                    Hit::Collapse(k.clone(), v.clone())
                }
                Some(i) => Hit::Remove(i),
            }
        }
    };
    match hit {
        Hit::Miss => RemoveOutcome::NotFound,
        Hit::Collapse(k, v) => RemoveOutcome::Collapsed(k, v),
        Hit::Remove(i) => {
            let Node::Collision(c) = editor.edit(node) else {
                unreachable!()
            };
            c.entries.swap_remove(i);
            RemoveOutcome::Removed
        }
    }
}
