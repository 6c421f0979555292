//! Lookup operation — traverses the trie to find a key.

use crate::node::{self, Node};

/// Searches for `key` in the subtree rooted at `node`.
///
/// Returns a reference to the value if found.
pub fn lookup_recursive<'a, K, V>(
    node: &'a Node<K, V>,
    hash: u32,
    key: &K,
    shift: u32,
) -> Option<&'a V>
where
    K: Eq,
{
    match node {
        Node::Bitmap(n) => {
            let slot = node::slot(hash, shift);
            match node::slot_bits(n.bitmap, slot) {
                node::SLOT_EMPTY => None,
                node::SLOT_BRANCH => {
                    let pos = n.cell_index(slot);
                    lookup_recursive(n.branch_at(pos), hash, key, shift + node::BITS_PER_LEVEL)
                }
                _ => {
                    // Inline entry.
                    let pos = n.cell_index(slot);
                    let (k, v) = n.entry_at(pos);
                    if k == key { Some(v) } else { None }
                }
            }
        }
        Node::Collision(c) => {
            if c.hash != hash {
                return None;
            }
            // Linear search through collision entries.
            c.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
        }
    }
}
