//! Node editors — persistent copy-on-write vs transient in-place mutation.
//!
//! Every mutating trie operation routes node access through an [`Editor`],
//! so the algorithms in [`ops`](crate::ops) are written once and stay
//! oblivious to which mode they run in.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::node::{BitmapNode, Cell, CollisionNode, Node, NodeRef};

/// Spare cells reserved when the transient editor copies a bitmap node,
/// so that later in-place insertions rarely reallocate.
const BITMAP_SLACK: usize = 8;

/// Spare pairs reserved when the transient editor copies a collision node.
const COLLISION_SLACK: usize = 2;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Allocates a fresh process-unique editor token.
pub(crate) fn next_token() -> u64 {
    NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)
}

/// Strategy deciding whether a node mutation may happen in place.
pub(crate) enum Editor {
    /// Every mutation copies; results carry token 0 and are frozen.
    Persistent,
    /// Mutates nodes tagged with the held token in place; copies anything
    /// else into a token-tagged node with growth slack.
    Transient(u64),
}

impl Editor {
    fn token(&self) -> u64 {
        match self {
            Self::Persistent => 0,
            Self::Transient(token) => *token,
        }
    }

    /// `true` if this editor may mutate `node` where it stands.
    pub(crate) fn owns<K, V>(&self, node: &Node<K, V>) -> bool {
        match *self {
            Self::Persistent => false,
            Self::Transient(token) => node.edit() == token,
        }
    }

    /// Returns a mutable view of `node`, replacing it with a copy first
    /// unless this editor owns it.
    pub(crate) fn edit<'a, K: Clone, V: Clone>(
        &self,
        node: &'a mut NodeRef<K, V>,
    ) -> &'a mut Node<K, V> {
        let in_place = self.owns(node) && Arc::get_mut(node).is_some();
        if !in_place {
            *node = Arc::new(self.copied(node));
        }
        Arc::get_mut(node).expect("node is uniquely owned after copy")
    }

    fn copied<K: Clone, V: Clone>(&self, node: &Node<K, V>) -> Node<K, V> {
        let token = self.token();
        let (bitmap_slack, collision_slack) = match self {
            Self::Persistent => (0, 0),
            Self::Transient(_) => (BITMAP_SLACK, COLLISION_SLACK),
        };
        match node {
            Node::Bitmap(source) => {
                let mut cells = Vec::with_capacity(source.cells.len() + bitmap_slack);
                cells.extend(source.cells.iter().cloned());
                Node::Bitmap(BitmapNode {
                    count: source.count,
                    bitmap: source.bitmap,
                    cells,
                    edit: token,
                })
            }
            Node::Collision(source) => {
                let mut entries = Vec::with_capacity(source.entries.len() + collision_slack);
                entries.extend(source.entries.iter().cloned());
                Node::Collision(CollisionNode {
                    hash: source.hash,
                    entries,
                    edit: token,
                })
            }
        }
    }

    /// Builds a fresh bitmap node owned by this editor.
    pub(crate) fn new_bitmap<K, V>(
        &self,
        count: usize,
        bitmap: u64,
        cells: Vec<Cell<K, V>>,
    ) -> NodeRef<K, V> {
        Arc::new(Node::Bitmap(BitmapNode {
            count,
            bitmap,
            cells,
            edit: self.token(),
        }))
    }

    /// Builds a fresh collision node owned by this editor.
    pub(crate) fn new_collision<K, V>(&self, hash: u32, entries: Vec<(K, V)>) -> NodeRef<K, V> {
        Arc::new(Node::Collision(CollisionNode {
            hash,
            entries,
            edit: self.token(),
        }))
    }
}
