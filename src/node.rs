//! HAMT node layout and bitmap helpers.

use std::fmt;
use std::sync::Arc;

/// Bits per trie level (5 → 32-way branching).
pub const BITS_PER_LEVEL: u32 = 5;

/// Maximum bit-shift value (depth 7, the last level uses 2 hash bits).
pub const MAX_SHIFT: u32 = 30;

/// Two-bit slot code: slot is empty.
pub const SLOT_EMPTY: u64 = 0b00;

/// Two-bit slot code: slot holds a child branch (one cell).
pub const SLOT_BRANCH: u64 = 0b01;

/// Two-bit slot code: slot holds an inline key/value entry (two cells).
///
/// The remaining code `10` is reserved.
pub const SLOT_ENTRY: u64 = 0b11;

/// Shared reference to a trie node.
pub type NodeRef<K, V> = Arc<Node<K, V>>;

// ---------------------------------------------------------------------------
// Bitmap helpers
// ---------------------------------------------------------------------------

/// Extracts the 5-bit hash slice addressing a slot at the given bit-shift.
#[inline]
#[must_use]
pub const fn slot(hash: u32, shift: u32) -> u32 {
    (hash >> shift) & 0x1F
}

/// Returns the two-bit state code of `slot` within `bitmap`.
#[inline]
#[must_use]
pub const fn slot_bits(bitmap: u64, slot: u32) -> u64 {
    (bitmap >> (2 * slot)) & 3
}

/// Returns the packed-array cell index for `slot`.
///
/// Counts the occupied cells below the slot: every set bit is one cell,
/// since a branch sets one bit and an inline entry sets two.
#[inline]
#[must_use]
pub const fn cell_index(bitmap: u64, slot: u32) -> usize {
    (bitmap & ((1u64 << (2 * slot)) - 1)).count_ones() as usize
}

// ---------------------------------------------------------------------------
// Node types
// ---------------------------------------------------------------------------

/// One cell of a [`BitmapNode`]'s packed array.
///
/// The node's bitmap determines which variant occupies each position: a
/// branch slot contributes one `Branch` cell, an inline entry a `Key` cell
/// followed by a `Value` cell.
#[derive(Clone)]
pub enum Cell<K, V> {
    /// Pointer to a child node.
    Branch(NodeRef<K, V>),
    /// Key of an inline entry.
    Key(K),
    /// Value of an inline entry.
    Value(V),
}

/// HAMT trie node.
pub enum Node<K, V> {
    /// Bitmap-compressed interior node.
    Bitmap(BitmapNode<K, V>),
    /// Linear node for keys sharing one full 32-bit hash.
    Collision(CollisionNode<K, V>),
}

/// Interior node addressing up to 32 slots by a 5-bit hash slice.
///
/// Invariant: every non-root bitmap node holds at least two entries in its
/// subtree; `count` equals the sum of child counts plus inline entries.
pub struct BitmapNode<K, V> {
    /// Total number of entries in this subtree.
    pub count: usize,
    /// Two bits per slot: `00` empty, `01` branch, `11` inline entry.
    pub bitmap: u64,
    /// Occupied cells, packed by ascending slot index.
    pub cells: Vec<Cell<K, V>>,
    /// Editor token allowed to mutate this node in place (0 = frozen).
    pub edit: u64,
}

/// Flat node for entries whose full 32-bit hashes are identical.
///
/// Invariant: holds at least two entries; singletons collapse into the
/// parent as inline entries.
pub struct CollisionNode<K, V> {
    /// The hash shared by every entry.
    pub hash: u32,
    /// The key/value pairs, scanned linearly.
    pub entries: Vec<(K, V)>,
    /// Editor token allowed to mutate this node in place (0 = frozen).
    pub edit: u64,
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl<K, V> Node<K, V> {
    /// Returns the number of entries in this subtree.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Bitmap(node) => node.count,
            Self::Collision(node) => node.entries.len(),
        }
    }

    /// Returns the editor token this node is tagged with (0 = frozen).
    #[must_use]
    pub fn edit(&self) -> u64 {
        match self {
            Self::Bitmap(node) => node.edit,
            Self::Collision(node) => node.edit,
        }
    }
}

impl<K, V> BitmapNode<K, V> {
    /// Returns the packed cell index for `slot`.
    #[must_use]
    pub fn cell_index(&self, slot: u32) -> usize {
        cell_index(self.bitmap, slot)
    }

    /// Returns the child node stored at cell `pos`.
    ///
    /// # Panics
    ///
    /// Panics if the bitmap does not mark a branch there.
    #[must_use]
    pub fn branch_at(&self, pos: usize) -> &NodeRef<K, V> {
        match &self.cells[pos] {
            Cell::Branch(node) => node,
            _ => unreachable!("bitmap marks a branch cell"),
        }
    }

    pub(crate) fn branch_mut_at(&mut self, pos: usize) -> &mut NodeRef<K, V> {
        match &mut self.cells[pos] {
            Cell::Branch(node) => node,
            _ => unreachable!("bitmap marks a branch cell"),
        }
    }

    /// Returns the inline entry whose key cell sits at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if the bitmap does not mark an inline entry there.
    #[must_use]
    pub fn entry_at(&self, pos: usize) -> (&K, &V) {
        match (&self.cells[pos], &self.cells[pos + 1]) {
            (Cell::Key(key), Cell::Value(value)) => (key, value),
            _ => unreachable!("bitmap marks an inline entry"),
        }
    }

    /// Returns the slot of the only inline entry other than `except`.
    ///
    /// Valid only while the node holds exactly two inline entries and no
    /// branches, the shape a collapse starts from.
    pub(crate) fn other_entry_slot(&self, except: u32) -> u32 {
        let rest = self.bitmap & !(SLOT_ENTRY << (2 * except));
        rest.trailing_zeros() / 2
    }

    // -----------------------------------------------------------------------
    // Cell surgery — callers hold an editor-granted mutable view
    // -----------------------------------------------------------------------

    /// Installs a fresh inline entry in an empty slot (`00` → `11`).
    pub(crate) fn insert_entry(&mut self, slot: u32, key: K, value: V) {
        let pos = self.cell_index(slot);
        self.cells
            .splice(pos..pos, [Cell::Key(key), Cell::Value(value)]);
        self.bitmap |= SLOT_ENTRY << (2 * slot);
        self.count += 1;
    }

    /// Removes an inline entry (`11` → `00`).
    pub(crate) fn remove_entry(&mut self, slot: u32) {
        let pos = self.cell_index(slot);
        self.cells.drain(pos..pos + 2);
        self.bitmap &= !(SLOT_ENTRY << (2 * slot));
        self.count -= 1;
    }

    /// Replaces the value of the inline entry at `slot`.
    pub(crate) fn set_value(&mut self, slot: u32, value: V) {
        let pos = self.cell_index(slot);
        self.cells[pos + 1] = Cell::Value(value);
    }

    /// Replaces the child pointer at `slot`.
    pub(crate) fn set_branch(&mut self, slot: u32, child: NodeRef<K, V>) {
        let pos = self.cell_index(slot);
        self.cells[pos] = Cell::Branch(child);
    }

    /// Turns an inline entry into a branch holding it plus a new entry
    /// (`11` → `01`, two cells replaced by one, count grows by one).
    pub(crate) fn promote_entry(&mut self, slot: u32, child: NodeRef<K, V>) {
        let pos = self.cell_index(slot);
        self.cells.splice(pos..pos + 2, [Cell::Branch(child)]);
        self.bitmap ^= 0b10 << (2 * slot);
        self.count += 1;
    }

    /// Turns a branch into an inline entry, its collapsed survivor
    /// (`01` → `11`, one cell replaced by two, count shrinks by one).
    pub(crate) fn demote_branch(&mut self, slot: u32, key: K, value: V) {
        let pos = self.cell_index(slot);
        self.cells
            .splice(pos..pos + 1, [Cell::Key(key), Cell::Value(value)]);
        self.bitmap |= 0b10 << (2 * slot);
        self.count -= 1;
    }
}

// ---------------------------------------------------------------------------
// Debug — no K/V bounds, structure only
// ---------------------------------------------------------------------------

impl<K, V> fmt::Debug for Node<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitmap(node) => f
                .debug_struct("Bitmap")
                .field("count", &node.count)
                .field("bitmap", &format_args!("{:#066b}", node.bitmap))
                .finish_non_exhaustive(),
            Self::Collision(node) => f
                .debug_struct("Collision")
                .field("hash", &format_args!("{:#010x}", node.hash))
                .field("len", &node.entries.len())
                .finish_non_exhaustive(),
        }
    }
}
