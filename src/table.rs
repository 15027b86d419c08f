//! Interior tables: a 64-bit occupancy bitmap over `2^w` logical slots plus a
//! packed array holding only the occupied ones.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::mem;

use crate::bits::flag;
use crate::bits::physical_index;
#[cfg(test)]
use crate::bits::popcount;
use crate::error::HamtError;
use crate::key::HashableKey;
use crate::leaf::Leaf;
use crate::trie::Shape;

/// Occupant of a logical slot.
#[derive(Clone, Debug)]
pub(crate) enum Node<K, V> {
    Leaf(Leaf<K, V>),
    Table(Box<Table<K, V>>),
}

impl<K, V> Node<K, V> {
    /// Value of a leaf node, `None` for a table.
    pub(crate) fn into_value(self) -> Option<V> {
        match self {
            Node::Leaf(leaf) => Some(leaf.into_value()),
            Node::Table(_) => None,
        }
    }

    pub(crate) fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Table(table) => table.leaf_count(),
        }
    }

    pub(crate) fn table_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Table(table) => table.table_count(),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_each_leaf(&self, f: &mut impl FnMut(&Leaf<K, V>)) {
        match self {
            Node::Leaf(leaf) => f(leaf),
            Node::Table(table) => table.slots.iter().for_each(|node| node.for_each_leaf(f)),
        }
    }
}

/// A non-root table at `depth >= 1`.
///
/// `slots.len() == popcount(bitmap)` and `slots` is ordered by ascending
/// logical index.
#[derive(Clone, Debug)]
pub(crate) struct Table<K, V> {
    bitmap: u64,
    slots: Vec<Node<K, V>>,
    depth: usize,
}

impl<K, V> Table<K, V> {
    pub(crate) fn new(depth: usize) -> Self {
        debug_assert!(depth >= 1);
        Self {
            bitmap: 0,
            slots: Vec::new(),
            depth,
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn slots(&self) -> &[Node<K, V>] {
        &self.slots
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn leaf_count(&self) -> usize {
        self.slots.iter().map(Node::leaf_count).sum()
    }

    /// Tables in this subtree, this one included.
    pub(crate) fn table_count(&self) -> usize {
        1 + self.slots.iter().map(Node::table_count).sum::<usize>()
    }

    #[inline(always)]
    fn locate(&self, hc: u64, shape: &Shape) -> (u64, usize) {
        let flag = flag((hc & shape.table_mask()) as usize);
        (flag, physical_index(self.bitmap, flag))
    }

    /// Removes the leaf in physical slot `pos`, clearing `flag`.
    fn remove_leaf(&mut self, flag: u64, pos: usize) -> Result<V, HamtError> {
        if self.slots.is_empty() || pos >= self.slots.len() {
            return Err(HamtError::DeleteFromEmptyTable);
        }
        debug_assert!(self.bitmap & flag != 0);
        self.bitmap &= !flag;
        self.slots
            .remove(pos)
            .into_value()
            .ok_or(HamtError::DeleteFromEmptyTable)
    }
}

impl<K: HashableKey, V> Table<K, V> {
    /// Looks up the leaf matching `eq`. `hc` is already shifted so that its low
    /// `w` bits address this table.
    pub(crate) fn find(
        &self,
        hc: u64,
        eq: &impl Fn(&K) -> bool,
        shape: &Shape,
    ) -> Result<&V, HamtError> {
        let (flag, pos) = self.locate(hc, shape);
        if self.bitmap & flag == 0 {
            return Err(HamtError::NotFound);
        }

        match &self.slots[pos] {
            Node::Leaf(leaf) if eq(leaf.key()) => Ok(leaf.value()),
            Node::Leaf(_) => Err(HamtError::NotFound),
            Node::Table(child) => child.find(hc >> shape.w(), eq, shape),
        }
    }

    pub(crate) fn find_mut(
        &mut self,
        hc: u64,
        eq: &impl Fn(&K) -> bool,
        shape: &Shape,
    ) -> Result<&mut V, HamtError> {
        let (flag, pos) = self.locate(hc, shape);
        if self.bitmap & flag == 0 {
            return Err(HamtError::NotFound);
        }

        match &mut self.slots[pos] {
            Node::Leaf(leaf) if eq(leaf.key()) => Ok(leaf.value_mut()),
            Node::Leaf(_) => Err(HamtError::NotFound),
            Node::Table(child) => child.find_mut(hc >> shape.w(), eq, shape),
        }
    }

    /// Inserts `leaf`, returning the value it replaced if its key was already
    /// present.
    pub(crate) fn insert(
        &mut self,
        hc: u64,
        leaf: Leaf<K, V>,
        shape: &Shape,
    ) -> Result<Option<V>, HamtError> {
        let (flag, pos) = self.locate(hc, shape);
        if self.bitmap & flag == 0 {
            self.slots.insert(pos, Node::Leaf(leaf));
            self.bitmap |= flag;
            return Ok(None);
        }

        insert_occupied(&mut self.slots[pos], self.depth, hc, leaf, shape)
    }

    /// Removes the leaf matching `eq`, returning its value.
    ///
    /// A child table emptied by the removal stays in place.
    pub(crate) fn delete(
        &mut self,
        hc: u64,
        eq: &impl Fn(&K) -> bool,
        shape: &Shape,
    ) -> Result<V, HamtError> {
        let (flag, pos) = self.locate(hc, shape);
        if self.bitmap & flag == 0 {
            return Err(HamtError::NotFound);
        }

        let matched = match &mut self.slots[pos] {
            Node::Table(child) => {
                let value = child.delete(hc >> shape.w(), eq, shape)?;
                if child.is_empty() {
                    log::trace!("table at depth {} left empty", child.depth());
                }
                return Ok(value);
            }
            Node::Leaf(leaf) => eq(leaf.key()),
        };
        if !matched {
            return Err(HamtError::NotFound);
        }

        self.remove_leaf(flag, pos)
    }

    /// Panics unless the bitmap, slot order, depths and hash placement of this
    /// subtree are consistent.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self, shape: &Shape) {
        assert_eq!(
            self.slots.len(),
            popcount(self.bitmap),
            "slot count disagrees with bitmap at depth {}",
            self.depth
        );

        let shift = shape.shift(self.depth);
        let mut expected_pos = 0;
        for ndx in 0..64 {
            let flag = flag(ndx);
            if self.bitmap & flag == 0 {
                continue;
            }

            let pos = physical_index(self.bitmap, flag);
            assert_eq!(pos, expected_pos, "logical slot {ndx} out of order");
            expected_pos += 1;

            let node = &self.slots[pos];
            node.for_each_leaf(&mut |leaf| {
                let leaf_ndx = ((leaf.hash_code() >> shift) & shape.table_mask()) as usize;
                assert_eq!(
                    leaf_ndx, ndx,
                    "leaf filed under the wrong slot at depth {}",
                    self.depth
                );
            });

            if let Node::Table(child) = node {
                assert_eq!(child.depth, self.depth + 1);
                assert!(child.depth <= shape.max_depth());
                child.check_invariants(shape);
            }
        }
        assert_eq!(expected_pos, self.slots.len());
    }
}

/// Inserts `leaf` into the occupied `slot` of a table at `depth`.
///
/// A matching leaf has its value replaced. A different leaf is split into a new
/// child table at `depth + 1` holding both; the split is refused before
/// anything is modified if the two keys agree on every remaining hash bit.
pub(crate) fn insert_occupied<K: HashableKey, V>(
    slot: &mut Node<K, V>,
    depth: usize,
    hc: u64,
    leaf: Leaf<K, V>,
    shape: &Shape,
) -> Result<Option<V>, HamtError> {
    let step = shape.width_at(depth);
    let existing_hc = match &mut *slot {
        Node::Table(child) => return child.insert(hc >> step, leaf, shape),
        Node::Leaf(existing) if existing.key().key_eq(leaf.key()) => {
            return Ok(Some(existing.replace_value(leaf.into_value())));
        }
        Node::Leaf(existing) => existing.hash_code(),
    };

    let child_depth = depth + 1;
    if child_depth > shape.max_depth() || existing_hc >> shape.shift(depth) == hc {
        log::debug!(
            "hash bits exhausted splitting at depth {depth}: {existing_hc:#018x} collides with new key"
        );
        return Err(HamtError::MaxTableDepthExceeded {
            depth: child_depth,
            max: shape.max_depth(),
        });
    }

    log::trace!("splitting leaf into new table at depth {child_depth}");
    let mut child = Table::new(child_depth);
    child.insert(hc >> step, leaf, shape)?;

    let displaced = mem::replace(slot, Node::Table(Box::new(child)));
    if let (Node::Table(child), Node::Leaf(existing)) = (slot, displaced) {
        // recomputed from the key rather than derived from the incoming `hc`
        child.insert(existing_hc >> shape.shift(child_depth), existing, shape)?;
    }
    Ok(None)
}
