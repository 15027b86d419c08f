use alloc::vec::Vec;

use crate::error::HamtError;
use crate::key::HashableKey;
use crate::leaf::Leaf;
use crate::table::Node;
use crate::table::insert_occupied;
use crate::trie::Shape;

/// The depth-0 table: `2^t` directly indexed slots.
///
/// Unlike interior tables the root is not compacted, since it is allocated
/// once and is almost always densely populated.
#[derive(Clone, Debug)]
pub(crate) struct Root<K, V> {
    slots: Vec<Option<Node<K, V>>>,
}

impl<K, V> Root<K, V> {
    pub(crate) fn new(shape: &Shape) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(shape.root_slot_count(), || None);
        Self { slots }
    }

    pub(crate) fn slots(&self) -> &[Option<Node<K, V>>] {
        &self.slots
    }

    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    pub(crate) fn leaf_count(&self) -> usize {
        self.slots.iter().flatten().map(Node::leaf_count).sum()
    }

    /// Tables in the trie, the root included.
    pub(crate) fn table_count(&self) -> usize {
        1 + self.slots.iter().flatten().map(Node::table_count).sum::<usize>()
    }
}

impl<K: HashableKey, V> Root<K, V> {
    #[inline(always)]
    fn slot_index(hc: u64, shape: &Shape) -> usize {
        (hc & shape.root_mask()) as usize
    }

    /// `hc` is the key's unshifted hash.
    pub(crate) fn find(
        &self,
        hc: u64,
        eq: &impl Fn(&K) -> bool,
        shape: &Shape,
    ) -> Result<&V, HamtError> {
        match &self.slots[Self::slot_index(hc, shape)] {
            None => Err(HamtError::NotFound),
            Some(Node::Leaf(leaf)) if eq(leaf.key()) => Ok(leaf.value()),
            Some(Node::Leaf(_)) => Err(HamtError::NotFound),
            Some(Node::Table(child)) => child.find(hc >> shape.t(), eq, shape),
        }
    }

    pub(crate) fn find_mut(
        &mut self,
        hc: u64,
        eq: &impl Fn(&K) -> bool,
        shape: &Shape,
    ) -> Result<&mut V, HamtError> {
        match &mut self.slots[Self::slot_index(hc, shape)] {
            None => Err(HamtError::NotFound),
            Some(Node::Leaf(leaf)) if eq(leaf.key()) => Ok(leaf.value_mut()),
            Some(Node::Leaf(_)) => Err(HamtError::NotFound),
            Some(Node::Table(child)) => child.find_mut(hc >> shape.t(), eq, shape),
        }
    }

    pub(crate) fn insert(
        &mut self,
        hc: u64,
        leaf: Leaf<K, V>,
        shape: &Shape,
    ) -> Result<Option<V>, HamtError> {
        let slot = &mut self.slots[Self::slot_index(hc, shape)];
        if let Some(node) = slot.as_mut() {
            return insert_occupied(node, 0, hc, leaf, shape);
        }

        *slot = Some(Node::Leaf(leaf));
        Ok(None)
    }

    pub(crate) fn delete(
        &mut self,
        hc: u64,
        eq: &impl Fn(&K) -> bool,
        shape: &Shape,
    ) -> Result<V, HamtError> {
        let slot = &mut self.slots[Self::slot_index(hc, shape)];
        let matched = match &mut *slot {
            None => return Err(HamtError::NotFound),
            Some(Node::Table(child)) => return child.delete(hc >> shape.t(), eq, shape),
            Some(Node::Leaf(leaf)) => eq(leaf.key()),
        };
        if !matched {
            return Err(HamtError::NotFound);
        }

        slot.take()
            .and_then(Node::into_value)
            .ok_or(HamtError::DeleteFromEmptyTable)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self, shape: &Shape) {
        assert_eq!(self.slots.len(), shape.root_slot_count());
        for (ndx, node) in self.slots.iter().enumerate() {
            let Some(node) = node else { continue };
            node.for_each_leaf(&mut |leaf| {
                assert_eq!(
                    Self::slot_index(leaf.hash_code(), shape),
                    ndx,
                    "leaf filed under the wrong root slot"
                );
            });
            if let Node::Table(child) = node {
                assert_eq!(child.depth(), 1);
                child.check_invariants(shape);
            }
        }
    }
}
