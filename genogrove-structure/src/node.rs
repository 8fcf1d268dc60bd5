use genogrove_core::KeyType;

use crate::errors::{GroveError, Result};
use crate::key_storage::KeyId;

/// Handle to a node inside one [`IndexTree`](crate::tree::IndexTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A key reference held by a node.
///
/// Leaf slots point at a stored key and cache its value. Separator slots in internal nodes
/// are synthetic and point at nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot<K> {
    pub value: K,
    pub key: Option<KeyId>,
}

impl<K> Slot<K> {
    pub fn leaf(value: K, key: KeyId) -> Self {
        Self {
            value,
            key: Some(key),
        }
    }

    pub fn separator(value: K) -> Self {
        Self { value, key: None }
    }
}

///
/// A fixed-capacity B+ tree node.
///
/// Leaves hold data keys and a link to the next leaf. Internal nodes hold one separator per
/// child except the last, each the aggregate of everything below that child, and a fence
/// with the largest key below that child. Splitting is left to the tree.
///
#[derive(Debug, Clone)]
pub struct Node<K> {
    pub(crate) order: usize,
    pub(crate) keys: Vec<Slot<K>>,
    pub(crate) fences: Vec<K>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) is_leaf: bool,
}

impl<K: KeyType> Node<K> {
    pub fn new(order: usize, is_leaf: bool) -> Self {
        Self {
            order,
            keys: Vec::new(),
            fences: Vec::new(),
            children: Vec::new(),
            parent: None,
            next: None,
            is_leaf,
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    pub fn keys(&self) -> &[Slot<K>] {
        &self.keys
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// True once the node holds `order` keys and has to be split.
    pub fn overflows(&self) -> bool {
        self.keys.len() >= self.order
    }

    /// Insert `slot` at its sorted position, after any equal keys. Returns the position.
    pub fn insert_key_ref(&mut self, slot: Slot<K>) -> usize {
        let pos = self.keys.partition_point(|s| s.value <= slot.value);
        self.keys.insert(pos, slot);
        pos
    }

    /// Aggregate over this node's own key values.
    pub fn calc_separator(&self) -> K {
        let values: Vec<K> = self.keys.iter().map(|s| s.value.clone()).collect();
        K::aggregate(&values)
    }

    pub fn add_child(&mut self, child: NodeId, index: usize) -> Result<()> {
        if index > self.children.len() {
            return Err(GroveError::ChildOutOfRange {
                index,
                len: self.children.len(),
            });
        }
        self.children.insert(index, child);
        Ok(())
    }

    pub fn get_child(&self, index: usize) -> Result<NodeId> {
        self.children
            .get(index)
            .copied()
            .ok_or(GroveError::ChildOutOfRange {
                index,
                len: self.children.len(),
            })
    }

    /// Position of `child` among this node's children.
    pub fn child_position(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    pub fn first_value(&self) -> Option<&K> {
        self.keys.first().map(|s| &s.value)
    }

    pub fn last_value(&self) -> Option<&K> {
        self.keys.last().map(|s| &s.value)
    }
}
