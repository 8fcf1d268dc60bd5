use std::collections::VecDeque;
use std::io::Write;

use genogrove_core::KeyType;
use log::{debug, trace};

use crate::errors::{GroveError, Result};
use crate::key_storage::KeyId;
use crate::node::{Node, NodeId, Slot};
use crate::query_result::QueryResult;

///
/// The B+ tree behind one named index of a grove.
///
/// Nodes live in an arena and refer to each other by [`NodeId`]. The leaves form a chain
/// that is sorted across the whole tree, and the tree caches its rightmost leaf so sorted
/// input can be appended without a root-to-leaf descent.
///
#[derive(Debug, Clone)]
pub struct IndexTree<K> {
    order: usize,
    pub(crate) nodes: Vec<Node<K>>,
    root: NodeId,
    rightmost: NodeId,
    len: usize,
}

impl<K: KeyType> IndexTree<K> {
    /// An empty tree whose root is an empty leaf.
    pub fn new(order: usize) -> Self {
        Self {
            order,
            nodes: vec![Node::new(order, true)],
            root: NodeId(0),
            rightmost: NodeId(0),
            len: 0,
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The cached rightmost leaf.
    pub fn rightmost(&self) -> NodeId {
        self.rightmost
    }

    /// Number of data keys in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node(&self, id: NodeId) -> Result<&Node<K>> {
        self.nodes.get(id.0).ok_or(GroveError::MissingNode(id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<K>> {
        self.nodes.get_mut(id.0).ok_or(GroveError::MissingNode(id.0))
    }

    /// Number of levels, counting the leaves. A tree whose root is a leaf has depth 1.
    pub fn depth(&self) -> Result<usize> {
        let mut depth = 1;
        let mut node = self.node(self.root)?;
        while !node.is_leaf {
            node = self.node(node.get_child(0)?)?;
            depth += 1;
        }
        Ok(depth)
    }

    /// The largest key in the tree.
    pub fn max_value(&self) -> Result<Option<&K>> {
        Ok(self.node(self.rightmost)?.last_value())
    }

    /// General insertion: descend from the root to the leaf that keeps the leaf chain
    /// sorted, widening separators on the way, then split what overflowed.
    pub fn insert(&mut self, value: K, key: KeyId) -> Result<()> {
        let mut current = self.root;
        loop {
            let node = self.node_mut(current)?;
            if node.is_leaf {
                break;
            }
            let idx = node.fences.partition_point(|fence| *fence < value);
            if idx < node.keys.len() {
                let widened = K::aggregate(&[node.keys[idx].value.clone(), value.clone()]);
                node.keys[idx].value = widened;
            }
            current = node.get_child(idx)?;
        }

        self.node_mut(current)?.insert_key_ref(Slot::leaf(value, key));
        self.len += 1;
        self.rebalance(current)
    }

    /// Append a key that is not smaller than any key in the tree to the rightmost leaf.
    ///
    /// The caller checks the precondition. The rightmost leaf sits under the last child of
    /// every ancestor, which has no separator, so nothing above it needs updating.
    pub fn append(&mut self, value: K, key: KeyId) -> Result<()> {
        let leaf = self.rightmost;
        self.node_mut(leaf)?.keys.push(Slot::leaf(value, key));
        self.len += 1;
        self.rebalance(leaf)
    }

    /// Split overflowing nodes from `start` upwards until an ancestor has room, growing a
    /// new root if the old root overflows.
    fn rebalance(&mut self, start: NodeId) -> Result<()> {
        let mut current = start;
        while self.node(current)?.overflows() {
            let parent = self.node(current)?.parent;
            match parent {
                Some(parent) => {
                    let idx = self
                        .node(parent)?
                        .child_position(current)
                        .ok_or(GroveError::DetachedNode(current.0))?;
                    self.split(parent, idx)?;
                    current = parent;
                }
                None => {
                    let new_root = NodeId(self.nodes.len());
                    let mut root = Node::new(self.order, false);
                    root.add_child(current, 0)?;
                    self.nodes.push(root);
                    self.node_mut(current)?.parent = Some(new_root);
                    self.root = new_root;
                    self.split(new_root, 0)?;
                    debug!(
                        "Grew new root {} (depth {}, {} keys)",
                        new_root.0,
                        self.depth()?,
                        self.len
                    );
                    current = new_root;
                }
            }
        }
        Ok(())
    }

    /// Split the overflowing child at `child_index` of `parent` into two nodes and register
    /// the new right sibling with `parent`.
    pub fn split(&mut self, parent: NodeId, child_index: usize) -> Result<()> {
        let child = self.node(parent)?.get_child(child_index)?;
        let sibling_id = NodeId(self.nodes.len());

        let node = self.node_mut(child)?;
        if !node.overflows() {
            return Err(GroveError::InvariantViolation(format!(
                "split of node {} holding {} keys with order {}",
                child.0,
                node.keys.len(),
                node.order
            )));
        }
        let mut sibling = Node::new(node.order, node.is_leaf);
        sibling.parent = Some(parent);
        if node.is_leaf {
            let keep = node.order.div_ceil(2);
            sibling.keys = node.keys.split_off(keep);
            sibling.next = node.next;
            node.next = Some(sibling_id);
        } else {
            // children[keep - 1] becomes the last child, so its separator moves to the parent
            // ceil((order + 1) / 2) without overflowing on huge orders
            let keep = node.order / 2 + 1;
            sibling.children = node.children.split_off(keep);
            sibling.keys = node.keys.split_off(keep);
            sibling.fences = node.fences.split_off(keep);
            node.keys.truncate(keep - 1);
            node.fences.truncate(keep - 1);
        }
        let moved = sibling.children.clone();
        let moved_keys = sibling.keys.len();
        self.nodes.push(sibling);
        for grandchild in moved {
            self.node_mut(grandchild)?.parent = Some(sibling_id);
        }

        let separator = self.subtree_aggregate(child)?;
        let fence = self.subtree_max(child)?.clone();
        let parent_node = self.node_mut(parent)?;
        parent_node.keys.insert(child_index, Slot::separator(separator));
        parent_node.fences.insert(child_index, fence);
        parent_node.add_child(sibling_id, child_index + 1)?;
        let sibling_is_last = child_index + 2 == parent_node.children.len();

        // the old separator of `child` now sits in front of the sibling and still covers both
        if !sibling_is_last {
            let narrowed = self.subtree_aggregate(sibling_id)?;
            self.node_mut(parent)?.keys[child_index + 1].value = narrowed;
        }
        if self.rightmost == child {
            self.rightmost = sibling_id;
        }

        trace!(
            "Split node {} under {} at {}: {} keys moved to node {}",
            child.0, parent.0, child_index, moved_keys, sibling_id.0
        );
        Ok(())
    }

    /// Aggregate of every leaf key below `id`.
    ///
    /// The separators of `id` already cover all children but the last, so only the
    /// last-child spine has to be walked.
    fn subtree_aggregate(&self, id: NodeId) -> Result<K> {
        let mut values = Vec::new();
        let mut current = id;
        loop {
            let node = self.node(current)?;
            values.extend(node.keys.iter().map(|slot| slot.value.clone()));
            if node.is_leaf {
                break;
            }
            current = self.last_child(current, node)?;
        }
        Ok(K::aggregate(&values))
    }

    /// Largest leaf key below `id`.
    fn subtree_max(&self, id: NodeId) -> Result<&K> {
        let mut current = id;
        loop {
            let node = self.node(current)?;
            if node.is_leaf {
                return node.last_value().ok_or_else(|| {
                    GroveError::InvariantViolation(format!("leaf {} is empty", current.0))
                });
            }
            current = self.last_child(current, node)?;
        }
    }

    fn last_child(&self, id: NodeId, node: &Node<K>) -> Result<NodeId> {
        node.children.last().copied().ok_or_else(|| {
            GroveError::InvariantViolation(format!("internal node {} has no children", id.0))
        })
    }

    fn leftmost_leaf(&self) -> Result<NodeId> {
        let mut current = self.root;
        loop {
            let node = self.node(current)?;
            if node.is_leaf {
                return Ok(current);
            }
            current = node.get_child(0)?;
        }
    }

    /// Leaves in chain order, starting at the leftmost leaf.
    pub fn leaf_chain(&self) -> Result<Vec<NodeId>> {
        let mut leaves = Vec::new();
        let mut current = Some(self.leftmost_leaf()?);
        while let Some(id) = current {
            // a cycle would otherwise never end
            if leaves.len() == self.nodes.len() {
                return Err(GroveError::InvariantViolation(
                    "leaf chain does not terminate".to_string(),
                ));
            }
            leaves.push(id);
            current = self.node(id)?.next;
        }
        Ok(leaves)
    }

    /// Handles of all data keys in ascending order.
    pub fn key_ids(&self) -> Result<Vec<KeyId>> {
        let mut ids = Vec::with_capacity(self.len);
        for leaf in self.leaf_chain()? {
            ids.extend(self.node(leaf)?.keys.iter().filter_map(|slot| slot.key));
        }
        Ok(ids)
    }

    /// Collect every key overlapping `query` into `result`.
    pub fn search(&self, query: &K, result: &mut QueryResult<K>) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        self.search_iter(self.root, query, result)
    }

    fn search_iter(&self, id: NodeId, query: &K, result: &mut QueryResult<K>) -> Result<()> {
        let node = self.node(id)?;
        if node.is_leaf {
            return self.scan_leaves(id, query, result);
        }

        if let Some(first) = node.first_value() {
            if K::precedes(query, first) {
                return Ok(());
            }
        }

        let mut i = 0;
        while i < node.keys.len()
            && *query > node.keys[i].value
            && !K::overlap(&node.keys[i].value, query)
        {
            i += 1;
        }
        self.search_iter(node.get_child(i)?, query, result)
    }

    /// Scan `start` and follow the leaf chain while the next leaf can still hold matches.
    fn scan_leaves(&self, start: NodeId, query: &K, result: &mut QueryResult<K>) -> Result<()> {
        let mut current = Some(start);
        while let Some(id) = current {
            let leaf = self.node(id)?;
            result.record_leaf_visit();
            for slot in &leaf.keys {
                if K::overlap(&slot.value, query) {
                    if let Some(key) = slot.key {
                        result.add_key(key);
                    }
                }
            }

            current = match leaf.next {
                Some(next) => self
                    .node(next)?
                    .first_value()
                    .filter(|first| K::may_follow(first, query))
                    .map(|_| next),
                None => None,
            };
        }
        Ok(())
    }

    /// Check every structural invariant of the tree.
    pub fn validate(&self) -> Result<()> {
        if self.order < 2 {
            return Err(GroveError::InvalidOrder(self.order));
        }
        if self.node(self.root)?.parent.is_some() {
            return Err(violation(format!("root {} has a parent", self.root.0)));
        }

        let mut leaves = Vec::new();
        let mut leaf_depth = None;
        self.validate_node(self.root, 1, &mut leaf_depth, &mut leaves)?;

        let chain = self.leaf_chain()?;
        if chain != leaves {
            return Err(violation("leaf chain does not follow tree order".to_string()));
        }
        if leaves.last() != Some(&self.rightmost) {
            return Err(violation(format!(
                "cached rightmost leaf {} is not the last leaf",
                self.rightmost.0
            )));
        }

        let mut count = 0;
        let mut previous: Option<&K> = None;
        for leaf in chain {
            for slot in &self.node(leaf)?.keys {
                if slot.key.is_none() {
                    return Err(violation(format!("leaf {} holds a separator", leaf.0)));
                }
                if previous.is_some_and(|p| *p > slot.value) {
                    return Err(violation(format!(
                        "leaf chain out of order at {} in leaf {}",
                        slot.value, leaf.0
                    )));
                }
                previous = Some(&slot.value);
                count += 1;
            }
        }
        if count != self.len {
            return Err(violation(format!(
                "tree reports {} keys but its leaves hold {}",
                self.len, count
            )));
        }
        Ok(())
    }

    fn validate_node(
        &self,
        id: NodeId,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        leaves: &mut Vec<NodeId>,
    ) -> Result<()> {
        let node = self.node(id)?;
        if node.keys.len() > self.order - 1 {
            return Err(violation(format!(
                "node {} holds {} keys, more than {}",
                id.0,
                node.keys.len(),
                self.order - 1
            )));
        }

        if node.is_leaf {
            if !node.children.is_empty() {
                return Err(violation(format!("leaf {} has children", id.0)));
            }
            if node.keys.is_empty() && id != self.root {
                return Err(violation(format!("leaf {} is empty", id.0)));
            }
            if !node.keys.is_sorted_by(|a, b| a.value <= b.value) {
                return Err(violation(format!("keys of leaf {} are not sorted", id.0)));
            }
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(violation(format!(
                        "leaf {} at depth {}, expected {}",
                        id.0, depth, expected
                    )));
                }
                Some(_) => {}
            }
            leaves.push(id);
            return Ok(());
        }

        if node.children.len() > self.order
            || node.children.len() != node.keys.len() + 1
            || node.fences.len() != node.keys.len()
        {
            return Err(violation(format!(
                "internal node {} has {} children, {} separators and {} fences",
                id.0,
                node.children.len(),
                node.keys.len(),
                node.fences.len()
            )));
        }

        for (i, &child) in node.children.iter().enumerate() {
            if self.node(child)?.parent != Some(id) {
                return Err(violation(format!(
                    "node {} does not point back to its parent {}",
                    child.0, id.0
                )));
            }
            self.validate_node(child, depth + 1, leaf_depth, leaves)?;

            if i < node.keys.len() {
                let mut values = Vec::new();
                self.collect_values(child, &mut values)?;
                let expected = K::aggregate(&values);
                if node.keys[i].value != expected {
                    return Err(violation(format!(
                        "separator {} of node {} is {}, expected {}",
                        i, id.0, node.keys[i].value, expected
                    )));
                }
                let max = self.subtree_max(child)?;
                if node.fences[i] != *max {
                    return Err(violation(format!(
                        "fence {} of node {} is {}, expected {}",
                        i, id.0, node.fences[i], max
                    )));
                }
            }
        }
        Ok(())
    }

    fn collect_values(&self, id: NodeId, values: &mut Vec<K>) -> Result<()> {
        let node = self.node(id)?;
        if node.is_leaf {
            values.extend(node.keys.iter().map(|slot| slot.value.clone()));
            return Ok(());
        }
        for &child in &node.children {
            self.collect_values(child, values)?;
        }
        Ok(())
    }

    /// Write the tree as SIF, breadth first: a `nodelink` line per parent and child pair
    /// and a `leaflink` line per link of the leaf chain.
    pub fn write_sif<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut queue = VecDeque::from([self.root]);
        while let Some(id) = queue.pop_front() {
            let node = self.node(id)?;
            if node.is_leaf {
                if let Some(next) = node.next {
                    writeln!(
                        writer,
                        "|{}\tleaflink\t|{}",
                        sif_keys(node),
                        sif_keys(self.node(next)?)
                    )?;
                }
            } else {
                for &child in &node.children {
                    queue.push_back(child);
                    writeln!(
                        writer,
                        "|{}\tnodelink\t|{}",
                        sif_keys(node),
                        sif_keys(self.node(child)?)
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Rebuild a tree from decoded nodes. Parents, the leaf chain, fences, the rightmost
    /// cache and the key count are derived from the child lists.
    pub(crate) fn from_parts(order: usize, nodes: Vec<Node<K>>, root: NodeId) -> Result<Self> {
        let mut tree = Self {
            order,
            nodes,
            root,
            rightmost: root,
            len: 0,
        };

        // parents and leaf order, top down
        let mut leaves = Vec::new();
        let mut visited = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            visited += 1;
            if visited > tree.nodes.len() {
                return Err(GroveError::Corrupted("node referenced twice".to_string()));
            }
            let node = tree.node(id)?;
            if node.is_leaf {
                leaves.push(id);
                continue;
            }
            let children = node.children.clone();
            for &child in &children {
                tree.node_mut(child)?.parent = Some(id);
            }
            stack.extend(children.into_iter().rev());
        }
        tree.node_mut(root)?.parent = None;

        for pair in leaves.windows(2) {
            tree.node_mut(pair[0])?.next = Some(pair[1]);
        }
        if let Some(&last) = leaves.last() {
            tree.node_mut(last)?.next = None;
            tree.rightmost = last;
        }
        for &leaf in &leaves {
            tree.len += tree.node(leaf)?.keys.len();
        }

        for idx in 0..tree.nodes.len() {
            let node = &tree.nodes[idx];
            if node.is_leaf || node.children.is_empty() {
                continue;
            }
            let fenced = &node.children[..node.children.len() - 1];
            let fences = fenced
                .iter()
                .map(|&child| tree.subtree_max(child).cloned())
                .collect::<Result<Vec<K>>>()?;
            tree.nodes[idx].fences = fences;
        }
        Ok(tree)
    }
}

fn violation(message: String) -> GroveError {
    GroveError::InvariantViolation(message)
}

fn sif_keys<K: KeyType>(node: &Node<K>) -> String {
    node.keys.iter().map(|slot| format!("{}|", slot.value)).collect()
}
