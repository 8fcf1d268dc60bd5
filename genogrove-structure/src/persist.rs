//! Binary layout of a grove.
//!
//! All integers are little endian. The layout is the order (`u32`), the number of indices
//! (`u64`), then per index in name order its name (`u64` length and bytes) and its root
//! node, and finally the external keys (`u64` count, then each key).
//!
//! A node is written as a leaf flag (`u8`) and a key count (`u64`) followed by its keys.
//! Leaf keys carry their data behind a presence byte; separators are written bare. Internal
//! nodes then write their child count (`u64`) and every child in order.
//!
//! Parent links, the leaf chain and the rightmost leaf are rebuilt on load. The graph
//! overlay is not persisted.
use std::io::{Read, Write};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use genogrove_core::codec::{read_len, write_len};
use genogrove_core::{BinaryCodec, Key, KeyType};
use log::debug;
use parking_lot::RwLock;

use crate::config::BulkSortedness;
use crate::errors::{GroveError, Result};
use crate::grove::{Grove, SharedTree};
use crate::key_storage::KeyId;
use crate::node::{Node, NodeId, Slot};
use crate::tree::IndexTree;

/// Nesting limit when reading nodes.
const MAX_DEPTH: usize = 128;

/// Largest order that is written or read back.
pub const MAX_PERSISTED_ORDER: usize = 1 << 16;

impl<K, D, E> Grove<K, D, E>
where
    K: KeyType + BinaryCodec,
    D: BinaryCodec,
{
    /// Write the trees and external keys of this grove to `writer`.
    ///
    /// Groves with an order above [`MAX_PERSISTED_ORDER`] fail with
    /// [`GroveError::InvalidOrder`].
    pub fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.order > MAX_PERSISTED_ORDER {
            return Err(GroveError::InvalidOrder(self.order));
        }
        writer.write_u32::<LittleEndian>(self.order as u32)?;

        let mut trees: Vec<(String, SharedTree<K>)> = self
            .indices
            .read()
            .iter()
            .map(|(name, tree)| (name.clone(), Arc::clone(tree)))
            .collect();
        trees.sort_by(|a, b| a.0.cmp(&b.0));

        write_len(writer, trees.len())?;
        for (name, tree) in &trees {
            name.encode(writer)?;
            let tree = tree.read();
            self.write_node(&tree, tree.root(), writer)?;
        }

        let external = self.external_keys.lock().clone();
        write_len(writer, external.len())?;
        for id in external {
            self.write_key(id, writer)?;
        }
        debug!("Serialized grove with {} indices", trees.len());
        Ok(())
    }

    fn write_node<W: Write>(&self, tree: &IndexTree<K>, id: NodeId, writer: &mut W) -> Result<()> {
        let node = tree.node(id)?;
        node.is_leaf().encode(writer)?;
        write_len(writer, node.len())?;
        for slot in node.keys() {
            match (node.is_leaf(), slot.key) {
                (true, Some(key)) => self.write_key(key, writer)?,
                (true, None) => {
                    return Err(GroveError::InvariantViolation(format!(
                        "leaf {} holds a separator",
                        id.index()
                    )));
                }
                (false, _) => slot.value.encode(writer)?,
            }
        }
        if !node.is_leaf() {
            write_len(writer, node.children().len())?;
            for &child in node.children() {
                self.write_node(tree, child, writer)?;
            }
        }
        Ok(())
    }

    fn write_key<W: Write>(&self, id: KeyId, writer: &mut W) -> Result<()> {
        let key = self.storage.get(id).ok_or(GroveError::ForeignKey(id))?;
        key.encode(writer)?;
        Ok(())
    }

    /// Read a grove written by [`Grove::serialize`]. Every loaded index is validated.
    pub fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let order = reader.read_u32::<LittleEndian>()? as usize;
        if !(2..=MAX_PERSISTED_ORDER).contains(&order) {
            return Err(GroveError::Corrupted(format!("invalid order {order}")));
        }
        let grove = Self::build(order, BulkSortedness::default());

        let roots = read_len(reader)?;
        for _ in 0..roots {
            let name = String::decode(reader)?;
            let mut nodes = Vec::new();
            let root = grove.read_node(reader, &mut nodes, 1)?;
            let tree = IndexTree::from_parts(order, nodes, root)?;
            tree.validate()
                .map_err(|err| GroveError::Corrupted(format!("index '{name}': {err}")))?;

            let mut indices = grove.indices.write();
            if indices.contains_key(&name) {
                return Err(GroveError::Corrupted(format!("index '{name}' appears twice")));
            }
            indices.insert(name, Arc::new(RwLock::new(tree)));
        }

        let external = read_len(reader)?;
        for _ in 0..external {
            let key = Key::<K, D>::decode(reader)?;
            let id = grove.storage.allocate(key);
            grove.external_keys.lock().push(id);
        }
        debug!(
            "Deserialized grove with {} indices and {} keys",
            roots,
            grove.storage.len()
        );
        Ok(grove)
    }

    fn read_node<R: Read>(
        &self,
        reader: &mut R,
        nodes: &mut Vec<Node<K>>,
        depth: usize,
    ) -> Result<NodeId> {
        if depth > MAX_DEPTH {
            return Err(GroveError::Corrupted(format!(
                "tree deeper than {MAX_DEPTH} levels"
            )));
        }
        let is_leaf = bool::decode(reader)?;
        let count = read_len(reader)?;
        if count >= self.order {
            return Err(GroveError::Corrupted(format!(
                "node with {count} keys in a tree of order {}",
                self.order
            )));
        }

        let mut node = Node::new(self.order, is_leaf);
        for _ in 0..count {
            if is_leaf {
                let key = Key::<K, D>::decode(reader)?;
                let value = key.value().clone();
                let id = self.storage.allocate(key);
                node.keys.push(Slot::leaf(value, id));
            } else {
                node.keys.push(Slot::separator(K::decode(reader)?));
            }
        }
        let id = NodeId(nodes.len());
        nodes.push(node);

        if !is_leaf {
            let children = read_len(reader)?;
            if children > self.order {
                return Err(GroveError::Corrupted(format!(
                    "node with {children} children in a tree of order {}",
                    self.order
                )));
            }
            for _ in 0..children {
                let child = self.read_node(reader, nodes, depth + 1)?;
                nodes[id.0].children.push(child);
            }
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genogrove_core::{Interval, Numeric};

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Cursor;

    fn iv(start: u64, end: u64) -> Interval {
        Interval::new(start, end).unwrap()
    }

    #[rstest]
    fn test_empty_grove_layout() {
        let grove: Grove<Numeric> = Grove::new(4).unwrap();
        let mut buf = Vec::new();
        grove.serialize(&mut buf).unwrap();

        // order, no indices, no external keys
        assert_eq!(buf, vec![4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[rstest]
    fn test_single_leaf_layout() {
        let grove: Grove<Numeric, u8> = Grove::new(3).unwrap();
        grove.insert("a", Numeric(7), Some(9)).unwrap();
        let mut buf = Vec::new();
        grove.serialize(&mut buf).unwrap();

        let mut expected = vec![3, 0, 0, 0];
        expected.extend(1u64.to_le_bytes());
        expected.extend(1u64.to_le_bytes());
        expected.push(b'a');
        expected.push(1);
        expected.extend(1u64.to_le_bytes());
        expected.extend(7i64.to_le_bytes());
        expected.extend([1, 9]);
        expected.extend(0u64.to_le_bytes());
        assert_eq!(buf, expected);
    }

    #[rstest]
    fn test_round_trip_keeps_queries() {
        let grove: Grove<Interval, String> = Grove::new(3).unwrap();
        for i in 0..40 {
            grove.insert_sorted("chr1", iv(i * 10, i * 10 + 15), Some(format!("r{i}"))).unwrap();
        }
        grove.insert("chr2", iv(5, 6), None).unwrap();
        grove.add_external_key(iv(1_000, 2_000), Some("enhancer".to_string()));

        let mut buf = Vec::new();
        grove.serialize(&mut buf).unwrap();
        let loaded: Grove<Interval, String> = Grove::deserialize(&mut Cursor::new(buf)).unwrap();

        assert_eq!(loaded.order(), 3);
        assert_eq!(loaded.index_names(), vec!["chr1", "chr2"]);
        assert_eq!(loaded.len("chr1"), 40);
        assert_eq!(loaded.depth("chr1").unwrap(), grove.depth("chr1").unwrap());
        assert_eq!(loaded.external_vertex_count(), 1);
        assert_eq!(loaded.vertex_count(), 42);
        loaded.validate_all().unwrap();

        let query = iv(102, 118);
        let before: Vec<Key<Interval, String>> = grove.resolve(&grove.intersect(&query).unwrap());
        let after: Vec<Key<Interval, String>> = loaded.resolve(&loaded.intersect(&query).unwrap());
        assert_eq!(after, before);

        // appends keep working after load
        loaded.insert_sorted("chr1", iv(500, 510), None).unwrap();
        loaded.validate("chr1").unwrap();
    }

    #[rstest]
    fn test_truncated_input_fails() {
        let grove: Grove<Interval, String> = Grove::new(3).unwrap();
        for i in 0..10 {
            grove.insert("chr1", iv(i, i + 1), None).unwrap();
        }
        let mut buf = Vec::new();
        grove.serialize(&mut buf).unwrap();
        buf.truncate(buf.len() / 2);

        let result: Result<Grove<Interval, String>> = Grove::deserialize(&mut Cursor::new(buf));
        assert!(matches!(result, Err(GroveError::Io(_))));
    }

    #[rstest]
    #[case(vec![1, 0, 0, 0])]
    #[case(vec![0, 0, 0, 0])]
    #[case(vec![0xff, 0xff, 0xff, 0xff, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, b'a', 1, 0, 0, 0, 0, 0, 0, 0, 0])]
    #[case(vec![1, 0, 1, 0])]
    fn test_invalid_order_is_corrupted(#[case] buf: Vec<u8>) {
        let result: Result<Grove<Numeric>> = Grove::deserialize(&mut Cursor::new(buf));
        assert!(matches!(result, Err(GroveError::Corrupted(_))));
    }

    #[rstest]
    fn test_overfull_node_is_corrupted() {
        let mut buf = vec![3, 0, 0, 0];
        buf.extend(1u64.to_le_bytes());
        buf.extend(1u64.to_le_bytes());
        buf.push(b'a');
        buf.push(1);
        buf.extend(3u64.to_le_bytes());

        let result: Result<Grove<Numeric>> = Grove::deserialize(&mut Cursor::new(buf));
        assert!(matches!(result, Err(GroveError::Corrupted(_))));
    }

    #[rstest]
    fn test_oversized_order_is_not_written() {
        let grove: Grove<Numeric> = Grove::new(MAX_PERSISTED_ORDER + 1).unwrap();
        grove.insert("a", Numeric(1), None).unwrap();
        let mut buf = Vec::new();
        let result = grove.serialize(&mut buf);
        assert!(matches!(result, Err(GroveError::InvalidOrder(_))));
        assert!(buf.is_empty());
    }

    #[rstest]
    fn test_largest_order_round_trips() {
        let grove: Grove<Numeric> = Grove::new(MAX_PERSISTED_ORDER).unwrap();
        for i in 0..100 {
            grove.insert("a", Numeric(i), None).unwrap();
        }
        let mut buf = Vec::new();
        grove.serialize(&mut buf).unwrap();
        let loaded: Grove<Numeric> = Grove::deserialize(&mut Cursor::new(buf)).unwrap();
        assert_eq!(loaded.order(), MAX_PERSISTED_ORDER);
        assert_eq!(loaded.len("a"), 100);
    }

    #[rstest]
    fn test_index_name_length_past_the_input() {
        let mut buf = vec![3, 0, 0, 0];
        buf.extend(1u64.to_le_bytes());
        buf.extend((u64::MAX / 2).to_le_bytes());
        buf.extend(b"chr1");

        let result: Result<Grove<Interval>> = Grove::deserialize(&mut Cursor::new(buf));
        assert!(matches!(result, Err(GroveError::Io(_))));
    }
}
