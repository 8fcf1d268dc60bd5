use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use fxhash::FxHashMap as HashMap;
use genogrove_core::{Key, KeyType};
use log::debug;
use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock};

use crate::config::{BulkSortedness, DEFAULT_ORDER, GroveConfig};
use crate::errors::{GroveError, Result};
use crate::graph_overlay::{Edge, GraphOverlay};
use crate::key_storage::{KeyId, KeyStorage};
use crate::query_result::QueryResult;
use crate::tree::IndexTree;

pub(crate) type SharedTree<K> = Arc<RwLock<IndexTree<K>>>;

///
/// A multi-index B+ tree: one independent tree per named index (for example one per
/// chromosome), all sharing a single key storage and a single graph overlay.
///
/// Every index is guarded by its own read-write lock, so different indices can be written
/// and queried in parallel. Locks are always taken in the order index map, index tree, key
/// storage. The graph overlay has its own mutex.
///
/// # Examples
///
/// ```
/// use genogrove_core::Interval;
/// use genogrove_structure::Grove;
///
/// let grove: Grove<Interval, String> = Grove::new(3).unwrap();
/// grove.insert("chr1", Interval::new(10, 30).unwrap(), Some("exon1".to_string())).unwrap();
/// grove.insert("chr1", Interval::new(20, 40).unwrap(), None).unwrap();
/// grove.insert("chr1", Interval::new(50, 60).unwrap(), None).unwrap();
///
/// let hits = grove.intersect_index(&Interval::new(25, 35).unwrap(), "chr1").unwrap();
/// assert_eq!(hits.len(), 2);
/// ```
///
#[derive(Debug)]
pub struct Grove<K, D = (), E = ()> {
    pub(crate) order: usize,
    pub(crate) bulk_sortedness: BulkSortedness,
    pub(crate) indices: RwLock<HashMap<String, SharedTree<K>>>,
    pub(crate) storage: KeyStorage<K, D>,
    pub(crate) graph: GraphOverlay<E>,
    pub(crate) external_keys: Mutex<Vec<KeyId>>,
}

impl<K: KeyType, D, E> Default for Grove<K, D, E> {
    fn default() -> Self {
        Self::build(DEFAULT_ORDER, BulkSortedness::default())
    }
}

impl<K: KeyType, D, E> Grove<K, D, E> {
    /// A grove whose nodes hold at most `order - 1` keys and `order` children.
    pub fn new(order: usize) -> Result<Self> {
        if order < 2 {
            return Err(GroveError::InvalidOrder(order));
        }
        Ok(Self::build(order, BulkSortedness::default()))
    }

    pub fn from_config(config: &GroveConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config.order, config.bulk_sortedness))
    }

    pub fn from_config_file(path: &Path) -> Result<Self> {
        let config = GroveConfig::try_from(path)?;
        Self::from_config(&config)
    }

    pub(crate) fn build(order: usize, bulk_sortedness: BulkSortedness) -> Self {
        Self {
            order,
            bulk_sortedness,
            indices: RwLock::new(HashMap::default()),
            storage: KeyStorage::new(),
            graph: GraphOverlay::new(),
            external_keys: Mutex::new(Vec::new()),
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn bulk_sortedness(&self) -> BulkSortedness {
        self.bulk_sortedness
    }

    fn tree(&self, index: &str) -> Option<SharedTree<K>> {
        self.indices.read().get(index).map(Arc::clone)
    }

    fn tree_or_create(&self, index: &str) -> SharedTree<K> {
        if let Some(tree) = self.tree(index) {
            return tree;
        }
        let mut indices = self.indices.write();
        let tree = indices.entry(index.to_string()).or_insert_with(|| {
            debug!("Creating index '{index}' with order {}", self.order);
            Arc::new(RwLock::new(IndexTree::new(self.order)))
        });
        Arc::clone(tree)
    }

    /// Create an empty index. Fails if the index already has a root.
    pub fn insert_root(&self, index: &str) -> Result<()> {
        let mut indices = self.indices.write();
        if indices.contains_key(index) {
            return Err(GroveError::RootExists(index.to_string()));
        }
        debug!("Creating index '{index}' with order {}", self.order);
        indices.insert(
            index.to_string(),
            Arc::new(RwLock::new(IndexTree::new(self.order))),
        );
        Ok(())
    }

    pub fn has_index(&self, index: &str) -> bool {
        self.indices.read().contains_key(index)
    }

    /// Names of all indices, sorted.
    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indices.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Insert a key anywhere in the order of `index`, creating the index if needed.
    pub fn insert(&self, index: &str, value: K, data: Option<D>) -> Result<KeyId> {
        let tree = self.tree_or_create(index);
        let mut tree = tree.write();
        let id = self.storage.allocate(Key::new(value.clone(), data));
        tree.insert(value, id)?;
        Ok(id)
    }

    /// Append a key that is not smaller than any key already in `index`.
    ///
    /// Skips the root-to-leaf descent. A smaller key is rejected with
    /// [`GroveError::UnsortedInsert`] and nothing is stored.
    pub fn insert_sorted(&self, index: &str, value: K, data: Option<D>) -> Result<KeyId> {
        let tree = self.tree_or_create(index);
        let mut tree = tree.write();
        if let Some(max) = tree.max_value()? {
            if value < *max {
                return Err(GroveError::UnsortedInsert {
                    index: index.to_string(),
                    key: value.to_string(),
                    max: max.to_string(),
                });
            }
        }
        let id = self.storage.allocate(Key::new(value.clone(), data));
        tree.append(value, id)?;
        Ok(id)
    }

    /// Append a batch of keys to `index` through the sorted path.
    ///
    /// The batch is checked or sorted according to `sortedness`. Like [`Grove::insert_sorted`]
    /// the keys must be non-decreasing, both within the batch and against the largest key
    /// already in the index, so equal keys are accepted in either place. A batch that breaks
    /// this is rejected as a whole with [`GroveError::UnsortedBulk`]. Returns the handles of
    /// the inserted keys in insertion order.
    pub fn insert_bulk(
        &self,
        index: &str,
        mut items: Vec<(K, Option<D>)>,
        sortedness: BulkSortedness,
    ) -> Result<Vec<KeyId>> {
        match sortedness {
            BulkSortedness::Sorted => {
                if let Some(pos) = items.windows(2).position(|pair| pair[1].0 < pair[0].0) {
                    return Err(GroveError::UnsortedBulk {
                        index: index.to_string(),
                        key: items[pos + 1].0.to_string(),
                        previous: items[pos].0.to_string(),
                    });
                }
            }
            BulkSortedness::Unsorted => items.sort_by(|a, b| a.0.cmp(&b.0)),
            BulkSortedness::Auto => {
                if !items.is_sorted_by(|a, b| a.0 <= b.0) {
                    items.sort_by(|a, b| a.0.cmp(&b.0));
                }
            }
        }
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let tree = self.tree_or_create(index);
        let mut tree = tree.write();
        if let Some(max) = tree.max_value()? {
            if items[0].0 < *max {
                return Err(GroveError::UnsortedBulk {
                    index: index.to_string(),
                    key: items[0].0.to_string(),
                    previous: max.to_string(),
                });
            }
        }

        let count = items.len();
        let values: Vec<K> = items.iter().map(|(value, _)| value.clone()).collect();
        let ids = self
            .storage
            .allocate_many(items.into_iter().map(|(value, data)| Key::new(value, data)));
        for (value, &id) in values.into_iter().zip(&ids) {
            tree.append(value, id)?;
        }
        debug!(
            "Bulk loaded {count} keys into index '{index}' (now {} keys, depth {})",
            tree.len(),
            tree.depth()?
        );
        Ok(ids)
    }

    /// [`Grove::insert_bulk`] with the grove's configured sortedness.
    pub fn insert_bulk_default(
        &self,
        index: &str,
        items: Vec<(K, Option<D>)>,
    ) -> Result<Vec<KeyId>> {
        self.insert_bulk(index, items, self.bulk_sortedness)
    }

    /// Overlap search across every index, in sorted index-name order.
    pub fn intersect(&self, query: &K) -> Result<QueryResult<K>> {
        let mut trees: Vec<(String, SharedTree<K>)> = self
            .indices
            .read()
            .iter()
            .map(|(name, tree)| (name.clone(), Arc::clone(tree)))
            .collect();
        trees.sort_by(|a, b| a.0.cmp(&b.0));

        let mut result = QueryResult::new(query.clone());
        for (_, tree) in trees {
            tree.read().search(query, &mut result)?;
        }
        Ok(result)
    }

    /// Overlap search in one index. An unknown index gives an empty result.
    pub fn intersect_index(&self, query: &K, index: &str) -> Result<QueryResult<K>> {
        let mut result = QueryResult::new(query.clone());
        if let Some(tree) = self.tree(index) {
            tree.read().search(query, &mut result)?;
        }
        Ok(result)
    }

    /// Read access to a stored key.
    ///
    /// The guard blocks insertion into this grove until it is dropped.
    pub fn key(&self, id: KeyId) -> Option<MappedRwLockReadGuard<'_, Key<K, D>>> {
        self.storage.get(id)
    }

    /// Copies of the keys matched by `result`.
    pub fn resolve(&self, result: &QueryResult<K>) -> Vec<Key<K, D>>
    where
        D: Clone,
    {
        self.storage.with_keys(result.keys(), |keys| {
            keys.iter().flatten().map(|key| (*key).clone()).collect()
        })
    }

    /// Store a key that takes part in graph edges but is not indexed in any tree.
    pub fn add_external_key(&self, value: K, data: Option<D>) -> KeyId {
        let mut external = self.external_keys.lock();
        let id = self.storage.allocate(Key::new(value, data));
        external.push(id);
        id
    }

    pub fn external_keys(&self) -> Vec<KeyId> {
        self.external_keys.lock().clone()
    }

    /// Number of stored keys, indexed and external.
    pub fn vertex_count(&self) -> usize {
        self.storage.len()
    }

    /// Number of keys reachable through the leaf chains of all indices.
    pub fn indexed_vertex_count(&self) -> Result<usize> {
        let trees: Vec<SharedTree<K>> = self.indices.read().values().map(Arc::clone).collect();
        let mut count = 0;
        for tree in trees {
            let tree = tree.read();
            for leaf in tree.leaf_chain()? {
                count += tree.node(leaf)?.len();
            }
        }
        Ok(count)
    }

    pub fn external_vertex_count(&self) -> usize {
        self.external_keys.lock().len()
    }

    /// Number of keys in `index`, zero if the index does not exist.
    pub fn len(&self, index: &str) -> usize {
        self.tree(index).map_or(0, |tree| tree.read().len())
    }

    /// Number of levels of `index`, zero if the index does not exist.
    pub fn depth(&self, index: &str) -> Result<usize> {
        match self.tree(index) {
            Some(tree) => tree.read().depth(),
            None => Ok(0),
        }
    }

    /// Check the structural invariants of `index`.
    pub fn validate(&self, index: &str) -> Result<()> {
        match self.tree(index) {
            Some(tree) => tree.read().validate(),
            None => Ok(()),
        }
    }

    pub fn validate_all(&self) -> Result<()> {
        for name in self.index_names() {
            self.validate(&name)?;
        }
        Ok(())
    }

    /// Write the tree of `index` in SIF. Writes nothing for an unknown index.
    pub fn write_sif<W: Write>(&self, index: &str, writer: &mut W) -> Result<()> {
        match self.tree(index) {
            Some(tree) => tree.read().write_sif(writer),
            None => Ok(()),
        }
    }

    pub fn graph(&self) -> &GraphOverlay<E> {
        &self.graph
    }

    fn check_owned(&self, id: KeyId) -> Result<()> {
        if self.storage.contains(id) {
            Ok(())
        } else {
            Err(GroveError::ForeignKey(id))
        }
    }

    pub fn add_edge(&self, source: KeyId, target: KeyId) -> Result<()>
    where
        E: Default,
    {
        self.add_edge_with(source, target, E::default())
    }

    /// Add an edge carrying `metadata`. Both keys must belong to this grove.
    pub fn add_edge_with(&self, source: KeyId, target: KeyId, metadata: E) -> Result<()> {
        self.check_owned(source)?;
        self.check_owned(target)?;
        self.graph.add_edge_with(source, target, metadata);
        Ok(())
    }

    pub fn remove_edge(&self, source: KeyId, target: KeyId) -> bool {
        self.graph.remove_edge(source, target)
    }

    pub fn has_edge(&self, source: KeyId, target: KeyId) -> bool {
        self.graph.has_edge(source, target)
    }

    pub fn get_neighbors(&self, source: KeyId) -> Vec<KeyId> {
        self.graph.get_neighbors(source)
    }

    pub fn get_neighbors_if<P>(&self, source: KeyId, predicate: P) -> Vec<KeyId>
    where
        P: Fn(&E) -> bool,
    {
        self.graph.get_neighbors_if(source, predicate)
    }

    pub fn get_edges(&self, source: KeyId) -> Vec<E>
    where
        E: Clone,
    {
        self.graph.get_edges(source)
    }

    pub fn get_edge_list(&self, source: KeyId) -> Vec<Edge<E>>
    where
        E: Clone,
    {
        self.graph.get_edge_list(source)
    }

    pub fn out_degree(&self, source: KeyId) -> usize {
        self.graph.out_degree(source)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn vertex_count_with_edges(&self) -> usize {
        self.graph.vertex_count_with_edges()
    }

    /// Add an edge between each consecutive pair of `keys` for which `predicate` holds.
    /// Returns the number of edges added.
    pub fn link_if<P>(&self, keys: &[KeyId], predicate: P) -> Result<usize>
    where
        E: Default,
        P: Fn(&Key<K, D>, &Key<K, D>) -> bool,
    {
        self.link_if_with(keys, |a, b| predicate(a, b).then(E::default))
    }

    /// Add an edge between each consecutive pair of `keys` for which `f` returns metadata.
    /// Returns the number of edges added.
    pub fn link_if_with<F>(&self, keys: &[KeyId], f: F) -> Result<usize>
    where
        F: Fn(&Key<K, D>, &Key<K, D>) -> Option<E>,
    {
        let edges = self.storage.with_keys(keys, |resolved| {
            let mut edges = Vec::new();
            for (i, pair) in resolved.windows(2).enumerate() {
                match (pair[0], pair[1]) {
                    (Some(source), Some(target)) => {
                        if let Some(metadata) = f(source, target) {
                            edges.push((keys[i], keys[i + 1], metadata));
                        }
                    }
                    (None, _) => return Err(GroveError::ForeignKey(keys[i])),
                    (_, None) => return Err(GroveError::ForeignKey(keys[i + 1])),
                }
            }
            Ok(edges)
        })?;

        let added = edges.len();
        for (source, target, metadata) in edges {
            self.graph.add_edge_with(source, target, metadata);
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genogrove_core::{GenomicCoordinate, Interval, Kmer, Strand};

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn iv(start: u64, end: u64) -> Interval {
        Interval::new(start, end).unwrap()
    }

    #[fixture]
    fn grove() -> Grove<Interval, String> {
        Grove::new(3).unwrap()
    }

    fn values(grove: &Grove<Interval, String>, result: &QueryResult<Interval>) -> Vec<Interval> {
        let mut values: Vec<Interval> = grove
            .resolve(result)
            .into_iter()
            .map(|key| *key.value())
            .collect();
        values.sort();
        values
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn test_order_below_two_is_rejected(#[case] order: usize) {
        let result: Result<Grove<Interval>> = Grove::new(order);
        assert!(matches!(result, Err(GroveError::InvalidOrder(o)) if o == order));
    }

    #[rstest]
    fn test_basic_overlap(grove: Grove<Interval, String>) {
        grove.insert("chr1", iv(10, 30), Some("a".into())).unwrap();
        grove.insert("chr1", iv(20, 40), Some("b".into())).unwrap();
        grove.insert("chr1", iv(50, 60), Some("c".into())).unwrap();

        let result = grove.intersect_index(&iv(25, 35), "chr1").unwrap();
        assert_eq!(values(&grove, &result), vec![iv(10, 30), iv(20, 40)]);
        assert_eq!(result.query(), &iv(25, 35));
        grove.validate("chr1").unwrap();
    }

    #[rstest]
    fn test_missing_index_gives_empty_result(grove: Grove<Interval, String>) {
        grove.insert("chr1", iv(1, 2), None).unwrap();
        assert!(grove.intersect_index(&iv(1, 2), "chr9").unwrap().is_empty());
        assert_eq!(grove.len("chr9"), 0);
        assert_eq!(grove.depth("chr9").unwrap(), 0);
    }

    #[rstest]
    fn test_intersect_spans_all_indices(grove: Grove<Interval, String>) {
        grove.insert("chr2", iv(5, 10), Some("second".into())).unwrap();
        grove.insert("chr1", iv(5, 10), Some("first".into())).unwrap();
        grove.insert("chr1", iv(100, 200), None).unwrap();

        let result = grove.intersect(&iv(8, 9)).unwrap();
        let data: Vec<Option<String>> = grove
            .resolve(&result)
            .into_iter()
            .map(|key| key.data().cloned())
            .collect();
        assert_eq!(
            data,
            vec![Some("first".to_string()), Some("second".to_string())]
        );
    }

    #[rstest]
    fn test_insert_root_twice(grove: Grove<Interval, String>) {
        grove.insert_root("chr1").unwrap();
        assert!(grove.has_index("chr1"));
        assert!(matches!(
            grove.insert_root("chr1"),
            Err(GroveError::RootExists(name)) if name == "chr1"
        ));
    }

    #[rstest]
    fn test_insert_sorted_rejects_smaller_key(grove: Grove<Interval, String>) {
        grove.insert_sorted("chr1", iv(10, 20), None).unwrap();
        grove.insert_sorted("chr1", iv(10, 20), None).unwrap();
        let err = grove.insert_sorted("chr1", iv(5, 8), None).unwrap_err();
        assert!(matches!(err, GroveError::UnsortedInsert { .. }));
        assert!(err.to_string().contains("[5,8]"));
        assert_eq!(grove.len("chr1"), 2);
        assert_eq!(grove.vertex_count(), 2);
    }

    #[rstest]
    fn test_bulk_rejects_unsorted_batch_without_side_effects(grove: Grove<Interval, String>) {
        grove.insert_sorted("chr1", iv(0, 5), None).unwrap();
        let batch = vec![(iv(10, 20), None), (iv(6, 8), None), (iv(30, 40), None)];
        let err = grove
            .insert_bulk("chr1", batch, BulkSortedness::Sorted)
            .unwrap_err();

        assert!(matches!(err, GroveError::UnsortedBulk { .. }));
        assert_eq!(grove.len("chr1"), 1);
        assert_eq!(grove.vertex_count(), 1);
        grove.validate("chr1").unwrap();
    }

    #[rstest]
    fn test_bulk_must_follow_existing_keys(grove: Grove<Interval, String>) {
        grove.insert("chr1", iv(50, 60), None).unwrap();
        let err = grove
            .insert_bulk("chr1", vec![(iv(40, 45), None)], BulkSortedness::Sorted)
            .unwrap_err();
        assert!(matches!(err, GroveError::UnsortedBulk { .. }));
        assert_eq!(grove.len("chr1"), 1);
    }

    #[rstest]
    fn test_bulk_accepts_equal_keys_like_insert_sorted(grove: Grove<Interval, String>) {
        // equal neighbours inside the batch
        grove
            .insert_bulk("chr1", vec![(iv(50, 60), None), (iv(50, 60), None)], BulkSortedness::Sorted)
            .unwrap();
        // a batch starting at the current maximum
        grove
            .insert_bulk("chr1", vec![(iv(50, 60), None)], BulkSortedness::Sorted)
            .unwrap();
        grove.insert_sorted("chr1", iv(50, 60), None).unwrap();

        assert_eq!(grove.len("chr1"), 4);
        assert_eq!(grove.intersect_index(&iv(55, 55), "chr1").unwrap().len(), 4);
        grove.validate("chr1").unwrap();
    }

    #[rstest]
    fn test_huge_order_does_not_preallocate() {
        let grove: Grove<Interval> = Grove::new(usize::MAX).unwrap();
        for i in (0..50u64).rev() {
            grove.insert("chr1", iv(i, i + 2), None).unwrap();
        }
        grove.insert_sorted("chr1", iv(100, 102), None).unwrap();

        assert_eq!(grove.len("chr1"), 51);
        assert_eq!(grove.depth("chr1").unwrap(), 1);
        assert_eq!(grove.intersect(&iv(1, 1)).unwrap().len(), 2);
        grove.validate("chr1").unwrap();
    }

    #[rstest]
    #[case(BulkSortedness::Unsorted)]
    #[case(BulkSortedness::Auto)]
    fn test_bulk_sorts_when_asked(grove: Grove<Interval, String>, #[case] mode: BulkSortedness) {
        let batch: Vec<(Interval, Option<String>)> = [40u64, 10, 30, 20, 0]
            .iter()
            .map(|&s| (iv(s, s + 5), Some(s.to_string())))
            .collect();
        let ids = grove.insert_bulk("chr1", batch, mode).unwrap();

        assert_eq!(ids.len(), 5);
        assert_eq!(grove.key(ids[0]).unwrap().value(), &iv(0, 5));
        assert_eq!(grove.len("chr1"), 5);
        grove.validate("chr1").unwrap();
    }

    #[rstest]
    fn test_empty_bulk_is_a_no_op(grove: Grove<Interval, String>) {
        assert!(grove.insert_bulk_default("chr1", Vec::new()).unwrap().is_empty());
        assert!(!grove.has_index("chr1"));
    }

    #[rstest]
    fn test_counts(grove: Grove<Interval, String>) {
        grove.insert("chr1", iv(1, 2), None).unwrap();
        grove.insert("chr2", iv(1, 2), None).unwrap();
        grove.add_external_key(iv(100, 200), Some("enhancer".into()));

        assert_eq!(grove.vertex_count(), 3);
        assert_eq!(grove.indexed_vertex_count().unwrap(), 2);
        assert_eq!(grove.external_vertex_count(), 1);
        assert_eq!(grove.index_names(), vec!["chr1", "chr2"]);
    }

    #[rstest]
    fn test_external_keys_are_not_searchable(grove: Grove<Interval, String>) {
        let external = grove.add_external_key(iv(100, 200), None);
        let exon = grove.insert("chr1", iv(150, 160), None).unwrap();
        grove.add_edge(exon, external).unwrap();

        let result = grove.intersect(&iv(100, 200)).unwrap();
        assert_eq!(result.keys(), &[exon]);
        assert_eq!(grove.get_neighbors(exon), vec![external]);
    }

    #[rstest]
    fn test_graph_edges(grove: Grove<Interval, String>) {
        let k0 = grove.insert("chr1", iv(1, 2), None).unwrap();
        let k1 = grove.insert("chr1", iv(3, 4), None).unwrap();
        let k2 = grove.insert("chr1", iv(5, 6), None).unwrap();
        grove.add_edge(k0, k1).unwrap();
        grove.add_edge(k1, k2).unwrap();

        assert_eq!(grove.get_neighbors(k0), vec![k1]);
        assert_eq!(grove.edge_count(), 2);
        assert!(grove.remove_edge(k0, k1));
        assert!(!grove.has_edge(k0, k1));
        assert_eq!(grove.edge_count(), 1);
        assert_eq!(grove.out_degree(k1), 1);
    }

    #[rstest]
    fn test_foreign_keys_are_rejected(grove: Grove<Interval, String>) {
        let other: Grove<Interval, String> = Grove::new(3).unwrap();
        let foreign = other.insert("chr1", iv(1, 2), None).unwrap();
        let own = grove.insert("chr1", iv(1, 2), None).unwrap();

        assert!(grove.key(foreign).is_none());
        assert!(matches!(
            grove.add_edge(own, foreign),
            Err(GroveError::ForeignKey(id)) if id == foreign
        ));
        assert!(matches!(
            grove.link_if(&[own, foreign], |_, _| true),
            Err(GroveError::ForeignKey(_))
        ));
        assert_eq!(grove.edge_count(), 0);
    }

    #[rstest]
    fn test_link_if_with_metadata() {
        let grove: Grove<GenomicCoordinate, String, u64> = Grove::new(4).unwrap();
        let exons: Vec<KeyId> = [(100, 200), (300, 400), (350, 500), (900, 950)]
            .into_iter()
            .map(|(s, e)| {
                let coord = GenomicCoordinate::new(Strand::Forward, s, e).unwrap();
                grove.insert("chr1", coord, None).unwrap()
            })
            .collect();

        // link exons that do not overlap, weighted by the gap between them
        let added = grove
            .link_if_with(&exons, |a, b| {
                (!GenomicCoordinate::overlap(a.value(), b.value()))
                    .then(|| b.value().start - a.value().end)
            })
            .unwrap();

        assert_eq!(added, 2);
        assert_eq!(grove.get_edges(exons[0]), vec![100]);
        assert_eq!(grove.get_neighbors_if(exons[2], |gap| *gap > 100), vec![exons[3]]);
        assert!(!grove.has_edge(exons[1], exons[2]));
    }

    #[rstest]
    fn test_link_if_without_metadata() {
        let grove: Grove<Kmer> = Grove::new(3).unwrap();
        let kmers: Vec<KeyId> = ["ACGT", "ACGA", "TTTT"]
            .into_iter()
            .map(|s| grove.insert("k4", Kmer::new(s).unwrap(), None).unwrap())
            .collect();

        let added = grove
            .link_if(&kmers, |a, b| a.value().to_string()[..3] == b.value().to_string()[..3])
            .unwrap();
        assert_eq!(added, 1);
        assert!(grove.has_edge(kmers[0], kmers[1]));
    }

    #[rstest]
    fn test_write_sif_for_unknown_index_writes_nothing(grove: Grove<Interval, String>) {
        let mut out = Vec::new();
        grove.write_sif("chrX", &mut out).unwrap();
        assert!(out.is_empty());
    }
}
