use std::mem;
use std::ptr;

use fxhash::FxHashMap as HashMap;
use parking_lot::Mutex;

use crate::key_storage::KeyId;

/// A directed edge to `target`, carrying `metadata`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<E = ()> {
    pub target: KeyId,
    pub metadata: E,
}

///
/// Directed edges between keys, kept apart from the tree shape.
///
/// The overlay only stores key handles, never key contents. All operations take one mutex
/// over the whole adjacency map; anything returning a collection returns a copy.
///
/// The overlay has identity and is not `Clone`. Its contents can be moved out with
/// [`GraphOverlay::take`] or moved across with [`GraphOverlay::move_from`].
///
#[derive(Debug)]
pub struct GraphOverlay<E = ()> {
    adjacency: Mutex<HashMap<KeyId, Vec<Edge<E>>>>,
}

impl<E> Default for GraphOverlay<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> GraphOverlay<E> {
    pub fn new() -> Self {
        Self {
            adjacency: Mutex::new(HashMap::default()),
        }
    }

    pub fn add_edge(&self, source: KeyId, target: KeyId)
    where
        E: Default,
    {
        self.add_edge_with(source, target, E::default());
    }

    pub fn add_edge_with(&self, source: KeyId, target: KeyId, metadata: E) {
        self.adjacency
            .lock()
            .entry(source)
            .or_default()
            .push(Edge { target, metadata });
    }

    /// Remove the first edge from `source` to `target`. Returns false if there was none.
    pub fn remove_edge(&self, source: KeyId, target: KeyId) -> bool {
        let mut adjacency = self.adjacency.lock();
        let Some(edges) = adjacency.get_mut(&source) else {
            return false;
        };
        let Some(pos) = edges.iter().position(|e| e.target == target) else {
            return false;
        };
        edges.remove(pos);
        if edges.is_empty() {
            adjacency.remove(&source);
        }
        true
    }

    pub fn has_edge(&self, source: KeyId, target: KeyId) -> bool {
        self.adjacency
            .lock()
            .get(&source)
            .is_some_and(|edges| edges.iter().any(|e| e.target == target))
    }

    /// Targets of all edges leaving `source`, in insertion order.
    pub fn get_neighbors(&self, source: KeyId) -> Vec<KeyId> {
        self.adjacency
            .lock()
            .get(&source)
            .map(|edges| edges.iter().map(|e| e.target).collect())
            .unwrap_or_default()
    }

    /// Targets of the edges leaving `source` whose metadata satisfies `predicate`.
    pub fn get_neighbors_if<P>(&self, source: KeyId, predicate: P) -> Vec<KeyId>
    where
        P: Fn(&E) -> bool,
    {
        self.adjacency
            .lock()
            .get(&source)
            .map(|edges| {
                edges
                    .iter()
                    .filter(|e| predicate(&e.metadata))
                    .map(|e| e.target)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn out_degree(&self, source: KeyId) -> usize {
        self.adjacency.lock().get(&source).map_or(0, Vec::len)
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.lock().values().map(Vec::len).sum()
    }

    /// Number of keys with at least one outgoing edge.
    pub fn vertex_count_with_edges(&self) -> usize {
        self.adjacency.lock().len()
    }

    pub fn clear(&self) {
        self.adjacency.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.lock().is_empty()
    }

    /// Move every edge out into a new overlay, leaving this one empty.
    pub fn take(&self) -> Self {
        let adjacency = mem::take(&mut *self.adjacency.lock());
        Self {
            adjacency: Mutex::new(adjacency),
        }
    }

    /// Replace the edges of this overlay with the edges of `other`, leaving `other` empty.
    ///
    /// Both mutexes are taken in address order so two opposite moves cannot deadlock.
    pub fn move_from(&self, other: &Self) {
        if ptr::eq(self, other) {
            return;
        }
        let (mut this, mut that) = if (self as *const Self) < (other as *const Self) {
            let this = self.adjacency.lock();
            let that = other.adjacency.lock();
            (this, that)
        } else {
            let that = other.adjacency.lock();
            let this = self.adjacency.lock();
            (this, that)
        };
        *this = mem::take(&mut *that);
    }
}

impl<E: Clone> GraphOverlay<E> {
    /// Metadata of all edges leaving `source`, in insertion order.
    pub fn get_edges(&self, source: KeyId) -> Vec<E> {
        self.adjacency
            .lock()
            .get(&source)
            .map(|edges| edges.iter().map(|e| e.metadata.clone()).collect())
            .unwrap_or_default()
    }

    /// All edges leaving `source`, targets and metadata.
    pub fn get_edge_list(&self, source: KeyId) -> Vec<Edge<E>> {
        self.adjacency
            .lock()
            .get(&source)
            .cloned()
            .unwrap_or_default()
    }
}
