use crate::key_storage::KeyId;

///
/// The outcome of one overlap search: the query plus the handles of every matching key,
/// in traversal order.
///
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<K> {
    query: K,
    keys: Vec<KeyId>,
    leaves_visited: usize,
}

impl<K> QueryResult<K> {
    pub fn new(query: K) -> Self {
        Self {
            query,
            keys: Vec::new(),
            leaves_visited: 0,
        }
    }

    pub fn query(&self) -> &K {
        &self.query
    }

    pub fn keys(&self) -> &[KeyId] {
        &self.keys
    }

    pub fn add_key(&mut self, key: KeyId) {
        self.keys.push(key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of leaves the search scanned.
    pub fn leaves_visited(&self) -> usize {
        self.leaves_visited
    }

    pub(crate) fn record_leaf_visit(&mut self) {
        self.leaves_visited += 1;
    }

    pub fn into_keys(self) -> Vec<KeyId> {
        self.keys
    }
}

impl<'a, K> IntoIterator for &'a QueryResult<K> {
    type Item = &'a KeyId;
    type IntoIter = std::slice::Iter<'a, KeyId>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
