use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, Ordering};

use genogrove_core::Key;
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};

/// Number of keys held by one storage chunk.
pub const CHUNK_CAPACITY: usize = 4096;

static NEXT_STORAGE_ID: AtomicU64 = AtomicU64::new(1);

///
/// Handle to a key held in a [`KeyStorage`].
///
/// A handle carries the id of the storage that issued it, so a handle from one grove never
/// resolves to a key of another grove.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId {
    storage: u64,
    slot: usize,
}

impl KeyId {
    /// Position of the key in its storage, in allocation order.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.slot, self.storage)
    }
}

///
/// Append-only storage for every key of one grove.
///
/// Keys are kept in fixed-capacity chunks: growing the storage adds a chunk and never
/// moves a key that was already allocated. Keys are never removed while the storage lives.
///
#[derive(Debug)]
pub struct KeyStorage<K, D = ()> {
    id: u64,
    chunks: RwLock<Vec<Vec<Key<K, D>>>>,
}

impl<K, D> Default for KeyStorage<K, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, D> KeyStorage<K, D> {
    pub fn new() -> Self {
        Self {
            id: NEXT_STORAGE_ID.fetch_add(1, Ordering::Relaxed),
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// Store `key` and return its handle.
    pub fn allocate(&self, key: Key<K, D>) -> KeyId {
        let mut chunks = self.chunks.write();
        self.push(&mut chunks, key)
    }

    /// Store a batch of keys under a single lock. Handles come back in input order and
    /// occupy consecutive slots.
    pub fn allocate_many<I>(&self, keys: I) -> Vec<KeyId>
    where
        I: IntoIterator<Item = Key<K, D>>,
    {
        let keys = keys.into_iter();
        let mut ids = Vec::with_capacity(keys.size_hint().0);
        let mut chunks = self.chunks.write();
        for key in keys {
            ids.push(self.push(&mut chunks, key));
        }
        ids
    }

    fn push(&self, chunks: &mut Vec<Vec<Key<K, D>>>, key: Key<K, D>) -> KeyId {
        let needs_chunk = chunks
            .last()
            .is_none_or(|chunk| chunk.len() == CHUNK_CAPACITY);
        if needs_chunk {
            chunks.push(Vec::with_capacity(CHUNK_CAPACITY));
        }
        let chunk_index = chunks.len() - 1;
        let chunk = &mut chunks[chunk_index];
        let slot = chunk_index * CHUNK_CAPACITY + chunk.len();
        chunk.push(key);
        KeyId {
            storage: self.id,
            slot,
        }
    }

    /// Read access to the key behind `id`, or `None` if the handle was not issued here.
    ///
    /// The guard holds a shared lock on the storage; drop it before allocating.
    pub fn get(&self, id: KeyId) -> Option<MappedRwLockReadGuard<'_, Key<K, D>>> {
        if id.storage != self.id {
            return None;
        }
        RwLockReadGuard::try_map(self.chunks.read(), |chunks| {
            chunks
                .get(id.slot / CHUNK_CAPACITY)
                .and_then(|chunk| chunk.get(id.slot % CHUNK_CAPACITY))
        })
        .ok()
    }

    pub fn contains(&self, id: KeyId) -> bool {
        id.storage == self.id && id.slot < self.len()
    }

    pub fn len(&self) -> usize {
        let chunks = self.chunks.read();
        match chunks.last() {
            Some(last) => (chunks.len() - 1) * CHUNK_CAPACITY + last.len(),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` over the keys behind `ids` under one shared lock. Foreign handles are
    /// passed as `None`.
    pub fn with_keys<R>(&self, ids: &[KeyId], f: impl FnOnce(&[Option<&Key<K, D>>]) -> R) -> R {
        let chunks = self.chunks.read();
        let keys: Vec<Option<&Key<K, D>>> = ids
            .iter()
            .map(|id| {
                if id.storage != self.id {
                    return None;
                }
                chunks
                    .get(id.slot / CHUNK_CAPACITY)
                    .and_then(|chunk| chunk.get(id.slot % CHUNK_CAPACITY))
            })
            .collect();
        f(&keys)
    }
}
