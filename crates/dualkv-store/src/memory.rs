use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use dualkv_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. All payloads are held in memory behind a
/// `RwLock` for safe concurrent access. Payloads are cloned on read/write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, Vec<u8>>>,
    closed: AtomicBool,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored payloads.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Return a sorted list of all object IDs in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let map = self.objects.read().expect("lock poisoned");
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Whether [`ObjectStore::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn read_map(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<ObjectId, Vec<u8>>>> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        self.objects
            .read()
            .map_err(|e| StoreError::Io(std::io::Error::other(format!("lock poisoned: {e}"))))
    }

    fn write_map(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<ObjectId, Vec<u8>>>> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        self.objects
            .write()
            .map_err(|e| StoreError::Io(std::io::Error::other(format!("lock poisoned: {e}"))))
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, id: &ObjectId, data: &[u8], overwrite: bool) -> StoreResult<()> {
        let mut map = self.write_map()?;
        if !overwrite && map.contains_key(id) {
            return Err(StoreError::AlreadyExists(*id));
        }
        map.insert(*id, data.to_vec());
        debug!(oid = %id, size = data.len(), "put object");
        Ok(())
    }

    fn get(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let map = self.read_map()?;
        map.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<()> {
        let mut map = self.write_map()?;
        match map.remove(id) {
            Some(_) => {
                debug!(oid = %id, "deleted object");
                Ok(())
            }
            None => Err(StoreError::NotFound(*id)),
        }
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.read_map()?.contains_key(id))
    }

    fn size_of(&self, id: &ObjectId) -> StoreResult<u64> {
        let map = self.read_map()?;
        map.get(id)
            .map(|data| data.len() as u64)
            .ok_or(StoreError::NotFound(*id))
    }

    fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .field("closed", &self.is_closed())
            .finish()
    }
}
