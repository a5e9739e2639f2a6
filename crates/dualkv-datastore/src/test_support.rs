//! Fault-injecting wrappers around the in-memory backends.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use dualkv_index::{
    Direction, InMemoryIndex, IndexEntry, IndexError, IndexResult, KeyRange, MetadataIndex,
};
use dualkv_store::{InMemoryObjectStore, ObjectStore, StoreError, StoreResult};
use dualkv_types::ObjectId;

fn injected() -> io::Error {
    io::Error::other("injected fault")
}

/// [`InMemoryIndex`] whose writes, scans and close can be made to fail.
#[derive(Debug, Default)]
pub struct FaultyIndex {
    pub inner: InMemoryIndex,
    pub fail_puts: AtomicBool,
    pub fail_deletes: AtomicBool,
    pub fail_seeks: AtomicBool,
    pub fail_close: AtomicBool,
}

impl FaultyIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn tripped(flag: &AtomicBool) -> bool {
    flag.load(Ordering::SeqCst)
}

impl MetadataIndex for FaultyIndex {
    fn has(&self, key: &[u8]) -> IndexResult<bool> {
        self.inner.has(key)
    }

    fn get(&self, key: &[u8]) -> IndexResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], record: &[u8]) -> IndexResult<()> {
        if tripped(&self.fail_puts) {
            return Err(IndexError::Io(injected()));
        }
        self.inner.put(key, record)
    }

    fn delete(&self, key: &[u8]) -> IndexResult<()> {
        if tripped(&self.fail_deletes) {
            return Err(IndexError::Io(injected()));
        }
        self.inner.delete(key)
    }

    fn seek(
        &self,
        range: &KeyRange,
        after: Option<&[u8]>,
        direction: Direction,
    ) -> IndexResult<Option<IndexEntry>> {
        if tripped(&self.fail_seeks) {
            return Err(IndexError::Io(injected()));
        }
        self.inner.seek(range, after, direction)
    }

    fn close(&self) -> IndexResult<()> {
        if tripped(&self.fail_close) {
            return Err(IndexError::Io(injected()));
        }
        self.inner.close()
    }

    fn path(&self) -> Option<&Path> {
        None
    }
}

/// [`InMemoryObjectStore`] whose operations can be made to fail.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: InMemoryObjectStore,
    pub fail_puts: AtomicBool,
    pub fail_gets: AtomicBool,
    pub fail_deletes: AtomicBool,
    pub fail_close: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectStore for FaultyStore {
    fn put(&self, id: &ObjectId, data: &[u8], overwrite: bool) -> StoreResult<()> {
        if tripped(&self.fail_puts) {
            return Err(StoreError::Io(injected()));
        }
        self.inner.put(id, data, overwrite)
    }

    fn get(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        if tripped(&self.fail_gets) {
            return Err(StoreError::Io(injected()));
        }
        self.inner.get(id)
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<()> {
        if tripped(&self.fail_deletes) {
            return Err(StoreError::Io(injected()));
        }
        self.inner.delete(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        self.inner.exists(id)
    }

    fn size_of(&self, id: &ObjectId) -> StoreResult<u64> {
        self.inner.size_of(id)
    }

    fn close(&self) -> StoreResult<()> {
        if tripped(&self.fail_close) {
            return Err(StoreError::Io(injected()));
        }
        self.inner.close()
    }
}
