//! In-memory metadata index for testing and ephemeral use.
//!
//! [`InMemoryIndex`] keeps all records in a `BTreeMap` protected by a
//! `RwLock`. It implements the full [`MetadataIndex`] trait; data is lost
//! when the index is dropped.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{IndexError, IndexResult};
use crate::range::{Direction, KeyRange};
use crate::traits::{IndexEntry, MetadataIndex};

type RecordMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// An in-memory implementation of [`MetadataIndex`].
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    records: RwLock<RecordMap>,
    closed: AtomicBool,
}

impl InMemoryIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    pub fn len(&self) -> IndexResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> IndexResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> IndexResult<RwLockReadGuard<'_, RecordMap>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(IndexError::Closed);
        }
        self.records
            .read()
            .map_err(|e| IndexError::Poisoned(e.to_string()))
    }

    fn write(&self) -> IndexResult<RwLockWriteGuard<'_, RecordMap>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(IndexError::Closed);
        }
        self.records
            .write()
            .map_err(|e| IndexError::Poisoned(e.to_string()))
    }
}

impl MetadataIndex for InMemoryIndex {
    fn has(&self, key: &[u8]) -> IndexResult<bool> {
        Ok(self.read()?.contains_key(key))
    }

    fn get(&self, key: &[u8]) -> IndexResult<Option<Vec<u8>>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn put(&self, key: &[u8], record: &[u8]) -> IndexResult<()> {
        self.write()?.insert(key.to_vec(), record.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> IndexResult<()> {
        self.write()?.remove(key);
        Ok(())
    }

    fn seek(
        &self,
        range: &KeyRange,
        after: Option<&[u8]>,
        direction: Direction,
    ) -> IndexResult<Option<IndexEntry>> {
        let records = self.read()?;
        let Some(bounds) = range.bounds_after(after, direction) else {
            return Ok(None);
        };
        let mut iter = records.range::<[u8], _>(bounds);
        let entry = match direction {
            Direction::Forward => iter.next(),
            Direction::Reverse => iter.next_back(),
        };
        Ok(entry.map(|(k, v)| (k.clone(), v.clone())))
    }

    fn close(&self) -> IndexResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(IndexError::Closed);
        }
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // Point operations
    // ---------------------------------------------------------------

    #[test]
    fn put_get_has_delete() {
        let index = InMemoryIndex::new();
        assert!(!index.has(b"/a").unwrap());
        index.put(b"/a", &[1; 8]).unwrap();
        assert!(index.has(b"/a").unwrap());
        assert_eq!(index.get(b"/a").unwrap(), Some(vec![1; 8]));

        index.delete(b"/a").unwrap();
        assert!(!index.has(b"/a").unwrap());
        assert_eq!(index.get(b"/a").unwrap(), None);
    }

    #[test]
    fn delete_missing_is_ok() {
        let index = InMemoryIndex::new();
        index.delete(b"/never").unwrap();
    }

    #[test]
    fn put_replaces_record() {
        let index = InMemoryIndex::new();
        index.put(b"/a", &[1; 8]).unwrap();
        index.put(b"/a", &[2; 8]).unwrap();
        assert_eq!(index.get(b"/a").unwrap(), Some(vec![2; 8]));
        assert_eq!(index.len().unwrap(), 1);
    }

    // ---------------------------------------------------------------
    // Seek
    // ---------------------------------------------------------------

    #[test]
    fn seek_first_and_last() {
        let index = InMemoryIndex::new();
        for key in ["/c", "/a", "/b"] {
            index.put(key.as_bytes(), &[0; 8]).unwrap();
        }
        let first = index.seek(&KeyRange::all(), None, Direction::Forward).unwrap();
        assert_eq!(first.unwrap().0, b"/a");
        let last = index.seek(&KeyRange::all(), None, Direction::Reverse).unwrap();
        assert_eq!(last.unwrap().0, b"/c");
    }

    #[test]
    fn seek_stays_inside_range() {
        let index = InMemoryIndex::new();
        for key in ["/a/1", "/ab", "/b/1"] {
            index.put(key.as_bytes(), &[0; 8]).unwrap();
        }
        let range = KeyRange::prefix(b"/a/");
        let hit = index.seek(&range, None, Direction::Forward).unwrap();
        assert_eq!(hit.unwrap().0, b"/a/1");
        assert!(index
            .seek(&range, Some(b"/a/1"), Direction::Forward)
            .unwrap()
            .is_none());
    }

    #[test]
    fn seek_empty_index() {
        let index = InMemoryIndex::new();
        assert!(index
            .seek(&KeyRange::all(), None, Direction::Reverse)
            .unwrap()
            .is_none());
    }

    // ---------------------------------------------------------------
    // Close
    // ---------------------------------------------------------------

    #[test]
    fn closed_index_rejects_operations() {
        let index = InMemoryIndex::new();
        index.close().unwrap();
        assert!(matches!(index.has(b"/a"), Err(IndexError::Closed)));
        assert!(matches!(index.put(b"/a", &[0; 8]), Err(IndexError::Closed)));
        assert!(matches!(index.close(), Err(IndexError::Closed)));
        assert!(index.path().is_none());
    }
}
