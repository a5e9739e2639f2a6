//! Grouped writes.

use std::collections::BTreeMap;

use dualkv_types::Key;
use tracing::debug;

use crate::error::DatastoreResult;
use crate::traits::Writable;

/// A pending batch operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Put(Vec<u8>),
    Delete,
}

/// Puts and deletes collected for a single [`commit`](Batch::commit).
///
/// Later operations on a key replace earlier ones. Commit applies each
/// operation through the target one call at a time, in key order, and stops
/// at the first error. Operations already applied stay applied.
pub struct Batch<'a> {
    target: &'a dyn Writable,
    ops: BTreeMap<Key, BatchOp>,
}

impl<'a> Batch<'a> {
    pub fn new(target: &'a dyn Writable) -> Self {
        Self {
            target,
            ops: BTreeMap::new(),
        }
    }

    pub fn put(&mut self, key: Key, value: impl Into<Vec<u8>>) {
        self.ops.insert(key, BatchOp::Put(value.into()));
    }

    pub fn delete(&mut self, key: Key) {
        self.ops.insert(key, BatchOp::Delete);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Pending operation for `key`, if any.
    pub fn pending(&self, key: &Key) -> Option<&BatchOp> {
        self.ops.get(key)
    }

    pub fn commit(self) -> DatastoreResult<()> {
        let count = self.ops.len();
        for (key, op) in self.ops {
            match op {
                BatchOp::Put(value) => self.target.put(&key, &value)?,
                BatchOp::Delete => self.target.delete(&key)?,
            }
        }
        debug!(ops = count, "committed batch");
        Ok(())
    }
}

impl std::fmt::Debug for Batch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch").field("ops", &self.ops).finish()
    }
}
