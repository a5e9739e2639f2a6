//! The [`MetadataIndex`] trait defining the local index interface.

use std::path::Path;

use crate::error::IndexResult;
use crate::range::{Direction, KeyRange};

/// A key and its raw record bytes.
pub type IndexEntry = (Vec<u8>, Vec<u8>);

/// Ordered, durable key-to-record map.
///
/// Implementations must be thread-safe (`Send + Sync`). Mutations are durable
/// when they return. Keys iterate in byte order.
pub trait MetadataIndex: Send + Sync {
    /// Whether `key` has a record.
    fn has(&self, key: &[u8]) -> IndexResult<bool>;

    /// Raw record bytes for `key`, or `Ok(None)` if absent.
    fn get(&self, key: &[u8]) -> IndexResult<Option<Vec<u8>>>;

    /// Insert or replace the record for `key`, synchronously flushed.
    fn put(&self, key: &[u8], record: &[u8]) -> IndexResult<()>;

    /// Remove the record for `key`, synchronously flushed. Removing a key
    /// that has no record is not an error.
    fn delete(&self, key: &[u8]) -> IndexResult<()>;

    /// The first entry in `range` strictly past `after` in `direction`.
    ///
    /// With `after = None` this is the first (forward) or last (reverse)
    /// entry of the range. Returns `Ok(None)` once the range is exhausted.
    fn seek(
        &self,
        range: &KeyRange,
        after: Option<&[u8]>,
        direction: Direction,
    ) -> IndexResult<Option<IndexEntry>>;

    /// Release the index. Later calls fail with `IndexError::Closed`.
    fn close(&self) -> IndexResult<()>;

    /// On-disk location, or `None` for a non-persistent index.
    fn path(&self) -> Option<&Path>;
}
