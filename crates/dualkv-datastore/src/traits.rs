//! Capability traits.
//!
//! Each trait names one thing a datastore can do. [`Datastore`] bundles the
//! core capabilities with `sync` and `close`; backends that can batch or
//! report disk usage implement [`Batchable`] and [`PersistentDatastore`] too.

use dualkv_types::Key;

use crate::batch::Batch;
use crate::error::DatastoreResult;
use crate::query::Query;
use crate::results::Results;

/// Point reads.
pub trait Readable {
    /// Whether `key` currently exists.
    fn has(&self, key: &Key) -> DatastoreResult<bool>;

    /// The value stored under `key`. Fails with `NotFound` if absent.
    fn get(&self, key: &Key) -> DatastoreResult<Vec<u8>>;

    /// The length of the value stored under `key`, without fetching it.
    fn get_size(&self, key: &Key) -> DatastoreResult<u64>;
}

/// Point writes.
pub trait Writable {
    /// Store `value` under `key`, replacing any existing value.
    fn put(&self, key: &Key, value: &[u8]) -> DatastoreResult<()>;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, key: &Key) -> DatastoreResult<()>;
}

/// Range queries.
pub trait Queryable {
    fn query(&self, query: Query) -> DatastoreResult<Results>;
}

/// Grouped writes with no cross-operation atomicity.
pub trait Batchable: Writable {
    fn batch(&self) -> DatastoreResult<Batch<'_>>;
}

/// Datastores backed by local disk.
pub trait PersistentDatastore {
    /// Bytes used on local disk.
    fn disk_usage(&self) -> DatastoreResult<u64>;
}

/// A complete key-value datastore.
pub trait Datastore: Readable + Writable + Queryable {
    /// Flush everything under `prefix` to durable storage.
    fn sync(&self, prefix: &Key) -> DatastoreResult<()>;

    /// Release all resources. Later operations fail with `Closed`.
    fn close(&self) -> DatastoreResult<()>;
}
