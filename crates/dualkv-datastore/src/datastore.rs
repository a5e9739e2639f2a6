//! The dual-store coordinator.
//!
//! # Write protocol
//!
//! - `put` writes the remote payload, then the index record. If the record
//!   cannot be written, a newly written payload is deleted again
//!   (best-effort; a failed rollback is logged and leaves an orphan).
//! - `delete` removes the index record, then the remote payload. A failed
//!   payload delete leaves an orphan and is reported.
//!
//! Orphans are never visible: every read goes through the index first.
//!
//! # Locking
//!
//! One `RwLock` guards both handles. Reads and query steps share it;
//! `put`, `delete` and `close` hold it exclusively.

use std::sync::{Arc, RwLock};

use dualkv_index::{
    Direction, IndexCursor, InMemoryIndex, KeyRange, MetadataIndex, MetadataRecord, RedbIndex,
};
use dualkv_store::ObjectStore;
use dualkv_types::{Key, ObjectId};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::batch::Batch;
use crate::config::DatastoreConfig;
use crate::error::{DatastoreError, DatastoreResult};
use crate::naive;
use crate::query::{Order, Query};
use crate::results::{IndexScan, Results};
use crate::traits::{Batchable, Datastore, PersistentDatastore, Queryable, Readable, Writable};

/// The two store handles, alive until close.
pub(crate) struct Handles {
    pub(crate) remote: Arc<dyn ObjectStore>,
    pub(crate) index: Arc<dyn MetadataIndex>,
}

/// State shared between the datastore and its open query iterators.
pub(crate) struct Shared {
    handles: RwLock<Option<Handles>>,
}

impl Shared {
    pub(crate) fn with_read<T>(
        &self,
        f: impl FnOnce(&Handles) -> DatastoreResult<T>,
    ) -> DatastoreResult<T> {
        let guard = self.handles.read().map_err(|_| DatastoreError::LockPoisoned)?;
        let handles = guard.as_ref().ok_or(DatastoreError::Closed)?;
        f(handles)
    }

    fn with_write<T>(&self, f: impl FnOnce(&Handles) -> DatastoreResult<T>) -> DatastoreResult<T> {
        let guard = self.handles.write().map_err(|_| DatastoreError::LockPoisoned)?;
        let handles = guard.as_ref().ok_or(DatastoreError::Closed)?;
        f(handles)
    }
}

/// Fetch the payload of a key known to be indexed.
///
/// A missing payload means the index and the remote store disagree, which
/// is reported as corruption rather than `NotFound`.
pub(crate) fn fetch_payload(handles: &Handles, key: &Key) -> DatastoreResult<Vec<u8>> {
    let oid = ObjectId::derive(key.as_bytes());
    match handles.remote.get(&oid) {
        Ok(value) => Ok(value),
        Err(e) if e.is_not_found() => {
            error!(key = %key, oid = %oid, "indexed key has no remote payload");
            Err(DatastoreError::Corruption { key: key.clone(), oid })
        }
        Err(e) => Err(e.into()),
    }
}

/// Key-value datastore over a local metadata index and a remote object
/// store.
///
/// Payloads are stored remotely under [`ObjectId::derive`] of the key.
/// Distinct keys that derive the same id share one payload; collisions are
/// not detected.
pub struct DualDatastore {
    shared: Arc<Shared>,
}

impl DualDatastore {
    /// Validate `config` and open the local index next to `remote`.
    ///
    /// The index is persisted under `config.index_path`, or kept in memory
    /// when the path is empty.
    pub fn open(config: &DatastoreConfig, remote: Arc<dyn ObjectStore>) -> DatastoreResult<Self> {
        let index_id = config.validate()?;
        let index: Arc<dyn MetadataIndex> = if config.index_path.as_os_str().is_empty() {
            Arc::new(InMemoryIndex::new())
        } else {
            Arc::new(RedbIndex::open(&config.index_path)?)
        };
        info!(
            index = %index_id,
            local_addr = %config.local_addr,
            path = %config.index_path.display(),
            threads = config.threads,
            "opened datastore"
        );
        Ok(Self::with_handles(remote, index))
    }

    /// Wrap already-open handles.
    pub fn with_handles(remote: Arc<dyn ObjectStore>, index: Arc<dyn MetadataIndex>) -> Self {
        Self {
            shared: Arc::new(Shared {
                handles: RwLock::new(Some(Handles { remote, index })),
            }),
        }
    }

    /// The remote object id `key` is stored under.
    pub fn oid_of(&self, key: &Key) -> ObjectId {
        ObjectId::derive(key.as_bytes())
    }

    /// Store `value` under `key`. With `overwrite` unset, the remote write
    /// fails if a payload already exists under the key's object id.
    pub fn put_with_overwrite(
        &self,
        key: &Key,
        value: &[u8],
        overwrite: bool,
    ) -> DatastoreResult<()> {
        let oid = self.oid_of(key);
        self.shared.with_write(|h| {
            if let Err(e) = h.remote.put(&oid, value, overwrite) {
                error!(key = %key, oid = %oid, error = %e, "remote put failed");
                return Err(e.into());
            }

            let record = MetadataRecord::new(value.len() as u64).encode();
            if let Err(e) = h.index.put(key.as_bytes(), &record) {
                error!(key = %key, oid = %oid, error = %e, "index put failed");
                // The payload under oid is no longer the one any record describes.
                if let Err(rollback) = h.remote.delete(&oid) {
                    error!(
                        key = %key,
                        oid = %oid,
                        error = %rollback,
                        "rollback of remote payload failed, payload orphaned"
                    );
                }
                return Err(e.into());
            }

            debug!(key = %key, oid = %oid, size = value.len(), "put");
            Ok(())
        })
    }

    fn plan(query: &Query) -> (KeyRange, Direction, Query) {
        let mut residual = query.clone();

        let prefix = Key::new(query.prefix.as_bytes());
        let range = if prefix.is_root() {
            KeyRange::all()
        } else {
            let mut start = prefix.into_bytes();
            start.push(b'/');
            KeyRange::prefix(&start)
        };
        residual.prefix = Key::root();

        let direction = match query.orders.first() {
            Some(Order::ByKey) => {
                residual.orders.clear();
                Direction::Forward
            }
            Some(Order::ByKeyDescending) => {
                residual.orders.clear();
                Direction::Reverse
            }
            _ => Direction::Forward,
        };

        (range, direction, residual)
    }
}

impl Readable for DualDatastore {
    fn has(&self, key: &Key) -> DatastoreResult<bool> {
        self.shared.with_read(|h| Ok(h.index.has(key.as_bytes())?))
    }

    fn get(&self, key: &Key) -> DatastoreResult<Vec<u8>> {
        self.shared.with_read(|h| {
            if !h.index.has(key.as_bytes())? {
                return Err(DatastoreError::NotFound(key.clone()));
            }
            let value = fetch_payload(h, key)?;
            debug!(key = %key, size = value.len(), "get");
            Ok(value)
        })
    }

    fn get_size(&self, key: &Key) -> DatastoreResult<u64> {
        self.shared.with_read(|h| {
            let bytes = h
                .index
                .get(key.as_bytes())?
                .ok_or_else(|| DatastoreError::NotFound(key.clone()))?;
            Ok(MetadataRecord::decode(key.as_bytes(), &bytes)?.size)
        })
    }
}

impl Writable for DualDatastore {
    fn put(&self, key: &Key, value: &[u8]) -> DatastoreResult<()> {
        self.put_with_overwrite(key, value, true)
    }

    fn delete(&self, key: &Key) -> DatastoreResult<()> {
        let oid = self.oid_of(key);
        self.shared.with_write(|h| {
            if !h.index.has(key.as_bytes())? {
                debug!(key = %key, "delete of absent key");
                return Ok(());
            }

            if let Err(e) = h.index.delete(key.as_bytes()) {
                error!(key = %key, error = %e, "index delete failed");
                return Err(e.into());
            }

            match h.remote.delete(&oid) {
                Ok(()) => {
                    debug!(key = %key, oid = %oid, "delete");
                    Ok(())
                }
                Err(e) if e.is_not_found() => {
                    warn!(key = %key, oid = %oid, "remote payload already gone");
                    Ok(())
                }
                Err(e) => {
                    error!(
                        key = %key,
                        oid = %oid,
                        error = %e,
                        "remote delete failed, payload orphaned"
                    );
                    Err(e.into())
                }
            }
        })
    }
}

impl Queryable for DualDatastore {
    fn query(&self, query: Query) -> DatastoreResult<Results> {
        self.shared.with_read(|_| Ok(()))?;
        let (range, direction, residual) = Self::plan(&query);
        debug!(prefix = %query.prefix, ?direction, keys_only = query.keys_only, "query");

        let scan = IndexScan::new(
            Arc::clone(&self.shared),
            IndexCursor::new(range, direction),
            query.keys_only,
        );
        let stream = naive::apply(&residual, Box::new(scan));
        Ok(Results::new(query, stream))
    }
}

impl Batchable for DualDatastore {
    fn batch(&self) -> DatastoreResult<Batch<'_>> {
        self.shared.with_read(|_| Ok(()))?;
        Ok(Batch::new(self))
    }
}

impl PersistentDatastore for DualDatastore {
    fn disk_usage(&self) -> DatastoreResult<u64> {
        self.shared.with_read(|h| {
            let Some(dir) = h.index.path() else {
                return Ok(0);
            };
            let mut total = 0;
            for entry in WalkDir::new(dir) {
                let entry = entry.map_err(std::io::Error::from)?;
                if entry.file_type().is_file() {
                    total += entry.metadata().map_err(std::io::Error::from)?.len();
                }
            }
            Ok(total)
        })
    }
}

impl Datastore for DualDatastore {
    fn sync(&self, _prefix: &Key) -> DatastoreResult<()> {
        // Both stores are durable when each write returns.
        self.shared.with_read(|_| Ok(()))
    }

    fn close(&self) -> DatastoreResult<()> {
        let taken = self
            .shared
            .handles
            .write()
            .map_err(|_| DatastoreError::LockPoisoned)?
            .take();
        let Some(handles) = taken else {
            return Ok(());
        };

        let index_result = handles.index.close();
        let remote_result = handles.remote.close();
        if let (Err(index_err), Err(remote_err)) = (&index_result, &remote_result) {
            error!(index = %index_err, remote = %remote_err, "both stores failed to close");
        }
        index_result?;
        remote_result?;
        info!("closed datastore");
        Ok(())
    }
}

impl std::fmt::Debug for DualDatastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = self
            .shared
            .handles
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false);
        f.debug_struct("DualDatastore").field("open", &open).finish()
    }
}

const _: () = {
    fn assert_capabilities<T: Datastore + Batchable + PersistentDatastore + Send + Sync>() {}
    #[allow(dead_code)]
    fn check() {
        assert_capabilities::<DualDatastore>();
    }
};
