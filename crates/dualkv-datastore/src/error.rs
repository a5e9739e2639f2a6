use dualkv_index::IndexError;
use dualkv_store::StoreError;
use dualkv_types::{Key, ObjectId};
use thiserror::Error;

/// Errors returned by datastore operations.
#[derive(Debug, Error)]
pub enum DatastoreError {
    /// The key has no record in the metadata index.
    #[error("key not found: {0}")]
    NotFound(Key),

    /// Failure reported by the remote object store.
    #[error("remote store error: {0}")]
    Remote(#[from] StoreError),

    /// Failure reported by the local metadata index.
    #[error("metadata index error: {0}")]
    LocalIndex(#[from] IndexError),

    /// Missing or invalid configuration, raised at construction only.
    #[error("configuration error: {0}")]
    Config(String),

    /// The index holds a record whose remote payload is missing.
    #[error("corruption: key {key} is indexed but object {oid} is missing")]
    Corruption { key: Key, oid: ObjectId },

    #[error("datastore is closed")]
    Closed,

    #[error("datastore lock poisoned")]
    LockPoisoned,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatastoreError {
    /// Returns `true` for [`DatastoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatastoreError::NotFound(_))
    }
}

pub type DatastoreResult<T> = Result<T, DatastoreError>;
