use std::path::PathBuf;

use dualkv_types::{IndexId, ObjectId};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The object exists and the write did not allow overwriting it.
    #[error("object already exists: {0}")]
    AlreadyExists(ObjectId),

    /// The index does not exist and was not created on open.
    #[error("index not found: {0}")]
    IndexNotFound(IndexId),

    /// The stored frame failed its length or checksum check.
    #[error("corrupt object {id} at {path}: {reason}")]
    Corrupt {
        id: ObjectId,
        path: PathBuf,
        reason: String,
    },

    /// The handle has been closed.
    #[error("object store is closed")]
    Closed,

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
