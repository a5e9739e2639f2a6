//! Error types for metadata index operations.

use thiserror::Error;

/// Errors that can occur during metadata index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("redb error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("redb table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("redb transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),

    #[error("redb commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// A stored record does not have the expected encoding.
    #[error("corrupt metadata record for key {key}: {len} bytes")]
    CorruptRecord { key: String, len: usize },

    /// The index has been closed.
    #[error("metadata index is closed")]
    Closed,

    /// A lock guarding in-memory state was poisoned by a panicking thread.
    #[error("lock poisoned: {0}")]
    Poisoned(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<redb::TransactionError> for IndexError {
    fn from(e: redb::TransactionError) -> Self {
        Self::Transaction(Box::new(e))
    }
}

/// Convenience type alias for index operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;
