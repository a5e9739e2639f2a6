use dualkv_types::ObjectId;

use crate::error::StoreResult;

/// Handle on one open index of the remote object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are addressed by [`ObjectId`] only; the store never sees logical keys.
/// - A missing object is reported as `StoreError::NotFound`, distinguishable
///   from every other failure.
/// - Calls block the calling thread until the store has acknowledged them.
/// - After [`close`](ObjectStore::close) every call fails with `StoreError::Closed`.
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `id`.
    ///
    /// With `overwrite = false`, an existing object is left untouched and the
    /// call fails with `StoreError::AlreadyExists`.
    fn put(&self, id: &ObjectId, data: &[u8], overwrite: bool) -> StoreResult<()>;

    /// Fetch the payload stored under `id`.
    fn get(&self, id: &ObjectId) -> StoreResult<Vec<u8>>;

    /// Remove the payload stored under `id`. Fails with `NotFound` if absent.
    fn delete(&self, id: &ObjectId) -> StoreResult<()>;

    /// Check whether an object exists.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Size in bytes of the payload stored under `id`.
    fn size_of(&self, id: &ObjectId) -> StoreResult<u64>;

    /// Release the handle.
    fn close(&self) -> StoreResult<()>;
}
