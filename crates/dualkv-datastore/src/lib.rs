//! Dual-store key-value datastore.
//!
//! Callers see one key-value store with range queries. Underneath, values
//! live in a remote object store addressed by a 128-bit
//! [`ObjectId`](dualkv_types::ObjectId) derived from each key, while a fast
//! local [`MetadataIndex`](dualkv_index::MetadataIndex) records which keys
//! exist and how large their payloads are.
//!
//! # Consistency
//!
//! The local index is the single source of truth for existence. `put`
//! writes the remote payload before the index record and rolls the payload
//! back if the record cannot be written; `delete` removes the index record
//! before the payload. The only inconsistency either can leave behind is an
//! orphaned remote payload, which no caller can observe.
//!
//! # Modules
//!
//! - [`datastore`]: [`DualDatastore`], the coordinator
//! - [`query`]: Query model: [`Query`], [`Filter`], [`Order`], [`Entry`]
//! - [`results`]: Lazy [`Results`] streamed from the index
//! - [`naive`]: In-memory filter/order/offset/limit pass
//! - [`batch`]: Unordered, non-atomic [`Batch`]
//! - [`traits`]: Capability traits implemented by the datastore
//! - [`config`]: [`DatastoreConfig`] loading and validation
//! - [`error`]: [`DatastoreError`]

pub mod batch;
pub mod config;
pub mod datastore;
pub mod error;
pub mod naive;
pub mod query;
pub mod results;
pub mod traits;

#[cfg(test)]
mod test_support;

pub use batch::{Batch, BatchOp};
pub use config::DatastoreConfig;
pub use datastore::DualDatastore;
pub use error::{DatastoreError, DatastoreResult};
pub use query::{CompareOp, Entry, Filter, Order, Query, QueryResult};
pub use results::Results;
pub use traits::{Batchable, Datastore, PersistentDatastore, Queryable, Readable, Writable};
