//! Remote object store handle for dualkv.
//!
//! Payloads live in a remote, identifier-addressed object store. This crate
//! defines the contract the datastore consumes from that store and ships two
//! drivers for it.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsObjectStore`] -- one directory per index, one CRC-framed file per object
//!
//! # Design Rules
//!
//! 1. Objects are addressed only by [`ObjectId`](dualkv_types::ObjectId).
//! 2. Absence is always [`StoreError::NotFound`], never a generic failure.
//! 3. Every operation is synchronous and blocking.
//! 4. A closed handle rejects every operation with [`StoreError::Closed`].
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use traits::ObjectStore;
