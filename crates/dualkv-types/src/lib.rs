//! Foundation types for dualkv.
//!
//! Every other dualkv crate depends on `dualkv-types`.
//!
//! # Key Types
//!
//! - [`Key`]: Caller-visible hierarchical key (a `/`-separated byte path)
//! - [`ObjectId`]: 128-bit identifier addressing a payload in the remote store
//! - [`IndexId`]: Identifier of a namespace ("index") inside the remote store

pub mod error;
pub mod index_id;
pub mod key;
pub mod object;

pub use error::TypeError;
pub use index_id::IndexId;
pub use key::Key;
pub use object::ObjectId;
