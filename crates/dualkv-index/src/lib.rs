//! Local metadata index for dualkv.
//!
//! The index maps every live logical key to a small [`MetadataRecord`] and is
//! the single source of truth for whether a key exists. It iterates keys in
//! byte order, forwards or backwards, within a [`KeyRange`].
//!
//! # Modules
//!
//! - [`error`]: Error types for index operations
//! - [`range`]: [`KeyRange`] bounds and iteration [`Direction`]
//! - [`record`]: The on-disk [`MetadataRecord`] encoding
//! - [`traits`]: The [`MetadataIndex`] trait defining the storage interface
//! - [`cursor`]: [`IndexCursor`], a resumable position over an index
//! - [`redb_index`]: Persistent [`RedbIndex`]
//! - [`memory`]: In-memory [`InMemoryIndex`] for tests

pub mod cursor;
pub mod error;
pub mod memory;
pub mod range;
pub mod record;
pub mod redb_index;
pub mod traits;

pub use cursor::IndexCursor;
pub use error::{IndexError, IndexResult};
pub use memory::InMemoryIndex;
pub use range::{Direction, KeyRange};
pub use record::MetadataRecord;
pub use redb_index::RedbIndex;
pub use traits::{IndexEntry, MetadataIndex};
