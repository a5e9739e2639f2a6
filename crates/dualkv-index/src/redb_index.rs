//! Persistent metadata index backed by redb.
//!
//! The database lives in a single file inside the index directory. Every
//! mutation runs in its own write transaction committed with immediate
//! durability, so a record is on disk when `put`/`delete` return.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use redb::{Database, Durability, ReadableTable, TableDefinition};
use tracing::{debug, info};

use crate::error::{IndexError, IndexResult};
use crate::range::{Direction, KeyRange};
use crate::traits::{IndexEntry, MetadataIndex};

/// Key: logical key bytes, Value: encoded `MetadataRecord`.
const RECORDS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("records");

/// File name of the database inside the index directory.
pub const DATABASE_FILE: &str = "metadata.redb";

/// Metadata index persisted with redb.
pub struct RedbIndex {
    dir: PathBuf,
    db: RwLock<Option<Database>>,
}

impl RedbIndex {
    /// Open (or create) the index stored in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> IndexResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let db = Database::create(dir.join(DATABASE_FILE))?;

        // Create the table eagerly so later read txns don't fail
        let write_txn = db.begin_write()?;
        {
            let _t = write_txn.open_table(RECORDS)?;
        }
        write_txn.commit()?;

        info!(dir = %dir.display(), "opened metadata index");
        Ok(Self {
            dir: dir.to_path_buf(),
            db: RwLock::new(Some(db)),
        })
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> IndexResult<T>) -> IndexResult<T> {
        let guard = self
            .db
            .read()
            .map_err(|e| IndexError::Poisoned(e.to_string()))?;
        let db = guard.as_ref().ok_or(IndexError::Closed)?;
        f(db)
    }
}

impl MetadataIndex for RedbIndex {
    fn has(&self, key: &[u8]) -> IndexResult<bool> {
        self.with_db(|db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(RECORDS)?;
            let found = table.get(key)?.is_some();
            Ok(found)
        })
    }

    fn get(&self, key: &[u8]) -> IndexResult<Option<Vec<u8>>> {
        self.with_db(|db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(RECORDS)?;
            let value = table.get(key)?.map(|guard| guard.value().to_vec());
            Ok(value)
        })
    }

    fn put(&self, key: &[u8], record: &[u8]) -> IndexResult<()> {
        self.with_db(|db| {
            let mut write_txn = db.begin_write()?;
            write_txn.set_durability(Durability::Immediate);
            {
                let mut table = write_txn.open_table(RECORDS)?;
                table.insert(key, record)?;
            }
            write_txn.commit()?;
            debug!(key = %String::from_utf8_lossy(key), "wrote metadata record");
            Ok(())
        })
    }

    fn delete(&self, key: &[u8]) -> IndexResult<()> {
        self.with_db(|db| {
            let mut write_txn = db.begin_write()?;
            write_txn.set_durability(Durability::Immediate);
            {
                let mut table = write_txn.open_table(RECORDS)?;
                table.remove(key)?;
            }
            write_txn.commit()?;
            debug!(key = %String::from_utf8_lossy(key), "removed metadata record");
            Ok(())
        })
    }

    fn seek(
        &self,
        range: &KeyRange,
        after: Option<&[u8]>,
        direction: Direction,
    ) -> IndexResult<Option<IndexEntry>> {
        let Some(bounds) = range.bounds_after(after, direction) else {
            return Ok(None);
        };
        self.with_db(|db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(RECORDS)?;
            let mut iter = table.range::<&[u8]>(bounds)?;
            let entry = match direction {
                Direction::Forward => iter.next(),
                Direction::Reverse => iter.next_back(),
            };
            match entry {
                Some(entry) => {
                    let (k, v) = entry?;
                    Ok(Some((k.value().to_vec(), v.value().to_vec())))
                }
                None => Ok(None),
            }
        })
    }

    fn close(&self) -> IndexResult<()> {
        let mut guard = self
            .db
            .write()
            .map_err(|e| IndexError::Poisoned(e.to_string()))?;
        match guard.take() {
            Some(db) => {
                drop(db);
                info!(dir = %self.dir.display(), "closed metadata index");
                Ok(())
            }
            None => Err(IndexError::Closed),
        }
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.dir)
    }
}

impl std::fmt::Debug for RedbIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbIndex").field("dir", &self.dir).finish()
    }
}
