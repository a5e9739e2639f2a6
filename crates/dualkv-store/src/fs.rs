//! Filesystem object store driver.
//!
//! Each index is a directory under the store root, named by the index id in
//! fixed-width hex. Each object is a file in that directory named by its
//! [`ObjectId`] hex, holding one frame:
//!
//! ```text
//! [4 bytes: payload length (little-endian u32)]
//! [4 bytes: CRC32 of payload (little-endian u32)]
//! [N bytes: payload]
//! ```
//!
//! Writes land in a temp file in the index directory and are renamed into
//! place after `fsync`, so readers never see a torn frame.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use dualkv_types::{IndexId, ObjectId};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Object store keeping one CRC-framed file per object.
#[derive(Debug)]
pub struct FsObjectStore {
    index: IndexId,
    dir: PathBuf,
    closed: AtomicBool,
}

impl FsObjectStore {
    /// Open the index `index` under `root`.
    ///
    /// A missing index directory is created when `create_if_missing` is set,
    /// otherwise the call fails with `StoreError::IndexNotFound`.
    pub fn open(root: &Path, index: IndexId, create_if_missing: bool) -> StoreResult<Self> {
        let dir = root.join(index.to_hex());
        if !dir.is_dir() {
            if !create_if_missing {
                return Err(StoreError::IndexNotFound(index));
            }
            fs::create_dir_all(&dir)?;
            info!(index = %index, dir = %dir.display(), "created object index");
        }
        Ok(Self {
            index,
            dir,
            closed: AtomicBool::new(false),
        })
    }

    pub fn index(&self) -> IndexId {
        self.index
    }

    /// Directory holding this index's objects.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.dir.join(id.to_hex())
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

fn encode_frame(data: &[u8]) -> StoreResult<Vec<u8>> {
    let length = u32::try_from(data.len()).map_err(|_| {
        StoreError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("payload of {} bytes exceeds frame limit", data.len()),
        ))
    })?;
    let mut frame = Vec::with_capacity(HEADER_SIZE + data.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(data).to_le_bytes());
    frame.extend_from_slice(data);
    Ok(frame)
}

fn decode_frame(id: &ObjectId, path: &Path, mut frame: Vec<u8>) -> StoreResult<Vec<u8>> {
    let corrupt = |reason: String| StoreError::Corrupt {
        id: *id,
        path: path.to_path_buf(),
        reason,
    };
    if frame.len() < HEADER_SIZE {
        return Err(corrupt(format!("frame of {} bytes is shorter than its header", frame.len())));
    }
    let length = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    let expected_crc = u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]);
    if length != frame.len() - HEADER_SIZE {
        return Err(corrupt(format!(
            "header length {length} does not match payload length {}",
            frame.len() - HEADER_SIZE
        )));
    }
    let payload = frame.split_off(HEADER_SIZE);
    let actual_crc = crc32fast::hash(&payload);
    if actual_crc != expected_crc {
        return Err(corrupt(format!(
            "CRC mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"
        )));
    }
    Ok(payload)
}

fn not_found_as(id: &ObjectId, e: io::Error) -> StoreError {
    if e.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(*id)
    } else {
        StoreError::Io(e)
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, id: &ObjectId, data: &[u8], overwrite: bool) -> StoreResult<()> {
        self.check_open()?;
        let path = self.object_path(id);
        let frame = encode_frame(data)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&frame)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;

        if overwrite {
            tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        } else {
            tmp.persist_noclobber(&path).map_err(|e| {
                if e.error.kind() == io::ErrorKind::AlreadyExists {
                    StoreError::AlreadyExists(*id)
                } else {
                    StoreError::Io(e.error)
                }
            })?;
        }
        debug!(oid = %id, size = data.len(), index = %self.index, "put object");
        Ok(())
    }

    fn get(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        self.check_open()?;
        let path = self.object_path(id);
        let frame = fs::read(&path).map_err(|e| not_found_as(id, e))?;
        let payload = decode_frame(id, &path, frame)?;
        debug!(oid = %id, size = payload.len(), index = %self.index, "get object");
        Ok(payload)
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<()> {
        self.check_open()?;
        fs::remove_file(self.object_path(id)).map_err(|e| not_found_as(id, e))?;
        debug!(oid = %id, index = %self.index, "deleted object");
        Ok(())
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        self.check_open()?;
        Ok(self.object_path(id).try_exists()?)
    }

    fn size_of(&self, id: &ObjectId) -> StoreResult<u64> {
        self.check_open()?;
        let path = self.object_path(id);
        let len = fs::metadata(&path).map_err(|e| not_found_as(id, e))?.len();
        len.checked_sub(HEADER_SIZE as u64).ok_or_else(|| StoreError::Corrupt {
            id: *id,
            path,
            reason: format!("file of {len} bytes is shorter than its header"),
        })
    }

    fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(StoreError::Closed);
        }
        info!(index = %self.index, "closed object index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn index() -> IndexId {
        "0x7800000000000123:0x456".parse().unwrap()
    }

    fn open_store(root: &TempDir) -> FsObjectStore {
        FsObjectStore::open(root.path(), index(), true).unwrap()
    }

    fn oid(key: &str) -> ObjectId {
        ObjectId::derive(key.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Open
    // -----------------------------------------------------------------------

    #[test]
    fn open_missing_index_without_create_fails() {
        let root = TempDir::new().unwrap();
        let err = FsObjectStore::open(root.path(), index(), false).unwrap_err();
        assert!(matches!(err, StoreError::IndexNotFound(id) if id == index()));
    }

    #[test]
    fn open_creates_index_directory() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root);
        assert!(store.dir().is_dir());
        assert_eq!(store.dir(), root.path().join(index().to_hex()));

        // Reopening without create now succeeds.
        FsObjectStore::open(root.path(), index(), false).unwrap();
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn put_get_roundtrip() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root);
        store.put(&oid("/a"), b"hello", true).unwrap();
        assert_eq!(store.get(&oid("/a")).unwrap(), b"hello");
        assert_eq!(store.size_of(&oid("/a")).unwrap(), 5);
        assert!(store.exists(&oid("/a")).unwrap());
    }

    #[test]
    fn objects_survive_reopen() {
        let root = TempDir::new().unwrap();
        {
            let store = open_store(&root);
            store.put(&oid("/persist"), b"durable", true).unwrap();
            store.close().unwrap();
        }
        let store = FsObjectStore::open(root.path(), index(), false).unwrap();
        assert_eq!(store.get(&oid("/persist")).unwrap(), b"durable");
    }

    #[test]
    fn overwrite_flag_controls_replacement() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root);
        store.put(&oid("/a"), b"one", false).unwrap();
        assert!(matches!(
            store.put(&oid("/a"), b"two", false),
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(store.get(&oid("/a")).unwrap(), b"one");

        store.put(&oid("/a"), b"two", true).unwrap();
        assert_eq!(store.get(&oid("/a")).unwrap(), b"two");
    }

    #[test]
    fn missing_object_is_not_found() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root);
        assert!(store.get(&oid("/nope")).unwrap_err().is_not_found());
        assert!(store.size_of(&oid("/nope")).unwrap_err().is_not_found());
        assert!(store.delete(&oid("/nope")).unwrap_err().is_not_found());
        assert!(!store.exists(&oid("/nope")).unwrap());
    }

    #[test]
    fn delete_removes_file() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root);
        store.put(&oid("/a"), b"x", true).unwrap();
        store.delete(&oid("/a")).unwrap();
        assert!(!store.dir().join(oid("/a").to_hex()).exists());
    }

    // -----------------------------------------------------------------------
    // Frame integrity
    // -----------------------------------------------------------------------

    #[test]
    fn flipped_payload_byte_is_corrupt() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root);
        store.put(&oid("/a"), b"payload", true).unwrap();

        let path = store.dir().join(oid("/a").to_hex());
        let mut raw = fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        fs::write(&path, raw).unwrap();

        let err = store.get(&oid("/a")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(err.to_string().contains("CRC mismatch"));
    }

    #[test]
    fn truncated_frame_is_corrupt() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root);
        store.put(&oid("/a"), b"payload", true).unwrap();

        let path = store.dir().join(oid("/a").to_hex());
        let raw = fs::read(&path).unwrap();
        fs::write(&path, &raw[..raw.len() - 2]).unwrap();
        assert!(matches!(store.get(&oid("/a")), Err(StoreError::Corrupt { .. })));

        fs::write(&path, &raw[..3]).unwrap();
        assert!(matches!(store.get(&oid("/a")), Err(StoreError::Corrupt { .. })));
        assert!(matches!(store.size_of(&oid("/a")), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn frame_header_layout() {
        let frame = encode_frame(b"abc").unwrap();
        assert_eq!(&frame[..4], &3u32.to_le_bytes());
        assert_eq!(&frame[4..8], &crc32fast::hash(b"abc").to_le_bytes());
        assert_eq!(&frame[8..], b"abc");
    }

    // -----------------------------------------------------------------------
    // Close
    // -----------------------------------------------------------------------

    #[test]
    fn closed_store_rejects_operations() {
        let root = TempDir::new().unwrap();
        let store = open_store(&root);
        store.close().unwrap();
        assert!(matches!(store.put(&oid("/a"), b"x", true), Err(StoreError::Closed)));
        assert!(matches!(store.exists(&oid("/a")), Err(StoreError::Closed)));
        assert!(matches!(store.close(), Err(StoreError::Closed)));
    }
}
