//! Metadata record encoding.
//!
//! A record is exactly 8 bytes: the payload length as a big-endian `u64`.

use crate::error::{IndexError, IndexResult};

/// Durability record kept in the index for every live key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetadataRecord {
    /// Payload length in bytes.
    pub size: u64,
}

impl MetadataRecord {
    /// Encoded length in bytes.
    pub const ENCODED_LEN: usize = 8;

    pub fn new(size: u64) -> Self {
        Self { size }
    }

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        self.size.to_be_bytes()
    }

    /// Decode the record stored under `key`.
    pub fn decode(key: &[u8], bytes: &[u8]) -> IndexResult<Self> {
        let arr: [u8; Self::ENCODED_LEN] =
            bytes.try_into().map_err(|_| IndexError::CorruptRecord {
                key: String::from_utf8_lossy(key).into_owned(),
                len: bytes.len(),
            })?;
        Ok(Self {
            size: u64::from_be_bytes(arr),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_big_endian() {
        assert_eq!(MetadataRecord::new(5).encode(), [0, 0, 0, 0, 0, 0, 0, 5]);
        assert_eq!(
            MetadataRecord::new(0x0102_0304_0506_0708).encode(),
            [1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn decode_reads_encoded_size() {
        let record = MetadataRecord::new(1 << 40);
        assert_eq!(MetadataRecord::decode(b"/k", &record.encode()).unwrap(), record);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let err = MetadataRecord::decode(b"/k", &[1]).unwrap_err();
        assert!(matches!(err, IndexError::CorruptRecord { ref key, len: 1 } if key == "/k"));
        assert!(MetadataRecord::decode(b"/k", &[0; 9]).is_err());
        assert!(MetadataRecord::decode(b"/k", &[]).is_err());
    }
}
