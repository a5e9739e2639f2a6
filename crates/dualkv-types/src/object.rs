use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const FNV128_OFFSET_BASIS: u128 = 0x6c62_272e_07bb_0142_62b8_2175_6295_c58d;
const FNV128_PRIME: u128 = 0x0000_0000_0100_0000_0000_0000_0000_013b;

/// Identifier addressing a payload in the remote object store.
///
/// An `ObjectId` is the 128-bit FNV-1a hash of a logical key's bytes, stored
/// big-endian. The hash is unseeded, so the same key maps to the same
/// `ObjectId` in every process. It is not collision-resistant: two distinct
/// keys that hash alike address the same remote payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; 16]);

impl ObjectId {
    /// Length of an identifier in bytes.
    pub const LEN: usize = 16;

    /// Derive the identifier for a logical key.
    pub fn derive(key: &[u8]) -> Self {
        let mut hash = FNV128_OFFSET_BASIS;
        for byte in key {
            hash ^= u128::from(*byte);
            hash = hash.wrapping_mul(FNV128_PRIME);
        }
        Self(hash.to_be_bytes())
    }

    /// Create an `ObjectId` from raw identifier bytes.
    pub const fn from_raw(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// The raw 16 bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Most significant 64 bits.
    pub fn hi(&self) -> u64 {
        (self.as_u128() >> 64) as u64
    }

    /// Least significant 64 bits.
    pub fn lo(&self) -> u64 {
        self.as_u128() as u64
    }

    fn as_u128(&self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Full 32-character hex encoding. Used as the object file name by
    /// filesystem drivers.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 32-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 16] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TypeError::InvalidLength {
                expected: Self::LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({self})")
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}:0x{:x}", self.hi(), self.lo())
    }
}

impl From<[u8; 16]> for ObjectId {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl From<ObjectId> for [u8; 16] {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}
