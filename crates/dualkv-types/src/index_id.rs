use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of an index (key-value namespace) in the remote object store.
///
/// Textual form is `<hi>:<lo>`, both halves hexadecimal with an optional
/// `0x` prefix, e.g. `0x7800000000000123:0x456`. The most significant byte
/// of `hi` carries the entity type tag and must be [`IndexId::TYPE_TAG`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexId {
    hi: u64,
    lo: u64,
}

impl IndexId {
    /// Type tag expected in the most significant byte of `hi`.
    pub const TYPE_TAG: u8 = 0x78;

    pub fn new(hi: u64, lo: u64) -> Result<Self, TypeError> {
        let id = Self { hi, lo };
        if (hi >> 56) as u8 != Self::TYPE_TAG {
            return Err(TypeError::InvalidIndexId {
                id: id.to_string(),
                reason: format!(
                    "must start with 0x{tag:x} in the most significant byte, \
                     for example: 0x{tag:x}00000000000123:0x456",
                    tag = Self::TYPE_TAG
                ),
            });
        }
        Ok(id)
    }

    pub fn hi(&self) -> u64 {
        self.hi
    }

    pub fn lo(&self) -> u64 {
        self.lo
    }

    /// Fixed-width hex form, safe for use as a directory name.
    pub fn to_hex(&self) -> String {
        format!("{:016x}{:016x}", self.hi, self.lo)
    }
}

fn parse_half(s: &str, whole: &str) -> Result<u64, TypeError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| TypeError::InvalidIndexId {
        id: whole.to_string(),
        reason: e.to_string(),
    })
}

impl FromStr for IndexId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hi, lo) = s.trim().split_once(':').ok_or_else(|| TypeError::InvalidIndexId {
            id: s.to_string(),
            reason: "expected <hi>:<lo>".to_string(),
        })?;
        Self::new(parse_half(hi, s)?, parse_half(lo, s)?)
    }
}

impl fmt::Debug for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexId({self})")
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}:0x{:x}", self.hi, self.lo)
    }
}
