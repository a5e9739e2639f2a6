use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller-visible logical key.
///
/// A key is a `/`-separated byte path such as `/a/b/c`. [`Key::new`] cleans
/// its input into canonical form: a single leading `/`, no empty segments,
/// no trailing `/`. The root key is `/`. Keys order by their raw bytes, the
/// same order the local metadata index iterates in.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(Vec<u8>);

impl Key {
    /// Build a key in canonical form.
    pub fn new(path: impl AsRef<[u8]>) -> Self {
        let mut out = Vec::with_capacity(path.as_ref().len() + 1);
        for segment in path.as_ref().split(|b| *b == b'/') {
            if segment.is_empty() {
                continue;
            }
            out.push(b'/');
            out.extend_from_slice(segment);
        }
        if out.is_empty() {
            out.push(b'/');
        }
        Self(out)
    }

    /// Wrap bytes exactly as given, skipping normalization. Used for keys
    /// read back from the metadata index, which were canonical on write.
    pub fn from_raw(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The root key `/`.
    pub fn root() -> Self {
        Self(vec![b'/'])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == b"/"
    }

    /// The key one level up. The parent of a top-level key, and of the root,
    /// is the root.
    pub fn parent(&self) -> Key {
        match self.0.iter().rposition(|b| *b == b'/') {
            Some(0) | None => Key::root(),
            Some(idx) => Key(self.0[..idx].to_vec()),
        }
    }

    /// Last path segment (empty for the root).
    pub fn name(&self) -> &[u8] {
        match self.0.iter().rposition(|b| *b == b'/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Append a segment (cleaned like [`Key::new`]).
    pub fn child(&self, segment: impl AsRef<[u8]>) -> Key {
        let mut joined = self.0.clone();
        joined.push(b'/');
        joined.extend_from_slice(segment.as_ref());
        Key::new(joined)
    }

    /// Whether `other` lives strictly below this key.
    pub fn is_ancestor_of(&self, other: &Key) -> bool {
        if self.is_root() {
            return !other.is_root();
        }
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0[self.0.len()] == b'/'
    }
}

impl Default for Key {
    fn default() -> Self {
        Key::root()
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({self})")
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::new(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::new(s)
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
