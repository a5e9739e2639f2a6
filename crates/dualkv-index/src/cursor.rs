//! Resumable iteration position over a [`MetadataIndex`].

use crate::error::IndexResult;
use crate::range::{Direction, KeyRange};
use crate::traits::{IndexEntry, MetadataIndex};

/// Iteration state over a key range: the range, the direction and the last
/// key handed out.
///
/// The cursor does not borrow the index. Each [`advance`](Self::advance)
/// takes the index by reference, so callers can drop any lock they hold on it
/// between steps.
#[derive(Clone, Debug)]
pub struct IndexCursor {
    range: KeyRange,
    direction: Direction,
    position: Option<Vec<u8>>,
    exhausted: bool,
}

impl IndexCursor {
    pub fn new(range: KeyRange, direction: Direction) -> Self {
        Self {
            range,
            direction,
            position: None,
            exhausted: false,
        }
    }

    pub fn range(&self) -> &KeyRange {
        &self.range
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The last key returned by [`advance`](Self::advance), if any.
    pub fn position(&self) -> Option<&[u8]> {
        self.position.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Step to the next entry. Returns `Ok(None)` and stays exhausted once
    /// the range has been fully walked. An error leaves the position
    /// unchanged.
    pub fn advance(&mut self, index: &dyn MetadataIndex) -> IndexResult<Option<IndexEntry>> {
        if self.exhausted {
            return Ok(None);
        }
        match index.seek(&self.range, self.position.as_deref(), self.direction)? {
            Some((key, record)) => {
                self.position = Some(key.clone());
                Ok(Some((key, record)))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}
