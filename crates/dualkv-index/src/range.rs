//! Key ranges and iteration direction.

use std::ops::Bound;

/// Iteration order over index keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Ascending byte order.
    Forward,
    /// Descending byte order, starting from the last key.
    Reverse,
}

/// Half-open key interval `[start, limit)`. `None` leaves a side unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Option<Vec<u8>>,
    pub limit: Option<Vec<u8>>,
}

impl KeyRange {
    /// The whole keyspace.
    pub fn all() -> Self {
        Self::default()
    }

    /// Every key starting with `prefix`.
    ///
    /// The limit is `prefix` with trailing `0xff` bytes dropped and its last
    /// remaining byte incremented; a prefix of only `0xff` bytes (or an empty
    /// prefix) has no upper bound.
    pub fn prefix(prefix: &[u8]) -> Self {
        let limit = prefix.iter().rposition(|b| *b < 0xff).map(|idx| {
            let mut limit = prefix[..=idx].to_vec();
            limit[idx] += 1;
            limit
        });
        Self {
            start: Some(prefix.to_vec()),
            limit,
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.start.as_deref().map_or(true, |s| key >= s)
            && self.limit.as_deref().map_or(true, |l| key < l)
    }

    /// Bounds of the keys still ahead of a cursor sitting on `after`.
    ///
    /// Returns `None` when nothing can remain, so backends never see an
    /// inverted range.
    pub fn bounds_after<'a>(
        &'a self,
        after: Option<&'a [u8]>,
        direction: Direction,
    ) -> Option<(Bound<&'a [u8]>, Bound<&'a [u8]>)> {
        let mut lower = match self.start.as_deref() {
            Some(s) => Bound::Included(s),
            None => Bound::Unbounded,
        };
        let mut upper = match self.limit.as_deref() {
            Some(l) => Bound::Excluded(l),
            None => Bound::Unbounded,
        };
        if let Some(after) = after {
            match direction {
                Direction::Forward => {
                    if self.start.as_deref().map_or(true, |s| after >= s) {
                        lower = Bound::Excluded(after);
                    }
                }
                Direction::Reverse => {
                    if self.limit.as_deref().map_or(true, |l| after < l) {
                        upper = Bound::Excluded(after);
                    }
                }
            }
        }
        let empty = match (lower, upper) {
            (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
            (Bound::Included(lo), Bound::Excluded(hi))
            | (Bound::Excluded(lo), Bound::Included(hi))
            | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
            _ => false,
        };
        if empty {
            None
        } else {
            Some((lower, upper))
        }
    }
}
