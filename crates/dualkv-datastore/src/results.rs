//! Lazy query results.

use std::sync::Arc;

use dualkv_index::{IndexCursor, MetadataRecord};
use dualkv_types::Key;

use crate::datastore::{fetch_payload, Shared};
use crate::error::DatastoreResult;
use crate::query::{Entry, Query, QueryResult};

/// Results of a query, pulled one entry at a time.
///
/// The first error ends the stream: it is yielded once and every later call
/// to `next` returns `None`. Results cannot be restarted; run the query
/// again instead.
pub struct Results {
    query: Query,
    inner: Box<dyn Iterator<Item = QueryResult> + Send>,
    done: bool,
}

impl Results {
    pub(crate) fn new(query: Query, inner: Box<dyn Iterator<Item = QueryResult> + Send>) -> Self {
        Self {
            query,
            inner,
            done: false,
        }
    }

    /// The query as submitted.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Collect the remaining entries, or the first error.
    pub fn rest(self) -> DatastoreResult<Vec<Entry>> {
        self.collect()
    }
}

impl Iterator for Results {
    type Item = QueryResult;

    fn next(&mut self) -> Option<QueryResult> {
        if self.done {
            return None;
        }
        match self.inner.next() {
            Some(Ok(entry)) => Some(Ok(entry)),
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl std::fmt::Debug for Results {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Results")
            .field("query", &self.query)
            .field("done", &self.done)
            .finish()
    }
}

/// Walks the metadata index and fetches payloads on demand.
///
/// The datastore read lock is taken for each step only, so writers can run
/// between steps. The cursor resumes strictly past the last key it returned,
/// which means keys written ahead of it during iteration are seen.
pub(crate) struct IndexScan {
    shared: Arc<Shared>,
    cursor: IndexCursor,
    keys_only: bool,
    done: bool,
}

impl IndexScan {
    pub(crate) fn new(shared: Arc<Shared>, cursor: IndexCursor, keys_only: bool) -> Self {
        Self {
            shared,
            cursor,
            keys_only,
            done: false,
        }
    }

    fn step(&mut self) -> DatastoreResult<Option<Entry>> {
        let cursor = &mut self.cursor;
        let keys_only = self.keys_only;
        self.shared.with_read(|handles| {
            let Some((raw_key, record)) = cursor.advance(handles.index.as_ref())? else {
                return Ok(None);
            };
            let size = MetadataRecord::decode(&raw_key, &record)?.size;
            let key = Key::from_raw(raw_key);
            let value = if keys_only {
                None
            } else {
                Some(fetch_payload(handles, &key)?)
            };
            Ok(Some(Entry { key, size, value }))
        })
    }
}

impl Iterator for IndexScan {
    type Item = QueryResult;

    fn next(&mut self) -> Option<QueryResult> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatastoreError;

    fn entry(key: &str) -> QueryResult {
        Ok(Entry {
            key: Key::new(key),
            size: 0,
            value: None,
        })
    }

    #[test]
    fn results_fuse_after_error() {
        let items = vec![entry("/a"), Err(DatastoreError::Closed), entry("/b")];
        let mut results = Results::new(Query::new(), Box::new(items.into_iter()));
        assert!(results.next().unwrap().is_ok());
        assert!(results.next().unwrap().is_err());
        assert!(results.next().is_none());
        assert!(results.next().is_none());
    }

    #[test]
    fn rest_collects_or_fails() {
        let ok = Results::new(Query::new(), Box::new(vec![entry("/a"), entry("/b")].into_iter()));
        assert_eq!(ok.rest().unwrap().len(), 2);

        let failing = Results::new(
            Query::new(),
            Box::new(vec![entry("/a"), Err(DatastoreError::Closed)].into_iter()),
        );
        assert!(matches!(failing.rest(), Err(DatastoreError::Closed)));
    }

    #[test]
    fn query_is_kept() {
        let query = Query::new().with_prefix("/p").limit(4);
        let results = Results::new(query.clone(), Box::new(std::iter::empty()));
        assert_eq!(results.query(), &query);
    }
}
