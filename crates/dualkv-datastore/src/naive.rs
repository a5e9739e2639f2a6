//! In-memory post-processing for query clauses the index cannot satisfy.
//!
//! Stages run in a fixed order: key prefix, filters, orders, offset, limit.
//! Every stage except ordering stays lazy. Errors flow through untouched so
//! the consumer sees where iteration stopped.

use crate::query::{compare_by, Order, Query, QueryResult};

type Stream = Box<dyn Iterator<Item = QueryResult> + Send>;

/// Apply the clauses of `query` to `input`.
///
/// The caller clears whatever it already satisfied (a pushed-down prefix is
/// reset to the root, a native key order is removed from `orders`).
pub fn apply(query: &Query, input: Stream) -> Stream {
    let mut stream = input;

    if !query.prefix.is_root() {
        let prefix = query.prefix.clone();
        stream = Box::new(stream.filter(move |item| match item {
            Ok(entry) => prefix.is_ancestor_of(&entry.key),
            Err(_) => true,
        }));
    }

    if !query.filters.is_empty() {
        let filters = query.filters.clone();
        stream = Box::new(stream.filter(move |item| match item {
            Ok(entry) => filters.iter().all(|f| f.matches(entry)),
            Err(_) => true,
        }));
    }

    if !query.orders.is_empty() {
        stream = order(&query.orders, stream);
    }

    if query.offset > 0 {
        let mut remaining = query.offset;
        stream = Box::new(stream.filter(move |item| {
            if item.is_ok() && remaining > 0 {
                remaining -= 1;
                return false;
            }
            true
        }));
    }

    if query.limit > 0 {
        stream = Box::new(Limit {
            inner: stream,
            remaining: query.limit,
        });
    }

    stream
}

/// Materialize and sort. An error anywhere in the input becomes the only
/// item of the output.
fn order(orders: &[Order], input: Stream) -> Stream {
    let mut entries = Vec::new();
    for item in input {
        match item {
            Ok(entry) => entries.push(entry),
            Err(e) => return Box::new(std::iter::once(QueryResult::Err(e))),
        }
    }
    let orders = orders.to_vec();
    entries.sort_by(|a, b| compare_by(&orders, a, b));
    Box::new(entries.into_iter().map(QueryResult::Ok))
}

/// Yields at most `remaining` entries and never pulls past the last one.
struct Limit {
    inner: Stream,
    remaining: usize,
}

impl Iterator for Limit {
    type Item = QueryResult;

    fn next(&mut self) -> Option<QueryResult> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.inner.next()?;
        if item.is_ok() {
            self.remaining -= 1;
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatastoreError;
    use crate::query::{CompareOp, Entry, Filter};
    use dualkv_types::Key;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn entry(key: &str, value: &str) -> QueryResult {
        Ok(Entry {
            key: Key::new(key),
            size: value.len() as u64,
            value: Some(value.as_bytes().to_vec()),
        })
    }

    fn keys(stream: Stream) -> Vec<String> {
        stream
            .map(|item| item.map(|e| e.key.to_string()).unwrap_or_else(|e| format!("err: {e}")))
            .collect()
    }

    fn input(items: Vec<QueryResult>) -> Stream {
        Box::new(items.into_iter())
    }

    #[test]
    fn empty_query_passes_everything() {
        let out = apply(&Query::new(), input(vec![entry("/b", "1"), entry("/a", "2")]));
        assert_eq!(keys(out), vec!["/b", "/a"]);
    }

    #[test]
    fn prefix_uses_path_boundaries() {
        let query = Query::new().with_prefix("/a");
        let out = apply(
            &query,
            input(vec![entry("/a/1", ""), entry("/ab", ""), entry("/a", ""), entry("/a/2", "")]),
        );
        assert_eq!(keys(out), vec!["/a/1", "/a/2"]);
    }

    #[test]
    fn filters_must_all_match() {
        let query = Query::new()
            .filter(Filter::KeyCompare {
                op: CompareOp::GreaterThan,
                key: Key::new("/a"),
            })
            .filter(Filter::ValueCompare {
                op: CompareOp::NotEqual,
                value: b"skip".to_vec(),
            });
        let out = apply(
            &query,
            input(vec![entry("/a", "x"), entry("/b", "skip"), entry("/c", "x")]),
        );
        assert_eq!(keys(out), vec!["/c"]);
    }

    #[test]
    fn orders_sort_with_key_tiebreak() {
        let query = Query::new().order(Order::ByValueDescending);
        let out = apply(
            &query,
            input(vec![entry("/b", "1"), entry("/c", "2"), entry("/a", "1")]),
        );
        assert_eq!(keys(out), vec!["/c", "/a", "/b"]);
    }

    #[test]
    fn error_before_ordering_is_the_only_item() {
        let query = Query::new().order(Order::ByValue);
        let out = apply(
            &query,
            input(vec![entry("/a", "1"), Err(DatastoreError::Closed), entry("/b", "0")]),
        );
        assert_eq!(keys(out), vec!["err: datastore is closed"]);
    }

    #[test]
    fn offset_then_limit() {
        let query = Query::new().offset(1).limit(2);
        let out = apply(
            &query,
            input(vec![entry("/a", ""), entry("/b", ""), entry("/c", ""), entry("/d", "")]),
        );
        assert_eq!(keys(out), vec!["/b", "/c"]);
    }

    #[test]
    fn offset_does_not_swallow_errors() {
        let query = Query::new().offset(2);
        let out = apply(
            &query,
            input(vec![entry("/a", ""), Err(DatastoreError::Closed), entry("/b", "")]),
        );
        assert_eq!(keys(out), vec!["err: datastore is closed"]);
    }

    #[test]
    fn limit_stops_pulling_input() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulled);
        let source = (0..100).map(move |i| {
            counter.fetch_add(1, Ordering::SeqCst);
            entry(&format!("/k{i:03}"), "")
        });
        let out = apply(&Query::new().limit(3), Box::new(source));
        assert_eq!(out.count(), 3);
        assert_eq!(pulled.load(Ordering::SeqCst), 3);
    }
}
