//! Query model.
//!
//! A [`Query`] selects entries by key prefix, narrows them with [`Filter`]s,
//! sorts them by a list of [`Order`]s, then applies `offset` and `limit`.

use std::cmp::Ordering;

use dualkv_types::Key;

use crate::error::DatastoreError;

/// One item of a query result stream.
pub type QueryResult = Result<Entry, DatastoreError>;

/// A key returned by a query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: Key,
    /// Payload length in bytes, read from the metadata record.
    pub size: u64,
    /// Payload bytes; `None` for keys-only queries.
    pub value: Option<Vec<u8>>,
}

/// Comparison applied by a [`Filter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl CompareOp {
    fn holds<T: Ord + ?Sized>(self, left: &T, right: &T) -> bool {
        let ord = left.cmp(right);
        match self {
            CompareOp::Equal => ord == Ordering::Equal,
            CompareOp::NotEqual => ord != Ordering::Equal,
            CompareOp::GreaterThan => ord == Ordering::Greater,
            CompareOp::GreaterThanOrEqual => ord != Ordering::Less,
            CompareOp::LessThan => ord == Ordering::Less,
            CompareOp::LessThanOrEqual => ord != Ordering::Greater,
        }
    }
}

/// Predicate an entry must satisfy to be returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    /// Compare the entry key against `key` (byte order).
    KeyCompare { op: CompareOp, key: Key },
    /// Keep entries strictly below the given key.
    KeyPrefix(Key),
    /// Compare the entry value against `value`. Never matches keys-only entries.
    ValueCompare { op: CompareOp, value: Vec<u8> },
}

impl Filter {
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Filter::KeyCompare { op, key } => op.holds(entry.key.as_bytes(), key.as_bytes()),
            Filter::KeyPrefix(prefix) => prefix.is_ancestor_of(&entry.key),
            Filter::ValueCompare { op, value } => entry
                .value
                .as_deref()
                .is_some_and(|v| op.holds(v, value.as_slice())),
        }
    }
}

/// Sort criterion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    ByKey,
    ByKeyDescending,
    ByValue,
    ByValueDescending,
}

impl Order {
    pub fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        match self {
            Order::ByKey => a.key.cmp(&b.key),
            Order::ByKeyDescending => b.key.cmp(&a.key),
            Order::ByValue => a.value.cmp(&b.value),
            Order::ByValueDescending => b.value.cmp(&a.value),
        }
    }
}

/// Compare by each order in turn, falling back to ascending key order.
pub(crate) fn compare_by(orders: &[Order], a: &Entry, b: &Entry) -> Ordering {
    orders
        .iter()
        .map(|order| order.compare(a, b))
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| a.key.cmp(&b.key))
}

/// Query description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    /// Only keys strictly below this key are returned. The root matches all.
    pub prefix: Key,
    pub filters: Vec<Filter>,
    pub orders: Vec<Order>,
    /// Maximum number of entries; `0` means unlimited.
    pub limit: usize,
    /// Number of leading entries to skip.
    pub offset: usize,
    /// Skip fetching payloads.
    pub keys_only: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<Key>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }
}
