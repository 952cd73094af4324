//! Document store client surface.
//!
//! The store itself is an external collaborator: collections of schemaless
//! JSON documents addressed by id, equality/ordering queries, push change
//! notifications and a native transaction primitive. The engine only talks
//! to the [`DocumentStore`] trait; [`local::LocalStore`] is the embedded
//! backend used by tests, the admin CLI and local deployments.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

pub mod local;

/// Errors surfaced by a store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document already exists: {0}")]
    Conflict(String),
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("invalid document: {0}")]
    Serde(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// An equality-filtered collection query with optional single-field
/// ordering and an optional result limit.
#[derive(Clone, Debug, Default)]
pub struct Query {
    filters: Vec<(String, Value)>,
    order_by: Option<(String, SortOrder)>,
    limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value` (top-level document field).
    #[must_use]
    pub fn filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by = Some((field.to_string(), order));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document satisfies every equality filter.
    pub fn matches(&self, doc: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }

    /// Apply ordering and limit to an already-filtered result set.
    pub fn apply(&self, mut docs: Vec<Value>) -> Vec<Value> {
        if let Some((field, order)) = &self.order_by {
            docs.sort_by(|a, b| {
                let ord = cmp_values(a.get(field), b.get(field));
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        docs
    }
}

/// Field comparison for ordering: numbers numerically, everything else by
/// its JSON string form (RFC3339 timestamps and ISO dates sort correctly).
fn cmp_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A push notification for one mutated document.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    pub collection: String,
    pub id: String,
    pub kind: ChangeKind,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Create a document; fails with [`StoreError::Conflict`] if the id is
    /// already taken.
    async fn insert(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError>;

    /// Upsert a document.
    async fn put(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError>;

    /// Delete a document (idempotent).
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn find(&self, collection: &str, query: Query) -> Result<Vec<Value>, StoreError>;

    /// Open the store's native transaction. Every multi-document aggregate
    /// update in the engine runs through this.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    /// Subscribe to change events for one collection.
    fn watch(&self, collection: &str) -> broadcast::Receiver<ChangeEvent>;
}

/// A store transaction: reads see staged writes, mutations are applied
/// atomically on [`commit`](StoreTransaction::commit), dropping without
/// commit rolls back.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    async fn find(&self, collection: &str, query: Query) -> Result<Vec<Value>, StoreError>;

    fn insert(&mut self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError>;

    fn put(&mut self, collection: &str, id: &str, doc: Value);

    fn delete(&mut self, collection: &str, id: &str);

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
