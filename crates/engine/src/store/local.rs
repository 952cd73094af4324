//! Embedded JSON-document backend.
//!
//! `LocalStore` keeps collections in memory and, when opened on a file,
//! rewrites the full JSON snapshot after every committed mutation. A
//! transaction takes the store's write lock for its whole lifetime, so
//! commits are atomic and serialized.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard, broadcast};

use super::{ChangeEvent, ChangeKind, DocumentStore, Query, StoreError, StoreTransaction};

type Collections = HashMap<String, BTreeMap<String, Value>>;

struct Inner {
    collections: Arc<Mutex<Collections>>,
    watchers: std::sync::Mutex<HashMap<String, broadcast::Sender<ChangeEvent>>>,
    path: Option<PathBuf>,
}

impl Inner {
    fn emit(&self, events: &[ChangeEvent]) {
        let watchers = self
            .watchers
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        for event in events {
            if let Some(sender) = watchers.get(&event.collection) {
                // No receivers is fine; events are fire-and-forget.
                let _ = sender.send(event.clone());
            }
        }
    }

    async fn persist(&self, data: &Collections) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes =
            serde_json::to_vec_pretty(data).map_err(|err| StoreError::Serde(err.to_string()))?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))
    }
}

#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<Inner>,
}

impl LocalStore {
    /// Ephemeral store, used by tests and the in-process fakes.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_data(Collections::new(), None)
    }

    /// Open (or create) a file-backed store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let collections = match std::fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|err| StoreError::Serde(err.to_string()))?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Collections::new(),
            Err(err) => return Err(StoreError::Backend(err.to_string())),
        };
        Ok(Self::with_data(collections, Some(path)))
    }

    fn with_data(collections: Collections, path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                collections: Arc::new(Mutex::new(collections)),
                watchers: std::sync::Mutex::new(HashMap::new()),
                path,
            }),
        }
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let data = self.inner.collections.lock().await;
        Ok(data.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn insert(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        let mut data = self.inner.collections.lock().await;
        let docs = data.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::Conflict(format!("{collection}/{id}")));
        }
        docs.insert(id.to_string(), doc);
        self.inner.persist(&data).await?;
        self.inner.emit(&[ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            kind: ChangeKind::Created,
        }]);
        Ok(())
    }

    async fn put(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        let mut data = self.inner.collections.lock().await;
        let docs = data.entry(collection.to_string()).or_default();
        let kind = if docs.contains_key(id) {
            ChangeKind::Updated
        } else {
            ChangeKind::Created
        };
        docs.insert(id.to_string(), doc);
        self.inner.persist(&data).await?;
        self.inner.emit(&[ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            kind,
        }]);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut data = self.inner.collections.lock().await;
        let removed = data
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            self.inner.persist(&data).await?;
            self.inner.emit(&[ChangeEvent {
                collection: collection.to_string(),
                id: id.to_string(),
                kind: ChangeKind::Deleted,
            }]);
        }
        Ok(())
    }

    async fn find(&self, collection: &str, query: Query) -> Result<Vec<Value>, StoreError> {
        let data = self.inner.collections.lock().await;
        let matched: Vec<Value> = data
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| query.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(data);
        Ok(query.apply(matched))
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = Arc::clone(&self.inner.collections).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(LocalTransaction {
            inner: Arc::clone(&self.inner),
            guard,
            working,
            events: Vec::new(),
        }))
    }

    fn watch(&self, collection: &str) -> broadcast::Receiver<ChangeEvent> {
        let mut watchers = self
            .inner
            .watchers
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        watchers
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(256).0)
            .subscribe()
    }
}

struct LocalTransaction {
    inner: Arc<Inner>,
    guard: OwnedMutexGuard<Collections>,
    working: Collections,
    events: Vec<ChangeEvent>,
}

#[async_trait]
impl StoreTransaction for LocalTransaction {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .working
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn find(&self, collection: &str, query: Query) -> Result<Vec<Value>, StoreError> {
        let matched: Vec<Value> = self
            .working
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| query.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(query.apply(matched))
    }

    fn insert(&mut self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        let docs = self.working.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::Conflict(format!("{collection}/{id}")));
        }
        docs.insert(id.to_string(), doc);
        self.events.push(ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            kind: ChangeKind::Created,
        });
        Ok(())
    }

    fn put(&mut self, collection: &str, id: &str, doc: Value) {
        let docs = self.working.entry(collection.to_string()).or_default();
        let kind = if docs.contains_key(id) {
            ChangeKind::Updated
        } else {
            ChangeKind::Created
        };
        docs.insert(id.to_string(), doc);
        self.events.push(ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            kind,
        });
    }

    fn delete(&mut self, collection: &str, id: &str) {
        let removed = self
            .working
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            self.events.push(ChangeEvent {
                collection: collection.to_string(),
                id: id.to_string(),
                kind: ChangeKind::Deleted,
            });
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut this = *self;
        // Persist first: a failed snapshot write leaves the store unchanged.
        this.inner.persist(&this.working).await?;
        *this.guard = std::mem::take(&mut this.working);
        let events = std::mem::take(&mut this.events);
        this.inner.emit(&events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SortOrder;
    use serde_json::json;

    #[tokio::test]
    async fn insert_conflicts_on_duplicate_id() {
        let store = LocalStore::in_memory();
        store.insert("c", "1", json!({"a": 1})).await.unwrap();
        let err = store.insert("c", "1", json!({"a": 2})).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = LocalStore::in_memory();
        let mut tx = store.begin().await.unwrap();
        tx.put("c", "1", json!({"a": 1}));
        drop(tx);
        assert!(store.get("c", "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transaction_reads_its_own_writes() {
        let store = LocalStore::in_memory();
        let mut tx = store.begin().await.unwrap();
        tx.put("c", "1", json!({"kind": "x"}));
        let found = tx
            .find("c", Query::new().filter("kind", "x"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        tx.commit().await.unwrap();
        assert!(store.get("c", "1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn committed_transaction_emits_events() {
        let store = LocalStore::in_memory();
        let mut rx = store.watch("c");
        let mut tx = store.begin().await.unwrap();
        tx.put("c", "1", json!({"a": 1}));
        tx.commit().await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.collection, "c");
        assert_eq!(event.id, "1");
        assert_eq!(event.kind, ChangeKind::Created);
    }

    #[tokio::test]
    async fn find_orders_and_limits() {
        let store = LocalStore::in_memory();
        store.insert("c", "1", json!({"n": 3})).await.unwrap();
        store.insert("c", "2", json!({"n": 1})).await.unwrap();
        store.insert("c", "3", json!({"n": 2})).await.unwrap();
        let found = store
            .find("c", Query::new().order_by("n", SortOrder::Desc).limit(2))
            .await
            .unwrap();
        assert_eq!(found[0]["n"], 3);
        assert_eq!(found[1]["n"], 2);
        assert_eq!(found.len(), 2);
    }
}
