//! In-memory document store.
//!
//! Backs local tooling and tests with the same [`DocumentStore`] surface as
//! the HTTP client. Every operation is recorded in an operation log so
//! callers can assert on what reached the store, and a fault-injection hook
//! lets tests exercise partial-failure paths.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::query::{sort_documents, Filter, Query};
use crate::subscription::Subscription;
use crate::{DocumentStore, StoreError};

/// One recorded store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Create { collection: String },
    Get { collection: String },
    Update { collection: String },
    Query { collection: String },
    Count { collection: String },
}

struct Inner {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    ops: Mutex<Vec<Operation>>,
    changed: broadcast::Sender<String>,
    fail_next_update: AtomicBool,
}

/// In-process [`DocumentStore`] backend.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changed, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                collections: Mutex::new(HashMap::new()),
                ops: Mutex::new(Vec::new()),
                changed,
                fail_next_update: AtomicBool::new(false),
            }),
        }
    }

    /// The operations executed so far, in order.
    pub fn operations(&self) -> Vec<Operation> {
        self.inner.ops.lock().unwrap().clone()
    }

    /// Number of queries executed against a collection.
    pub fn query_count(&self, collection: &str) -> usize {
        self.operations()
            .iter()
            .filter(|op| {
                matches!(op, Operation::Query { collection: c } if c == collection)
            })
            .count()
    }

    /// Number of writes (creates and updates) executed against a collection.
    pub fn write_count(&self, collection: &str) -> usize {
        self.operations()
            .iter()
            .filter(|op| {
                matches!(op,
                    Operation::Create { collection: c } | Operation::Update { collection: c }
                        if c == collection)
            })
            .count()
    }

    /// Make the next `update` fail with an API error. Used to exercise the
    /// partial-failure path of multi-write operations.
    pub fn fail_next_update(&self) {
        self.inner.fail_next_update.store(true, AtomicOrdering::SeqCst);
    }

    fn record(&self, op: Operation) {
        self.inner.ops.lock().unwrap().push(op);
    }

    fn notify(&self, collection: &str) {
        // No receivers is fine; subscriptions may not exist yet.
        let _ = self.inner.changed.send(collection.to_string());
    }

    fn run_query(&self, collection: &str, query: &Query) -> Vec<Value> {
        let collections = self.inner.collections.lock().unwrap();
        let docs = collections.get(collection).cloned().unwrap_or_default();
        let mut matched: Vec<Value> = docs
            .into_iter()
            .filter(|doc| matches(doc, query))
            .collect();
        if let Some(ordering) = &query.ordering {
            sort_documents(&mut matched, ordering);
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit as usize);
        }
        matched
    }
}

fn matches(doc: &Value, query: &Query) -> bool {
    query.filters.iter().all(|filter| match filter {
        Filter::Eq(field, value) => doc.get(field) == Some(value),
        Filter::In(field, values) => doc
            .get(field)
            .and_then(Value::as_str)
            .map(|v| values.iter().any(|candidate| candidate == v))
            .unwrap_or(false),
    })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        self.record(Operation::Create {
            collection: collection.to_string(),
        });
        let mut doc = match data {
            Value::Object(map) => Value::Object(map),
            _ => {
                return Err(StoreError::InvalidQuery(
                    "document payload must be a JSON object".to_string(),
                ))
            }
        };
        let id = Uuid::new_v4().to_string();
        doc.as_object_mut()
            .expect("payload checked to be an object")
            .insert("id".to_string(), Value::String(id.clone()));

        self.inner
            .collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        self.notify(collection);
        Ok(id)
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.record(Operation::Create {
            collection: collection.to_string(),
        });
        let mut doc = match data {
            Value::Object(map) => Value::Object(map),
            _ => {
                return Err(StoreError::InvalidQuery(
                    "document payload must be a JSON object".to_string(),
                ))
            }
        };
        doc.as_object_mut()
            .expect("payload checked to be an object")
            .insert("id".to_string(), Value::String(id.to_string()));

        let mut collections = self.inner.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();
        if let Some(existing) = docs
            .iter_mut()
            .find(|d| d.get("id").and_then(Value::as_str) == Some(id))
        {
            *existing = doc;
        } else {
            docs.push(doc);
        }
        drop(collections);
        self.notify(collection);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Value, StoreError> {
        self.record(Operation::Get {
            collection: collection.to_string(),
        });
        let collections = self.inner.collections.lock().unwrap();
        collections
            .get(collection)
            .and_then(|docs| {
                docs.iter()
                    .find(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
            })
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        self.record(Operation::Update {
            collection: collection.to_string(),
        });
        if self
            .inner
            .fail_next_update
            .swap(false, AtomicOrdering::SeqCst)
        {
            return Err(StoreError::Api {
                message: "injected update failure".to_string(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        let patch = match patch {
            Value::Object(map) => map,
            _ => {
                return Err(StoreError::InvalidQuery(
                    "patch payload must be a JSON object".to_string(),
                ))
            }
        };

        let mut collections = self.inner.collections.lock().unwrap();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| {
                docs.iter_mut()
                    .find(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        let fields = doc
            .as_object_mut()
            .expect("stored documents are objects");
        for (key, value) in patch {
            fields.insert(key, value);
        }
        drop(collections);
        self.notify(collection);
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        self.record(Operation::Query {
            collection: collection.to_string(),
        });
        if let Some(Filter::In(_, values)) = query
            .filters
            .iter()
            .find(|f| matches!(f, Filter::In(_, _)))
        {
            if values.len() > crate::IN_FILTER_LIMIT {
                return Err(StoreError::InvalidQuery(format!(
                    "in filter exceeds provider limit of {} elements",
                    crate::IN_FILTER_LIMIT
                )));
            }
        }
        Ok(self.run_query(collection, query))
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<u64, StoreError> {
        self.record(Operation::Count {
            collection: collection.to_string(),
        });
        Ok(self.run_query(collection, query).len() as u64)
    }

    async fn subscribe(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));

        let initial = self.run_query(collection, query);
        let mut last = initial.clone();
        tx.send(initial).ok();

        let store = self.clone();
        let collection = collection.to_string();
        let query = query.clone();
        let stop_flag = stop.clone();
        let mut notifications = self.inner.changed.subscribe();

        let task = tokio::spawn(async move {
            loop {
                if stop_flag.load(AtomicOrdering::SeqCst) {
                    break;
                }
                match notifications.recv().await {
                    Ok(changed) if changed == collection => {
                        let snapshot = store.run_query(&collection, &query);
                        if snapshot != last {
                            last = snapshot.clone();
                            if tx.send(snapshot).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription::new(rx, stop, task))
    }
}
