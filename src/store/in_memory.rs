//! InMemoryDocumentStore - HashMap-backed realtime store for tests and local runs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::paths::{check_collection_path, split_document_path};
use super::{
    is_server_timestamp, Document, DocumentStore, StoreError, Subscription, SubscriptionSender,
    WritePrecondition, WriteResult,
};
use crate::entry::Timestamp;

struct Watcher {
    collection: String,
    sender: SubscriptionSender,
}

#[derive(Default)]
struct Faults {
    failing_writes: usize,
    failing_reads: usize,
}

#[derive(Default)]
struct State {
    /// collection path -> document id -> fields
    collections: HashMap<String, HashMap<String, Value>>,
    watchers: Vec<Watcher>,
    last_stamp: Timestamp,
    faults: Faults,
}

impl State {
    /// Next server timestamp, strictly greater than every earlier one.
    fn next_stamp(&mut self) -> Timestamp {
        let now = Timestamp::now();
        let next = if now > self.last_stamp {
            now
        } else if self.last_stamp.nanos + 1 >= 1_000_000_000 {
            Timestamp::new(self.last_stamp.seconds + 1, 0)
        } else {
            Timestamp::new(self.last_stamp.seconds, self.last_stamp.nanos + 1)
        };
        self.last_stamp = next;
        next
    }

    /// Replace every server-timestamp sentinel in `data` with one write time.
    fn resolve_sentinels(&mut self, mut data: Value) -> Result<Value, StoreError> {
        let stamp = serde_json::to_value(self.next_stamp())
            .map_err(|e| StoreError::Serde(e.to_string()))?;
        replace_sentinels(&mut data, &stamp);
        Ok(data)
    }

    fn check_write(&mut self) -> Result<(), StoreError> {
        if self.faults.failing_writes > 0 {
            self.faults.failing_writes -= 1;
            return Err(StoreError::Unavailable("injected write failure".into()));
        }
        Ok(())
    }

    fn check_read(&mut self) -> Result<(), StoreError> {
        if self.faults.failing_reads > 0 {
            self.faults.failing_reads -= 1;
            return Err(StoreError::Unavailable("injected read failure".into()));
        }
        Ok(())
    }

    fn snapshot(&self, collection: &str) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Push the full collection to its watchers, dropping the ones that left.
    fn notify(&mut self, collection: &str) {
        let docs = self.snapshot(collection);
        debug!(collection, documents = docs.len(), "delivering snapshot");
        self.watchers.retain(|watcher| {
            if watcher.collection != collection {
                return !watcher.sender.is_closed();
            }
            watcher.sender.deliver(Ok(docs.clone()))
        });
    }
}

fn replace_sentinels(value: &mut Value, stamp: &Value) {
    if is_server_timestamp(value) {
        *value = stamp.clone();
        return;
    }
    match value {
        Value::Object(map) => map.values_mut().for_each(|v| replace_sentinels(v, stamp)),
        Value::Array(items) => items.iter_mut().for_each(|v| replace_sentinels(v, stamp)),
        _ => {}
    }
}

/// In-memory document store with live subscriptions.
///
/// Clone-friendly via Arc: clones share documents and subscribers, so two
/// app sessions built on clones of one store see each other's writes.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    /// Make the next `count` writes (set, add, delete) fail with `Unavailable`.
    pub fn fail_next_writes(&self, count: usize) -> Result<(), StoreError> {
        self.write("fail_next_writes")?.faults.failing_writes = count;
        Ok(())
    }

    /// Make the next `count` reads fail with `Unavailable`.
    pub fn fail_next_reads(&self, count: usize) -> Result<(), StoreError> {
        self.write("fail_next_reads")?.faults.failing_reads = count;
        Ok(())
    }

    /// Deliver `error` to every subscriber of `collection` and end those subscriptions.
    pub fn break_subscriptions(&self, collection: &str, error: StoreError) -> Result<(), StoreError> {
        let mut state = self.write("break_subscriptions")?;
        state.watchers.retain(|watcher| {
            if watcher.collection == collection {
                watcher.sender.deliver(Err(error.clone()));
                false
            } else {
                true
            }
        });
        Ok(())
    }

    /// Number of live subscriptions on `collection`.
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.state
            .read()
            .map(|state| {
                state
                    .watchers
                    .iter()
                    .filter(|w| w.collection == collection && !w.sender.is_closed())
                    .count()
            })
            .unwrap_or(0)
    }

    /// Number of documents currently in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.state
            .read()
            .map(|state| state.collections.get(collection).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        check_collection_path(collection)?;
        let mut state = self.write("subscribe")?;
        let (sender, subscription) = Subscription::channel();
        sender.deliver(Ok(state.snapshot(collection)));
        state.watchers.push(Watcher {
            collection: collection.to_string(),
            sender,
        });
        Ok(subscription)
    }

    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        let (collection, id) = split_document_path(path)?;
        let mut state = self.write("get")?;
        state.check_read()?;
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn set(
        &self,
        path: &str,
        data: Value,
        precondition: WritePrecondition,
    ) -> Result<WriteResult, StoreError> {
        let (collection, id) = split_document_path(path)?;
        let mut state = self.write("set")?;
        state.check_write()?;

        let current = state.collections.get(collection).and_then(|docs| docs.get(id));
        let holds = match &precondition {
            WritePrecondition::None => true,
            WritePrecondition::DoesNotExist => current.is_none(),
            WritePrecondition::Matches(expected) => current == Some(expected),
        };
        if !holds {
            return Ok(WriteResult::PreconditionFailed);
        }

        let data = state.resolve_sentinels(data)?;
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        state.notify(collection);
        Ok(WriteResult::Written)
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        check_collection_path(collection)?;
        let mut state = self.write("add")?;
        state.check_write()?;

        let id = Uuid::new_v4().simple().to_string();
        let data = state.resolve_sentinels(data)?;
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        state.notify(collection);
        Ok(id)
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let (collection, id) = split_document_path(path)?;
        let mut state = self.write("delete")?;
        state.check_write()?;

        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            state.notify(collection);
        }
        Ok(())
    }
}
