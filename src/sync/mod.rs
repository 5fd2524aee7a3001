//! Catalog Sync - turns the store's live collection feed into decoded,
//! newest-first snapshots.
//!
//! ```text
//! DocumentStore::subscribe ──► Subscription (raw documents, any order)
//!                                   │
//!                         SnapshotStream::next
//!                                   │ decode, skip undecodable, sort newest first
//!                                   ▼
//!                           CatalogSnapshot ──► on_update
//!                           StoreError      ──► on_error
//! ```
//!
//! Each delivery replaces the previous snapshot wholesale. The stream does
//! not reconnect after a subscription error.

use std::cmp::Reverse;

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::entry::CatalogEntry;
use crate::store::{Document, DocumentStore, StoreError, Subscription};

/// The full entry list as last delivered, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    entries: Vec<CatalogEntry>,
}

impl CatalogSnapshot {
    /// Order `entries` newest first. Entries with equal (or missing)
    /// timestamps keep their relative order.
    pub fn new(mut entries: Vec<CatalogEntry>) -> Self {
        entries.sort_by_key(|e| Reverse(e.created_key()));
        Self { entries }
    }

    /// Decode raw documents, skipping any that do not decode.
    pub fn from_documents(docs: &[Document]) -> Self {
        let entries = docs
            .iter()
            .filter_map(|doc| match CatalogEntry::from_document(doc) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(id = %doc.id, %err, "skipping undecodable catalog entry");
                    None
                }
            })
            .collect();
        Self::new(entries)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Live feed of decoded snapshots.
#[derive(Debug)]
pub struct SnapshotStream {
    subscription: Subscription,
}

impl SnapshotStream {
    /// Next snapshot or subscription error. `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<Result<CatalogSnapshot, StoreError>> {
        let event = self.subscription.next().await?;
        Some(event.map(|docs| {
            let snapshot = CatalogSnapshot::from_documents(&docs);
            debug!(entries = snapshot.len(), "catalog snapshot delivered");
            snapshot
        }))
    }

    /// Stop listening. The store prunes the subscription on its next delivery.
    pub fn cancel(self) {
        self.subscription.cancel();
    }
}

/// Subscribes to the entry collection of one catalog.
#[derive(Debug, Clone)]
pub struct CatalogSync<S> {
    store: S,
    collection: String,
}

impl<S: DocumentStore> CatalogSync<S> {
    pub fn new(store: S, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn subscribe(&self) -> Result<SnapshotStream, StoreError> {
        let subscription = self.store.subscribe(&self.collection).await?;
        Ok(SnapshotStream { subscription })
    }

    /// Subscribe, then drive the stream on a background task.
    ///
    /// `on_update` sees every snapshot in delivery order; `on_error` sees
    /// subscription failures. Establishment failures are returned instead.
    pub async fn spawn<U, E>(&self, mut on_update: U, mut on_error: E) -> Result<SyncHandle, StoreError>
    where
        U: FnMut(CatalogSnapshot) + Send + 'static,
        E: FnMut(StoreError) + Send + 'static,
    {
        let mut stream = self.subscribe().await?;
        let collection = self.collection.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                match event {
                    Ok(snapshot) => on_update(snapshot),
                    Err(err) => {
                        error!(%collection, %err, "catalog subscription failed");
                        on_error(err);
                    }
                }
            }
            debug!(%collection, "catalog subscription ended");
        });

        Ok(SyncHandle { task })
    }
}

/// Owns a running sync task. Dropping the handle cancels it.
#[derive(Debug)]
pub struct SyncHandle {
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
