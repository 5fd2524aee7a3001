//! Document Store - the realtime database collaborator.
//!
//! The catalog depends on a small slice of a realtime document database:
//! live collection subscriptions, single-document reads, conditional or
//! overwriting writes, id-assigning adds and deletes.
//!
//! ```text
//! ┌───────────────────┐   subscribe(collection)   ┌──────────────────────┐
//! │   CatalogSync     │ ◄──────────────────────── │                      │
//! ├───────────────────┤   get / set(precondition) │    DocumentStore     │
//! │   AdminElection   │ ◄───────────────────────► │  (InMemory, remote)  │
//! ├───────────────────┤   add / delete            │                      │
//! │   CatalogApp      │ ────────────────────────► │                      │
//! └───────────────────┘                           └──────────────────────┘
//! ```
//!
//! Document paths are slash-separated with an even number of segments
//! (`collection/id/collection/id`); collection paths have an odd number.

mod in_memory;
mod paths;
mod subscription;

use std::fmt;

use async_trait::async_trait;
use serde_json::{json, Value};

pub use in_memory::InMemoryDocumentStore;
pub use paths::{split_document_path, CatalogPaths};
pub use subscription::{SnapshotEvent, Subscription, SubscriptionSender};

/// Key of the server-timestamp sentinel object.
pub const SERVER_TIMESTAMP_KEY: &str = ".sv";

/// Sentinel value the store replaces with its own write time.
pub fn server_timestamp() -> Value {
    json!({ ".sv": "timestamp" })
}

/// True if `value` is the server-timestamp sentinel.
pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| obj.len() == 1 && obj.get(SERVER_TIMESTAMP_KEY) == Some(&json!("timestamp")))
        .unwrap_or(false)
}

/// A stored document: its id within the collection plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Condition attached to a `set`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WritePrecondition {
    /// Overwrite unconditionally (last write wins).
    #[default]
    None,
    /// Create only; fail softly if the document already exists.
    DoesNotExist,
    /// Replace only if the stored fields still equal these; fail softly otherwise.
    Matches(Value),
}

/// Outcome of a `set`. A failed precondition is a normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Written,
    PreconditionFailed,
}

/// Error type for store operations and subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Connectivity or backend failure.
    Unavailable(String),
    /// The session may not perform this operation.
    PermissionDenied(String),
    /// A document or collection path is malformed.
    InvalidPath(String),
    /// Document payload could not be encoded or decoded.
    Serde(String),
    /// The store cannot honour the requested operation (e.g. a precondition).
    Unsupported(String),
    /// Internal lock poisoned.
    LockPoisoned(&'static str),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::PermissionDenied(msg) => write!(f, "permission denied: {}", msg),
            StoreError::InvalidPath(path) => write!(f, "invalid store path: {}", path),
            StoreError::Serde(msg) => write!(f, "document serialization error: {}", msg),
            StoreError::Unsupported(msg) => write!(f, "unsupported store operation: {}", msg),
            StoreError::LockPoisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// The realtime document store the catalog runs against.
///
/// Subscriptions give no ordering guarantee; callers sort client-side.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Open a live subscription on a collection. The current contents are
    /// delivered first, then a full snapshot after every change.
    async fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError>;

    /// Read one document. `None` if it does not exist.
    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError>;

    /// Write a whole document, replacing any previous contents.
    ///
    /// Stores that cannot evaluate `DoesNotExist` or `Matches` atomically
    /// return `StoreError::Unsupported` instead of guessing.
    async fn set(
        &self,
        path: &str,
        data: Value,
        precondition: WritePrecondition,
    ) -> Result<WriteResult, StoreError>;

    /// Add a document under a store-assigned id. Returns the id.
    async fn add(&self, collection: &str, data: Value) -> Result<String, StoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}
