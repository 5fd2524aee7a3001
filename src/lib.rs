pub mod admin;
pub mod app;
pub mod auth;
pub mod backoff;
pub mod config;
mod error;
pub mod entry;
pub mod logging;
pub mod store;
pub mod suggest;
pub mod sync;
pub mod view;

#[cfg(feature = "http")]
pub mod http;

pub use admin::{AdminElection, AdminMarker};
pub use app::{AppState, CatalogApp, GalleryState};
pub use auth::{AuthError, AuthProvider, Credentials, InMemoryAuth, SessionId};
pub use backoff::{
    BackoffError, BackoffExecutor, HttpRequest, HttpResponse, ReqwestTransport, RetryPolicy,
    RetryReason, Transport, TransportError,
};
pub use config::{CatalogConfig, Cli, GenerationConfig};
pub use entry::{parse_image_urls, CatalogEntry, EntryForm, NewEntry, Timestamp, ValidationError};
pub use error::CatalogError;
pub use logging::{init_logging, LogFormat};
pub use store::{
    CatalogPaths, Document, DocumentStore, InMemoryDocumentStore, StoreError, Subscription,
    WritePrecondition, WriteResult,
};
pub use suggest::{GenerationFailure, SuggestError, SuggestedText, SuggestionClient};
pub use sync::{CatalogSnapshot, CatalogSync, SnapshotStream, SyncHandle};
pub use view::{project, CardView, Lightbox, SortDirection, SortField, SortSpec};
