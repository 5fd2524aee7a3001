//! Catalog entries - the bicycles held in the shared collection.
//!
//! Entries are owned by the store. The client only ever sees decoded copies
//! inside a [`CatalogSnapshot`](crate::sync::CatalogSnapshot); there is no
//! partial update, an entry is either created whole or deleted.
//!
//! Stored layout:
//!
//! ```json
//! {
//!   "model": "Aero",
//!   "brand": "Zeta",
//!   "price": 999.5,
//!   "images": ["a.png", "b.png"],
//!   "description": "",
//!   "createdAt": { "seconds": 1760000000, "nanos": 0 }
//! }
//! ```

mod form;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::{server_timestamp, Document, StoreError};

pub(crate) use form::required;
pub use form::{parse_image_urls, EntryForm, ValidationError};

/// Server-assigned write time in the store's `{ seconds, nanos }` layout.
///
/// Ordering is by seconds, then nanos.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Wall-clock now.
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Convert to a chrono datetime. `None` if out of range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanos).single()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }
}

/// A decoded catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub model: String,
    pub brand: String,
    pub price: f64,
    pub images: Vec<String>,
    pub description: Option<String>,
    /// `None` while the server timestamp is still pending.
    pub created_at: Option<Timestamp>,
}

/// Wire shape of the stored fields. Lenient on purpose: cards render
/// fallbacks for missing model, brand and price.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    created_at: Option<Timestamp>,
}

impl CatalogEntry {
    /// Decode a store document into an entry.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let stored: StoredEntry = serde_json::from_value(doc.data.clone())
            .map_err(|e| StoreError::Serde(format!("entry {}: {}", doc.id, e)))?;

        Ok(Self {
            id: doc.id.clone(),
            model: stored.model.unwrap_or_default(),
            brand: stored.brand.unwrap_or_default(),
            price: stored.price.unwrap_or(0.0),
            images: stored.images.unwrap_or_default(),
            description: stored.description.filter(|d| !d.trim().is_empty()),
            created_at: stored.created_at,
        })
    }

    /// Creation time used for newest-first ordering. Pending writes sort as time zero.
    pub fn created_key(&self) -> Timestamp {
        self.created_at.unwrap_or_default()
    }

    /// First image, used as the card cover.
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// A validated entry ready to be written. Produced by [`EntryForm::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub model: String,
    pub brand: String,
    pub price: f64,
    pub images: Vec<String>,
    pub description: Option<String>,
}

impl NewEntry {
    /// Store payload. `createdAt` is left for the store to fill in.
    pub fn to_document(&self) -> Value {
        json!({
            "model": self.model,
            "brand": self.brand,
            "price": self.price,
            "images": self.images,
            "description": self.description.clone().unwrap_or_default(),
            "createdAt": server_timestamp(),
        })
    }
}
