//! Store paths used by the catalog.

use super::StoreError;

/// Locations of the catalog's shared state for one application id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPaths {
    app_id: String,
}

impl CatalogPaths {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    fn public_data(&self) -> String {
        format!("artifacts/{}/public/data", self.app_id)
    }

    /// Collection holding the catalog entries.
    pub fn entries(&self) -> String {
        format!("{}/bikes", self.public_data())
    }

    /// Path of one entry document.
    pub fn entry(&self, id: &str) -> String {
        format!("{}/{}", self.entries(), id)
    }

    /// Path of the admin marker document.
    pub fn admin_marker(&self) -> String {
        format!("{}/config/admin", self.public_data())
    }
}

/// Split `collection/.../id` into its collection path and document id.
pub fn split_document_path(path: &str) -> Result<(&str, &str), StoreError> {
    let segments = path.split('/').count();
    if segments < 2 || segments % 2 != 0 || path.split('/').any(str::is_empty) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    path.rsplit_once('/')
        .ok_or_else(|| StoreError::InvalidPath(path.to_string()))
}

/// Validate a collection path (odd number of non-empty segments).
pub(crate) fn check_collection_path(path: &str) -> Result<(), StoreError> {
    let segments = path.split('/').count();
    if segments % 2 == 0 || path.split('/').any(str::is_empty) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}
