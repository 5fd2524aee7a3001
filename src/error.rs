//! Crate-level error for [`CatalogApp`](crate::app::CatalogApp) operations.

use std::error::Error;
use std::fmt;

use crate::auth::AuthError;
use crate::backoff::TransportError;
use crate::entry::ValidationError;
use crate::store::StoreError;
use crate::suggest::SuggestError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Form input rejected before any write.
    Validation(ValidationError),
    /// Description generation failed.
    Suggest(SuggestError),
    /// Store read, write or subscription failure.
    Store(StoreError),
    /// Sign-in failed.
    Auth(AuthError),
    /// The HTTP client could not be built.
    Transport(TransportError),
    /// A non-admin session attempted an admin-only action.
    Unauthorized(String),
    /// No entry with this id in the current snapshot.
    NotFound(String),
    /// `start()` has not completed yet.
    NotStarted,
    /// Internal state lock poisoned.
    LockPoisoned(&'static str),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Validation(e) => write!(f, "validation failed: {}", e),
            CatalogError::Suggest(e) => write!(f, "{}", e),
            CatalogError::Store(e) => write!(f, "{}", e),
            CatalogError::Auth(e) => write!(f, "{}", e),
            CatalogError::Transport(e) => write!(f, "{}", e),
            CatalogError::Unauthorized(action) => {
                write!(f, "unauthorized: only the admin may {}", action)
            }
            CatalogError::NotFound(id) => write!(f, "entry not found: {}", id),
            CatalogError::NotStarted => write!(f, "catalog session not started"),
            CatalogError::LockPoisoned(operation) => {
                write!(f, "catalog state lock poisoned during {}", operation)
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CatalogError::Validation(e) => Some(e),
            CatalogError::Suggest(e) => Some(e),
            CatalogError::Store(e) => Some(e),
            CatalogError::Auth(e) => Some(e),
            CatalogError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for CatalogError {
    fn from(err: ValidationError) -> Self {
        CatalogError::Validation(err)
    }
}

impl From<SuggestError> for CatalogError {
    fn from(err: SuggestError) -> Self {
        CatalogError::Suggest(err)
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        CatalogError::Store(err)
    }
}

impl From<AuthError> for CatalogError {
    fn from(err: AuthError) -> Self {
        CatalogError::Auth(err)
    }
}

impl From<TransportError> for CatalogError {
    fn from(err: TransportError) -> Self {
        CatalogError::Transport(err)
    }
}

impl CatalogError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            CatalogError::Validation(_) => 400,
            CatalogError::Suggest(SuggestError::Validation(_)) => 400,
            CatalogError::Suggest(SuggestError::GenerationFailed(_)) => 502,
            CatalogError::Store(StoreError::PermissionDenied(_)) => 403,
            CatalogError::Store(StoreError::Unavailable(_)) => 503,
            CatalogError::Store(StoreError::InvalidPath(_)) => 400,
            CatalogError::Store(_) => 500,
            CatalogError::Auth(AuthError::InvalidToken) => 401,
            CatalogError::Auth(AuthError::Unavailable(_)) => 503,
            CatalogError::Transport(_) => 500,
            CatalogError::Unauthorized(_) => 403,
            CatalogError::NotFound(_) => 404,
            CatalogError::NotStarted => 409,
            CatalogError::LockPoisoned(_) => 500,
        }
    }
}
