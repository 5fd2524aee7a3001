//! Auth collaborator - issues the per-session identity.
//!
//! The catalog only needs a stable identity string per browser session and a
//! way to observe when one becomes available. Reconnection and token refresh
//! are the provider's business.

mod in_memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub use in_memory::InMemoryAuth;

/// Stable identity of one authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// How to sign in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Anonymous,
    /// A token minted by the hosting environment.
    CustomToken(String),
}

impl Credentials {
    /// Custom token when one is configured, anonymous otherwise.
    pub fn from_token(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some(token) if !token.is_empty() => Credentials::CustomToken(token.to_string()),
            _ => Credentials::Anonymous,
        }
    }
}

/// Error type for sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The custom token was not accepted.
    InvalidToken,
    /// The provider could not be reached.
    Unavailable(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidToken => write!(f, "custom auth token rejected"),
            AuthError::Unavailable(msg) => write!(f, "auth provider unavailable: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// The auth provider the catalog signs in against.
#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    /// The currently signed-in session, if any.
    fn current_session(&self) -> Option<SessionId>;

    /// Sign in and return the session identity.
    async fn sign_in(&self, credentials: Credentials) -> Result<SessionId, AuthError>;

    /// Auth-state notifications: `Some` once signed in.
    fn auth_state(&self) -> watch::Receiver<Option<SessionId>>;
}
