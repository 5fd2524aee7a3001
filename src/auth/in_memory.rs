//! In-process auth provider.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use super::{AuthError, AuthProvider, Credentials, SessionId};

/// Auth provider that issues uuid identities for anonymous sign-in and
/// resolves pre-registered custom tokens.
///
/// One instance stands for one browser session: once signed in, further
/// sign-ins return the same identity.
#[derive(Clone)]
pub struct InMemoryAuth {
    tokens: Arc<RwLock<HashMap<String, SessionId>>>,
    state: Arc<watch::Sender<Option<SessionId>>>,
}

impl Default for InMemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuth {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
            state: Arc::new(state),
        }
    }

    /// Accept `token` as a custom token for `session`.
    pub fn register_token(&self, token: impl Into<String>, session: impl Into<SessionId>) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.into(), session.into());
        }
    }

    /// Drop the current session.
    pub fn sign_out(&self) {
        self.state.send_replace(None);
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuth {
    fn current_session(&self) -> Option<SessionId> {
        self.state.borrow().clone()
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<SessionId, AuthError> {
        if let Some(existing) = self.current_session() {
            return Ok(existing);
        }

        let session = match credentials {
            Credentials::Anonymous => SessionId::new(Uuid::new_v4().to_string()),
            Credentials::CustomToken(token) => self
                .tokens
                .read()
                .map_err(|_| AuthError::Unavailable("token registry poisoned".into()))?
                .get(&token)
                .cloned()
                .ok_or(AuthError::InvalidToken)?,
        };

        info!(session = %session, "signed in");
        self.state.send_replace(Some(session.clone()));
        Ok(session)
    }

    fn auth_state(&self) -> watch::Receiver<Option<SessionId>> {
        self.state.subscribe()
    }
}
