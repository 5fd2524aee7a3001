//! Admin Election - the first session to arrive owns the catalog.
//!
//! A single shared marker document names the owning session. The first
//! session that finds it absent claims it; everyone else compares their own
//! identity against it. Ownership is never transferred or revoked.
//!
//! The claim is conditional. An absent marker is claimed with
//! `WritePrecondition::DoesNotExist`; a marker without an owner is replaced
//! with `WritePrecondition::Matches` on the fields that were read. Either way
//! two racing sessions cannot both win: the loser gets `PreconditionFailed`,
//! re-reads the marker and sees the winner. A store without conditional
//! writes forces a fallback to last-write-wins, in which case both racers may
//! believe they won; that fallback is logged.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::SessionId;
use crate::store::{Document, DocumentStore, StoreError, WritePrecondition, WriteResult};

/// The shared owner record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminMarker {
    pub owner_id: String,
}

impl AdminMarker {
    pub fn new(owner: &SessionId) -> Self {
        Self {
            owner_id: owner.as_str().to_string(),
        }
    }

    pub fn is_owned_by(&self, session: &SessionId) -> bool {
        self.owner_id == session.as_str()
    }
}

/// Runs the election against one marker document.
pub struct AdminElection<S> {
    store: S,
    marker_path: String,
}

impl<S: DocumentStore> AdminElection<S> {
    pub fn new(store: S, marker_path: impl Into<String>) -> Self {
        Self {
            store,
            marker_path: marker_path.into(),
        }
    }

    /// Read the marker. A document without an owner counts as absent.
    pub async fn marker(&self) -> Result<Option<AdminMarker>, StoreError> {
        Ok(self
            .store
            .get(&self.marker_path)
            .await?
            .as_ref()
            .and_then(owner_of))
    }

    /// Decide whether `session` is the admin, claiming the marker if nobody has.
    ///
    /// Call once per session, after sign-in.
    pub async fn establish(&self, session: &SessionId) -> Result<bool, StoreError> {
        let existing = self.store.get(&self.marker_path).await?;
        let precondition = match existing {
            Some(doc) => match owner_of(&doc) {
                Some(marker) => {
                    let is_admin = marker.is_owned_by(session);
                    info!(session = %session, is_admin, "admin marker found");
                    return Ok(is_admin);
                }
                None => {
                    warn!(path = %self.marker_path, "admin marker has no owner, claiming it");
                    WritePrecondition::Matches(doc.data)
                }
            },
            None => WritePrecondition::DoesNotExist,
        };

        let claim = serde_json::to_value(AdminMarker::new(session))
            .map_err(|e| StoreError::Serde(e.to_string()))?;

        match self
            .store
            .set(&self.marker_path, claim.clone(), precondition)
            .await
        {
            Ok(WriteResult::Written) => {
                info!(session = %session, "no admin marker, session claimed ownership");
                Ok(true)
            }
            Ok(WriteResult::PreconditionFailed) => {
                let is_admin = self
                    .marker()
                    .await?
                    .is_some_and(|marker| marker.is_owned_by(session));
                info!(session = %session, is_admin, "lost the admin claim race");
                Ok(is_admin)
            }
            Err(StoreError::Unsupported(reason)) => {
                warn!(
                    session = %session,
                    %reason,
                    "store has no conditional writes, claiming admin with an unconditional write; \
                     concurrent first sessions may both believe they own the catalog"
                );
                self.store
                    .set(&self.marker_path, claim, WritePrecondition::None)
                    .await?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }
}

fn owner_of(doc: &Document) -> Option<AdminMarker> {
    doc.data
        .get("ownerId")
        .and_then(|v| v.as_str())
        .filter(|owner| !owner.is_empty())
        .map(|owner| AdminMarker {
            owner_id: owner.to_string(),
        })
}
