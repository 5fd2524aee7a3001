//! Live subscription handle: a cancellable stream of collection snapshots.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{Document, StoreError};

/// One delivery on a subscription: the full collection, or a failure.
pub type SnapshotEvent = Result<Vec<Document>, StoreError>;

/// Store-side half of a subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionSender {
    tx: UnboundedSender<SnapshotEvent>,
}

impl SubscriptionSender {
    /// Push an event. Returns false once the subscriber has gone away.
    pub fn deliver(&self, event: SnapshotEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Client-side half of a subscription.
///
/// Dropping it (or calling [`cancel`](Self::cancel)) detaches it; the store
/// prunes the sender on its next delivery.
#[derive(Debug)]
pub struct Subscription {
    rx: UnboundedReceiver<SnapshotEvent>,
}

impl Subscription {
    /// Create a connected sender/subscription pair.
    pub fn channel() -> (SubscriptionSender, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SubscriptionSender { tx }, Subscription { rx })
    }

    /// Wait for the next delivery. `None` once the store has ended the subscription.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.rx.recv().await
    }

    /// Take a delivery if one is already queued.
    pub fn try_next(&mut self) -> Option<SnapshotEvent> {
        self.rx.try_recv().ok()
    }

    /// Stop receiving. Queued deliveries are discarded.
    pub fn cancel(mut self) {
        self.rx.close();
    }
}
