//! In-process bus for registry change notifications, backed by a tokio
//! broadcast channel.

use tokio::sync::broadcast;

use switchyard_domain::external_service::ServiceChange;

/// Fan-out channel for [`ServiceChange`] notifications.
///
/// Publishing succeeds even when there are no active subscribers
/// (the notification is simply dropped). A subscriber that falls more than
/// `capacity` notifications behind observes
/// [`broadcast::error::RecvError::Lagged`] and must resynchronise.
#[derive(Clone)]
pub struct InProcessChangeBus {
    sender: broadcast::Sender<ServiceChange>,
}

impl InProcessChangeBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to notifications published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceChange> {
        self.sender.subscribe()
    }

    /// Publish a notification to every current subscriber.
    pub fn publish(&self, change: ServiceChange) {
        tracing::trace!(
            action = %change.action,
            service_id = %change.item.id,
            service_type = %change.item.service_type,
            "publishing service change"
        );
        // Only fails when nobody listens.
        let _ = self.sender.send(change);
    }
}
