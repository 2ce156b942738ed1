//! Service registry port: the source of truth watchers load handles from,
//! persist checkpoints through, and receive change notifications from.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;

use switchyard_domain::error::SwitchyardError;
use switchyard_domain::external_service::{ExternalService, ServiceChange};
use switchyard_domain::id::ServiceId;

/// Read/update view of configured external services.
pub trait ServiceRegistry: Send + Sync {
    /// All services of one type, checkpoints included.
    fn list(
        &self,
        service_type: &str,
    ) -> impl Future<Output = Result<Vec<ExternalService>, SwitchyardError>> + Send;

    /// One service by id.
    fn get(
        &self,
        id: ServiceId,
    ) -> impl Future<Output = Result<Option<ExternalService>, SwitchyardError>> + Send;

    /// Swap the stored checkpoint of `id` for `checkpoint`.
    fn update_checkpoint(
        &self,
        id: ServiceId,
        checkpoint: serde_json::Value,
    ) -> impl Future<Output = Result<(), SwitchyardError>> + Send;

    /// Receive every change published after this call.
    fn subscribe(&self) -> broadcast::Receiver<ServiceChange>;
}

impl<T: ServiceRegistry> ServiceRegistry for Arc<T> {
    fn list(
        &self,
        service_type: &str,
    ) -> impl Future<Output = Result<Vec<ExternalService>, SwitchyardError>> + Send {
        (**self).list(service_type)
    }

    fn get(
        &self,
        id: ServiceId,
    ) -> impl Future<Output = Result<Option<ExternalService>, SwitchyardError>> + Send {
        (**self).get(id)
    }

    fn update_checkpoint(
        &self,
        id: ServiceId,
        checkpoint: serde_json::Value,
    ) -> impl Future<Output = Result<(), SwitchyardError>> + Send {
        (**self).update_checkpoint(id, checkpoint)
    }

    fn subscribe(&self) -> broadcast::Receiver<ServiceChange> {
        (**self).subscribe()
    }
}
