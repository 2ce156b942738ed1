//! External service manager: use-cases for configuring external services,
//! and the [`ServiceRegistry`] watchers consume.

use tokio::sync::broadcast;

use switchyard_domain::error::{NotFoundError, SwitchyardError};
use switchyard_domain::external_service::{ExternalService, ServiceChange};
use switchyard_domain::id::ServiceId;

use crate::change_bus::InProcessChangeBus;
use crate::ports::{ExternalServiceRepository, ServiceRegistry};

/// Application service for external service CRUD.
///
/// Every configuration change is announced on the change bus; checkpoint
/// writes are not, since only the owning watcher produces them.
pub struct ExternalServiceManager<R> {
    repo: R,
    bus: InProcessChangeBus,
}

impl<R: ExternalServiceRepository> ExternalServiceManager<R> {
    /// Create a new manager backed by the given repository and bus.
    pub fn new(repo: R, bus: InProcessChangeBus) -> Self {
        Self { repo, bus }
    }

    /// Register a new service and announce it.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, service), fields(service_name = %service.name, service_type = %service.service_type))]
    pub async fn create_service(
        &self,
        service: ExternalService,
    ) -> Result<ExternalService, SwitchyardError> {
        service.validate()?;
        let created = self.repo.create(service).await?;
        self.bus.publish(ServiceChange::added(created.clone()));
        Ok(created)
    }

    /// Look up a service by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::NotFound`] when no service with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_service(&self, id: ServiceId) -> Result<ExternalService, SwitchyardError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "ExternalService",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List every configured service.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_services(&self) -> Result<Vec<ExternalService>, SwitchyardError> {
        self.repo.get_all().await
    }

    /// Replace a service's name, type and config and announce the change.
    ///
    /// The stored checkpoint is kept; the announced item carries it.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::Validation`] if invariants fail,
    /// [`SwitchyardError::NotFound`] if the service does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, service), fields(service_id = %service.id))]
    pub async fn update_service(
        &self,
        service: ExternalService,
    ) -> Result<ExternalService, SwitchyardError> {
        service.validate()?;
        let existing = self.get_service(service.id).await?;
        let updated = self
            .repo
            .update(ExternalService {
                checkpoint: existing.checkpoint,
                ..service
            })
            .await?;
        self.bus.publish(ServiceChange::updated(updated.clone()));
        Ok(updated)
    }

    /// Delete a service and announce its removal.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::NotFound`] if the service does not exist,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_service(&self, id: ServiceId) -> Result<(), SwitchyardError> {
        let existing = self.get_service(id).await?;
        self.repo.delete(id).await?;
        self.bus.publish(ServiceChange::removed(existing));
        Ok(())
    }
}

impl<R: ExternalServiceRepository> ServiceRegistry for ExternalServiceManager<R> {
    async fn list(&self, service_type: &str) -> Result<Vec<ExternalService>, SwitchyardError> {
        self.repo.find_by_type(service_type).await
    }

    async fn get(&self, id: ServiceId) -> Result<Option<ExternalService>, SwitchyardError> {
        self.repo.get_by_id(id).await
    }

    async fn update_checkpoint(
        &self,
        id: ServiceId,
        checkpoint: serde_json::Value,
    ) -> Result<(), SwitchyardError> {
        self.repo.update_checkpoint(id, checkpoint).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ServiceChange> {
        self.bus.subscribe()
    }
}
