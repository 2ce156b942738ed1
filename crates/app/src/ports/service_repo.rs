//! External service repository port: persistence for configured services.

use std::future::Future;

use switchyard_domain::error::SwitchyardError;
use switchyard_domain::external_service::ExternalService;
use switchyard_domain::id::ServiceId;

/// Repository for persisting and querying [`ExternalService`]s.
pub trait ExternalServiceRepository: Send + Sync {
    /// Create a new service record.
    fn create(
        &self,
        service: ExternalService,
    ) -> impl Future<Output = Result<ExternalService, SwitchyardError>> + Send;

    /// Get a service by its unique identifier.
    fn get_by_id(
        &self,
        id: ServiceId,
    ) -> impl Future<Output = Result<Option<ExternalService>, SwitchyardError>> + Send;

    /// Get every service.
    fn get_all(
        &self,
    ) -> impl Future<Output = Result<Vec<ExternalService>, SwitchyardError>> + Send;

    /// Get every service of one type.
    fn find_by_type(
        &self,
        service_type: &str,
    ) -> impl Future<Output = Result<Vec<ExternalService>, SwitchyardError>> + Send;

    /// Replace name, type and config, leaving the stored checkpoint alone.
    fn update(
        &self,
        service: ExternalService,
    ) -> impl Future<Output = Result<ExternalService, SwitchyardError>> + Send;

    /// Replace only the checkpoint.
    fn update_checkpoint(
        &self,
        id: ServiceId,
        checkpoint: serde_json::Value,
    ) -> impl Future<Output = Result<(), SwitchyardError>> + Send;

    /// Delete a service by its unique identifier.
    fn delete(&self, id: ServiceId) -> impl Future<Output = Result<(), SwitchyardError>> + Send;
}
