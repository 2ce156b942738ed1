//! `SQLite` implementation of [`ExternalServiceRepository`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use switchyard_app::ports::ExternalServiceRepository;
use switchyard_domain::error::{NotFoundError, SwitchyardError};
use switchyard_domain::external_service::ExternalService;
use switchyard_domain::id::ServiceId;

use crate::error::{StorageError, decode_error};

struct Wrapper(ExternalService);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<ExternalService> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let service_type: String = row.try_get("service_type")?;
        let config: String = row.try_get("config")?;
        let checkpoint: String = row.try_get("checkpoint")?;

        Ok(Self(ExternalService {
            id: ServiceId::from_str(&id).map_err(decode_error)?,
            name,
            service_type,
            config: serde_json::from_str(&config).map_err(decode_error)?,
            checkpoint: serde_json::from_str(&checkpoint).map_err(decode_error)?,
        }))
    }
}

fn not_found(id: ServiceId) -> SwitchyardError {
    NotFoundError {
        entity: "ExternalService",
        id: id.to_string(),
    }
    .into()
}

/// `SQLite`-backed external service repository.
pub struct SqliteExternalServiceRepository {
    pool: SqlitePool,
}

impl SqliteExternalServiceRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ExternalServiceRepository for SqliteExternalServiceRepository {
    async fn create(&self, service: ExternalService) -> Result<ExternalService, SwitchyardError> {
        let config = serde_json::to_string(&service.config).map_err(StorageError::from)?;
        let checkpoint = serde_json::to_string(&service.checkpoint).map_err(StorageError::from)?;

        sqlx::query(
            "INSERT INTO external_services (id, name, service_type, config, checkpoint) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(service.id.to_string())
        .bind(&service.name)
        .bind(&service.service_type)
        .bind(&config)
        .bind(&checkpoint)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(service)
    }

    async fn get_by_id(&self, id: ServiceId) -> Result<Option<ExternalService>, SwitchyardError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM external_services WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<ExternalService>, SwitchyardError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM external_services ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_by_type(
        &self,
        service_type: &str,
    ) -> Result<Vec<ExternalService>, SwitchyardError> {
        let rows: Vec<Wrapper> = sqlx::query_as(
            "SELECT * FROM external_services WHERE service_type = ? ORDER BY name",
        )
        .bind(service_type)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, service: ExternalService) -> Result<ExternalService, SwitchyardError> {
        let config = serde_json::to_string(&service.config).map_err(StorageError::from)?;

        let done = sqlx::query(
            "UPDATE external_services SET name = ?, service_type = ?, config = ? WHERE id = ?",
        )
        .bind(&service.name)
        .bind(&service.service_type)
        .bind(&config)
        .bind(service.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;
        if done.rows_affected() == 0 {
            return Err(not_found(service.id));
        }

        self.get_by_id(service.id)
            .await?
            .ok_or_else(|| not_found(service.id))
    }

    async fn update_checkpoint(
        &self,
        id: ServiceId,
        checkpoint: serde_json::Value,
    ) -> Result<(), SwitchyardError> {
        let checkpoint = serde_json::to_string(&checkpoint).map_err(StorageError::from)?;

        let done = sqlx::query("UPDATE external_services SET checkpoint = ? WHERE id = ?")
            .bind(&checkpoint)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        if done.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn delete(&self, id: ServiceId) -> Result<(), SwitchyardError> {
        sqlx::query("DELETE FROM external_services WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use switchyard_domain::external_service::service_type;

    async fn setup() -> SqliteExternalServiceRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteExternalServiceRepository::new(db.pool().clone())
    }

    fn feed(name: &str) -> ExternalService {
        ExternalService::builder()
            .name(name)
            .service_type(service_type::INVOICE_FEED)
            .config(serde_json::json!({"store_id": "abc", "token": "t"}))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_create_and_retrieve_service() {
        let repo = setup().await;
        let svc = feed("Shop");

        repo.create(svc.clone()).await.unwrap();
        let fetched = repo.get_by_id(svc.id).await.unwrap().unwrap();

        assert_eq!(fetched, svc);
        assert!(fetched.checkpoint.is_null());
    }

    #[tokio::test]
    async fn should_return_none_when_service_not_found() {
        let repo = setup().await;
        assert!(repo.get_by_id(ServiceId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_find_services_by_type() {
        let repo = setup().await;
        repo.create(feed("B")).await.unwrap();
        repo.create(feed("A")).await.unwrap();
        repo.create(
            ExternalService::builder()
                .name("Inbox")
                .service_type(service_type::MAILBOX)
                .build()
                .unwrap(),
        )
        .await
        .unwrap();

        let feeds = repo.find_by_type(service_type::INVOICE_FEED).await.unwrap();
        let names: Vec<&str> = feeds.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(repo.get_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn should_keep_checkpoint_on_update() {
        let repo = setup().await;
        let svc = feed("Shop");
        repo.create(svc.clone()).await.unwrap();
        repo.update_checkpoint(svc.id, serde_json::json!({"statuses": {"A": "Paid"}}))
            .await
            .unwrap();

        let mut renamed = svc.clone();
        renamed.name = "Shop EU".to_string();
        let updated = repo.update(renamed).await.unwrap();

        assert_eq!(updated.name, "Shop EU");
        assert_eq!(updated.checkpoint["statuses"]["A"], "Paid");
    }

    #[tokio::test]
    async fn should_report_missing_service_on_checkpoint_write() {
        let repo = setup().await;
        let result = repo
            .update_checkpoint(ServiceId::new(), serde_json::json!({}))
            .await;
        assert!(matches!(result, Err(SwitchyardError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_delete_service() {
        let repo = setup().await;
        let svc = feed("Shop");
        repo.create(svc.clone()).await.unwrap();

        repo.delete(svc.id).await.unwrap();

        assert!(repo.get_by_id(svc.id).await.unwrap().is_none());
    }
}
