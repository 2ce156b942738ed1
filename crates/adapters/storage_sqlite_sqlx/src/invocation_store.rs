//! `SQLite` implementation of [`InvocationStore`].

use std::str::FromStr;

use chrono::SecondsFormat;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use switchyard_app::ports::InvocationStore;
use switchyard_domain::error::SwitchyardError;
use switchyard_domain::id::{InvocationId, RecipeId};
use switchyard_domain::invocation::RecipeInvocation;
use switchyard_domain::time;

use crate::error::{StorageError, decode_error};

struct Wrapper(RecipeInvocation);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let recipe_id: String = row.try_get("recipe_id")?;
        let trigger_kind: String = row.try_get("trigger_kind")?;
        let trigger_data: String = row.try_get("trigger_data")?;
        let results: String = row.try_get("results")?;
        let error: Option<String> = row.try_get("error")?;
        let timestamp: String = row.try_get("timestamp")?;

        Ok(Self(RecipeInvocation {
            id: InvocationId::from_str(&id).map_err(decode_error)?,
            recipe_id: RecipeId::from_str(&recipe_id).map_err(decode_error)?,
            trigger_kind,
            trigger_data: serde_json::from_str(&trigger_data).map_err(decode_error)?,
            results: serde_json::from_str(&results).map_err(decode_error)?,
            error,
            timestamp: time::parse_rfc3339(&timestamp).map_err(decode_error)?,
        }))
    }
}

/// `SQLite`-backed, append-only invocation history.
pub struct SqliteInvocationStore {
    pool: SqlitePool,
}

impl SqliteInvocationStore {
    /// Create a new store backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl InvocationStore for SqliteInvocationStore {
    async fn append(
        &self,
        invocation: RecipeInvocation,
    ) -> Result<RecipeInvocation, SwitchyardError> {
        let trigger_data =
            serde_json::to_string(&invocation.trigger_data).map_err(StorageError::from)?;
        let results = serde_json::to_string(&invocation.results).map_err(StorageError::from)?;
        // Fixed-width UTC text keeps lexical and chronological order aligned.
        let timestamp = invocation
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Micros, true);

        sqlx::query(
            "INSERT INTO recipe_invocations (id, recipe_id, trigger_kind, trigger_data, results, error, timestamp) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(invocation.id.to_string())
        .bind(invocation.recipe_id.to_string())
        .bind(&invocation.trigger_kind)
        .bind(&trigger_data)
        .bind(&results)
        .bind(&invocation.error)
        .bind(&timestamp)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(invocation)
    }

    async fn find_by_recipe(
        &self,
        recipe_id: RecipeId,
        limit: usize,
    ) -> Result<Vec<RecipeInvocation>, SwitchyardError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(
            "SELECT * FROM recipe_invocations WHERE recipe_id = ? ORDER BY timestamp DESC LIMIT ?",
        )
        .bind(recipe_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use chrono::Duration;
    use switchyard_domain::action_result::ActionHandlerResult;
    use switchyard_domain::trigger::{EventData, TriggerEvent};

    async fn setup() -> SqliteInvocationStore {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteInvocationStore::new(db.pool().clone())
    }

    fn event() -> TriggerEvent {
        let mut data = EventData::new();
        data.insert("Email".into(), serde_json::json!({"subject": "hi"}));
        TriggerEvent::new("ReceivedEmail", data)
    }

    #[tokio::test]
    async fn should_append_and_read_back_invocation() {
        let store = setup().await;
        let recipe_id = RecipeId::new();
        let record = RecipeInvocation::completed(
            recipe_id,
            &event(),
            vec![ActionHandlerResult::success("sent").with_data(serde_json::json!({"n": 1}))],
        );

        store.append(record.clone()).await.unwrap();
        let history = store.find_by_recipe(recipe_id, 10).await.unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, record.id);
        assert_eq!(history[0].trigger_data["Email"]["subject"], "hi");
        assert_eq!(history[0].results, record.results);
    }

    #[tokio::test]
    async fn should_return_newest_first_and_honour_limit() {
        let store = setup().await;
        let recipe_id = RecipeId::new();
        let mut older = RecipeInvocation::aborted(recipe_id, &event(), Vec::new(), "boom");
        older.timestamp -= Duration::minutes(5);
        let newer = RecipeInvocation::completed(recipe_id, &event(), Vec::new());
        store.append(older.clone()).await.unwrap();
        store.append(newer.clone()).await.unwrap();
        store
            .append(RecipeInvocation::completed(RecipeId::new(), &event(), Vec::new()))
            .await
            .unwrap();

        let all = store.find_by_recipe(recipe_id, 10).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].error.as_deref(), Some("boom"));

        let latest = store.find_by_recipe(recipe_id, 1).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].id, newer.id);
    }
}
