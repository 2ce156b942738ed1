//! `SQLite` implementation of [`RecipeRepository`].
//!
//! The trigger subscription and the action graph are stored as JSON columns.

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use switchyard_app::ports::RecipeRepository;
use switchyard_domain::error::{NotFoundError, SwitchyardError};
use switchyard_domain::id::RecipeId;
use switchyard_domain::recipe::Recipe;

use crate::error::{StorageError, decode_error};

struct Wrapper(Recipe);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Recipe> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let enabled: bool = row.try_get("enabled")?;
        let trigger_json: String = row.try_get("trigger_data")?;
        let root_json: String = row.try_get("root")?;

        Ok(Self(Recipe {
            id: RecipeId::from_str(&id).map_err(decode_error)?,
            name,
            enabled,
            trigger: serde_json::from_str(&trigger_json).map_err(decode_error)?,
            root: serde_json::from_str(&root_json).map_err(decode_error)?,
        }))
    }
}

/// `SQLite`-backed recipe repository.
pub struct SqliteRecipeRepository {
    pool: SqlitePool,
}

impl SqliteRecipeRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RecipeRepository for SqliteRecipeRepository {
    async fn create(&self, recipe: Recipe) -> Result<Recipe, SwitchyardError> {
        let trigger_json = serde_json::to_string(&recipe.trigger).map_err(StorageError::from)?;
        let root_json = serde_json::to_string(&recipe.root).map_err(StorageError::from)?;

        sqlx::query(
            "INSERT INTO recipes (id, name, enabled, trigger_data, root) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(recipe.id.to_string())
        .bind(&recipe.name)
        .bind(recipe.enabled)
        .bind(&trigger_json)
        .bind(&root_json)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(recipe)
    }

    async fn get_by_id(&self, id: RecipeId) -> Result<Option<Recipe>, SwitchyardError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM recipes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Recipe>, SwitchyardError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM recipes ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get_enabled(&self) -> Result<Vec<Recipe>, SwitchyardError> {
        let rows: Vec<Wrapper> =
            sqlx::query_as("SELECT * FROM recipes WHERE enabled = 1 ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, recipe: Recipe) -> Result<Recipe, SwitchyardError> {
        let trigger_json = serde_json::to_string(&recipe.trigger).map_err(StorageError::from)?;
        let root_json = serde_json::to_string(&recipe.root).map_err(StorageError::from)?;

        let done = sqlx::query(
            "UPDATE recipes SET name = ?, enabled = ?, trigger_data = ?, root = ? WHERE id = ?",
        )
        .bind(&recipe.name)
        .bind(recipe.enabled)
        .bind(&trigger_json)
        .bind(&root_json)
        .bind(recipe.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;
        if done.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Recipe",
                id: recipe.id.to_string(),
            }
            .into());
        }

        Ok(recipe)
    }

    async fn delete(&self, id: RecipeId) -> Result<(), SwitchyardError> {
        sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
