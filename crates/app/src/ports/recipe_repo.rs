//! Recipe repository port: persistence for recipes.

use std::future::Future;
use std::sync::Arc;

use switchyard_domain::error::SwitchyardError;
use switchyard_domain::id::RecipeId;
use switchyard_domain::recipe::Recipe;

/// Repository for persisting and querying [`Recipe`]s.
pub trait RecipeRepository: Send + Sync {
    /// Create a new recipe in storage.
    fn create(
        &self,
        recipe: Recipe,
    ) -> impl Future<Output = Result<Recipe, SwitchyardError>> + Send;

    /// Get a recipe by its unique identifier.
    fn get_by_id(
        &self,
        id: RecipeId,
    ) -> impl Future<Output = Result<Option<Recipe>, SwitchyardError>> + Send;

    /// Get all recipes.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Recipe>, SwitchyardError>> + Send;

    /// Get all enabled recipes.
    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Recipe>, SwitchyardError>> + Send;

    /// Update an existing recipe.
    fn update(
        &self,
        recipe: Recipe,
    ) -> impl Future<Output = Result<Recipe, SwitchyardError>> + Send;

    /// Delete a recipe by its unique identifier.
    fn delete(&self, id: RecipeId) -> impl Future<Output = Result<(), SwitchyardError>> + Send;
}

impl<T: RecipeRepository> RecipeRepository for Arc<T> {
    fn create(
        &self,
        recipe: Recipe,
    ) -> impl Future<Output = Result<Recipe, SwitchyardError>> + Send {
        (**self).create(recipe)
    }

    fn get_by_id(
        &self,
        id: RecipeId,
    ) -> impl Future<Output = Result<Option<Recipe>, SwitchyardError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Recipe>, SwitchyardError>> + Send {
        (**self).get_all()
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Recipe>, SwitchyardError>> + Send {
        (**self).get_enabled()
    }

    fn update(
        &self,
        recipe: Recipe,
    ) -> impl Future<Output = Result<Recipe, SwitchyardError>> + Send {
        (**self).update(recipe)
    }

    fn delete(&self, id: RecipeId) -> impl Future<Output = Result<(), SwitchyardError>> + Send {
        (**self).delete(id)
    }
}
