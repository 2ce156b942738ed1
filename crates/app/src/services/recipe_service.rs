//! Recipe service: use-cases for managing recipes.

use switchyard_domain::error::{NotFoundError, SwitchyardError};
use switchyard_domain::id::RecipeId;
use switchyard_domain::recipe::Recipe;

use crate::ports::RecipeRepository;

/// Application service for recipe CRUD operations.
pub struct RecipeService<R> {
    repo: R,
}

impl<R: RecipeRepository> RecipeService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Create a new recipe after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, recipe), fields(recipe_name = %recipe.name))]
    pub async fn create_recipe(&self, recipe: Recipe) -> Result<Recipe, SwitchyardError> {
        recipe.validate()?;
        self.repo.create(recipe).await
    }

    /// Look up a recipe by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::NotFound`] when no recipe with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_recipe(&self, id: RecipeId) -> Result<Recipe, SwitchyardError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Recipe",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all recipes.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, SwitchyardError> {
        self.repo.get_all().await
    }

    /// Get all enabled recipes.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_enabled(&self) -> Result<Vec<Recipe>, SwitchyardError> {
        self.repo.get_enabled().await
    }

    /// Update an existing recipe.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::Validation`] if invariants fail, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, recipe), fields(recipe_id = %recipe.id))]
    pub async fn update_recipe(&self, recipe: Recipe) -> Result<Recipe, SwitchyardError> {
        recipe.validate()?;
        self.repo.update(recipe).await
    }

    /// Switch a recipe on or off.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::NotFound`] if the recipe does not exist,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn set_enabled(&self, id: RecipeId, enabled: bool) -> Result<Recipe, SwitchyardError> {
        let mut recipe = self.get_recipe(id).await?;
        recipe.enabled = enabled;
        self.repo.update(recipe).await
    }

    /// Delete a recipe by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_recipe(&self, id: RecipeId) -> Result<(), SwitchyardError> {
        self.repo.delete(id).await
    }
}
