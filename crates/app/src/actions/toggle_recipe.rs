//! `ToggleRecipe`: enables, disables or flips another recipe.

use serde::{Deserialize, Serialize};

use switchyard_domain::action_result::ActionHandlerResult;
use switchyard_domain::error::SwitchyardError;
use switchyard_domain::id::RecipeId;
use switchyard_domain::recipe::RecipeAction;
use switchyard_domain::trigger::EventData;

use super::{ActionContext, TypedActionHandler, describe};
use crate::ports::RecipeRepository;

/// What to do with the target's `enabled` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOption {
    Enable,
    Disable,
    Toggle,
}

impl ToggleOption {
    #[must_use]
    pub fn apply(self, enabled: bool) -> bool {
        match self {
            Self::Enable => true,
            Self::Disable => false,
            Self::Toggle => !enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleRecipeConfig {
    pub target_recipe_id: RecipeId,
    pub option: ToggleOption,
}

/// Handler for the `ToggleRecipe` action.
pub struct ToggleRecipeHandler<R> {
    recipes: R,
}

impl<R> ToggleRecipeHandler<R> {
    pub const ACTION_ID: &'static str = "ToggleRecipe";

    pub fn new(recipes: R) -> Self {
        Self { recipes }
    }
}

impl<R: RecipeRepository + 'static> ToggleRecipeHandler<R> {
    async fn apply(
        &self,
        config: &ToggleRecipeConfig,
    ) -> Result<ActionHandlerResult, SwitchyardError> {
        let Some(mut recipe) = self.recipes.get_by_id(config.target_recipe_id).await? else {
            return Ok(ActionHandlerResult::failure("Could not find recipe to toggle"));
        };

        recipe.enabled = config.option.apply(recipe.enabled);
        let recipe = self.recipes.update(recipe).await?;

        tracing::info!(
            recipe_id = %recipe.id,
            enabled = recipe.enabled,
            "recipe toggled"
        );
        let state = if recipe.enabled { "Enabled" } else { "Disabled" };
        Ok(ActionHandlerResult::success(format!(
            "Recipe {} is now {state}",
            recipe.name
        ))
        .with_data(serde_json::json!({
            "recipe_id": recipe.id,
            "enabled": recipe.enabled,
        })))
    }
}

impl<R: RecipeRepository + 'static> TypedActionHandler for ToggleRecipeHandler<R> {
    type Config = ToggleRecipeConfig;

    fn action_id(&self) -> &'static str {
        Self::ACTION_ID
    }

    async fn execute(
        &self,
        _data: &EventData,
        _action: &RecipeAction,
        config: ToggleRecipeConfig,
        _context: &ActionContext,
    ) -> Result<ActionHandlerResult, SwitchyardError> {
        match self.apply(&config).await {
            Ok(result) => Ok(result),
            Err(err) => Ok(ActionHandlerResult::failure(format!(
                "Could not toggle recipe because {}",
                describe(&err)
            ))),
        }
    }
}
