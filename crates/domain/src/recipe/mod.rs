//! Recipe: a named, switchable automation: a trigger subscription plus an
//! action graph executed whenever a matching trigger event arrives.

mod action;
mod group;

pub use action::RecipeAction;
pub use group::{ContinuationPolicy, RecipeActionGroup, RecipeStep};

use serde::{Deserialize, Serialize};

use crate::error::{SwitchyardError, ValidationError};
use crate::id::RecipeId;
use crate::trigger::RecipeTrigger;

/// A persisted automation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub enabled: bool,
    pub trigger: RecipeTrigger,
    pub root: RecipeActionGroup,
}

impl Recipe {
    /// Create a builder for constructing a [`Recipe`].
    #[must_use]
    pub fn builder() -> RecipeBuilder {
        RecipeBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - the trigger kind is empty ([`ValidationError::EmptyTriggerKind`])
    /// - any action has an empty `action_id` ([`ValidationError::EmptyActionId`])
    pub fn validate(&self) -> Result<(), SwitchyardError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.trigger.kind.is_empty() {
            return Err(ValidationError::EmptyTriggerKind.into());
        }
        if self.root.actions().iter().any(|a| a.action_id.is_empty()) {
            return Err(ValidationError::EmptyActionId.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Recipe`].
#[derive(Debug, Default)]
pub struct RecipeBuilder {
    id: Option<RecipeId>,
    name: Option<String>,
    enabled: Option<bool>,
    trigger: Option<RecipeTrigger>,
    root: Option<RecipeActionGroup>,
}

impl RecipeBuilder {
    #[must_use]
    pub fn id(mut self, id: RecipeId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: RecipeTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn root(mut self, root: RecipeActionGroup) -> Self {
        self.root = Some(root);
        self
    }

    /// Append an action to the root group.
    #[must_use]
    pub fn action(mut self, action: RecipeAction) -> Self {
        let root = self.root.take().unwrap_or_default();
        self.root = Some(root.action(action));
        self
    }

    /// Consume the builder, validate, and return a [`Recipe`].
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::Validation`] if required fields are missing or empty.
    pub fn build(self) -> Result<Recipe, SwitchyardError> {
        let recipe = Recipe {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
            trigger: self.trigger.unwrap_or_else(|| RecipeTrigger::new("")),
            root: self.root.unwrap_or_default(),
        };
        recipe.validate()?;
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::trigger_kind;

    fn toggle_action() -> RecipeAction {
        RecipeAction::new(
            "ToggleRecipe",
            serde_json::json!({"target_recipe_id": RecipeId::new(), "option": "toggle"}),
        )
    }

    fn valid_recipe() -> Recipe {
        Recipe::builder()
            .name("Pause on paid invoice")
            .trigger(RecipeTrigger::new(trigger_kind::INVOICE_STATUS_CHANGED))
            .action(toggle_action())
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_valid_recipe_when_required_fields_provided() {
        let recipe = valid_recipe();
        assert_eq!(recipe.name, "Pause on paid invoice");
        assert!(recipe.enabled);
        assert_eq!(recipe.root.steps.len(), 1);
        assert_eq!(recipe.root.policy, ContinuationPolicy::StopOnFailure);
    }

    #[test]
    fn should_build_disabled_recipe_when_enabled_is_false() {
        let recipe = Recipe::builder()
            .name("Disabled")
            .enabled(false)
            .trigger(RecipeTrigger::new(trigger_kind::RECEIVED_EMAIL))
            .build()
            .unwrap();
        assert!(!recipe.enabled);
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Recipe::builder()
            .trigger(RecipeTrigger::new(trigger_kind::RECEIVED_EMAIL))
            .build();
        assert!(matches!(
            result,
            Err(SwitchyardError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_return_validation_error_when_trigger_is_missing() {
        let result = Recipe::builder().name("No trigger").build();
        assert!(matches!(
            result,
            Err(SwitchyardError::Validation(ValidationError::EmptyTriggerKind))
        ));
    }

    #[test]
    fn should_return_validation_error_when_nested_action_id_is_empty() {
        let result = Recipe::builder()
            .name("Broken")
            .trigger(RecipeTrigger::new(trigger_kind::RECEIVED_EMAIL))
            .root(
                RecipeActionGroup::default()
                    .group(RecipeActionGroup::default().action(RecipeAction::new(
                        "",
                        serde_json::Value::Null,
                    ))),
            )
            .build();
        assert!(matches!(
            result,
            Err(SwitchyardError::Validation(ValidationError::EmptyActionId))
        ));
    }

    #[test]
    fn should_keep_explicit_root_policy_when_appending_actions() {
        let recipe = Recipe::builder()
            .name("Fan out")
            .trigger(RecipeTrigger::new(trigger_kind::RECEIVED_EMAIL))
            .root(RecipeActionGroup::new(ContinuationPolicy::Continue))
            .action(toggle_action())
            .action(toggle_action())
            .build()
            .unwrap();
        assert_eq!(recipe.root.policy, ContinuationPolicy::Continue);
        assert_eq!(recipe.root.actions().len(), 2);
    }

    #[test]
    fn should_set_custom_id_via_builder() {
        let id = RecipeId::new();
        let recipe = Recipe::builder()
            .id(id)
            .name("Custom ID")
            .trigger(RecipeTrigger::new(trigger_kind::RECEIVED_EMAIL))
            .build()
            .unwrap();
        assert_eq!(recipe.id, id);
    }

    #[test]
    fn should_roundtrip_recipe_through_serde_json() {
        let recipe = valid_recipe();
        let json = serde_json::to_string(&recipe).unwrap();
        let parsed: Recipe = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, recipe);
    }
}
