//! Recipe action: one step of a recipe, executed by the handler its
//! `action_id` selects.

use serde::{Deserialize, Serialize};

use crate::id::{RecipeActionId, ServiceId};

/// A single configured step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeAction {
    #[serde(default)]
    pub id: RecipeActionId,
    /// Handler identifier, e.g. `"ToggleRecipe"`.
    pub action_id: String,
    /// Service the action operates against, when it needs one.
    #[serde(default)]
    pub external_service_id: Option<ServiceId>,
    /// Handler-specific configuration; string fields may contain
    /// `{{Path.To.Value}}` tokens.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl RecipeAction {
    #[must_use]
    pub fn new(action_id: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: RecipeActionId::new(),
            action_id: action_id.into(),
            external_service_id: None,
            data,
        }
    }

    #[must_use]
    pub fn on_service(mut self, service_id: ServiceId) -> Self {
        self.external_service_id = Some(service_id);
        self
    }
}

impl std::fmt::Display for RecipeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.external_service_id {
            Some(service) => write!(f, "{}@{service}", self.action_id),
            None => f.write_str(&self.action_id),
        }
    }
}
