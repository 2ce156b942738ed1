//! Outcome of one attempted action.

use serde::{Deserialize, Serialize};

/// What a handler reports after running (or failing to run) an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionHandlerResult {
    pub executed: bool,
    /// Human-readable outcome.
    pub result: String,
    /// Structured output exposed to later actions' templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ActionHandlerResult {
    #[must_use]
    pub fn success(result: impl Into<String>) -> Self {
        Self {
            executed: true,
            result: result.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn failure(result: impl Into<String>) -> Self {
        Self {
            executed: false,
            result: result.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl std::fmt::Display for ActionHandlerResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = if self.executed { "ok" } else { "failed" };
        write!(f, "[{tag}] {}", self.result)
    }
}
