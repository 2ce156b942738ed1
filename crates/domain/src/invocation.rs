//! Recipe invocation: the record of one recipe run caused by one trigger.

use serde::{Deserialize, Serialize};

use crate::action_result::ActionHandlerResult;
use crate::id::{InvocationId, RecipeId};
use crate::time::{self, Timestamp};
use crate::trigger::{EventData, TriggerEvent};

/// History entry for a recipe execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeInvocation {
    pub id: InvocationId,
    pub recipe_id: RecipeId,
    pub trigger_kind: String,
    pub trigger_data: EventData,
    pub results: Vec<ActionHandlerResult>,
    /// Set when a hard error aborted the run; `results` then covers the
    /// actions attempted before it.
    pub error: Option<String>,
    pub timestamp: Timestamp,
}

impl RecipeInvocation {
    /// Record a completed run.
    #[must_use]
    pub fn completed(
        recipe_id: RecipeId,
        event: &TriggerEvent,
        results: Vec<ActionHandlerResult>,
    ) -> Self {
        Self {
            id: InvocationId::new(),
            recipe_id,
            trigger_kind: event.kind.clone(),
            trigger_data: event.data.clone(),
            results,
            error: None,
            timestamp: time::now(),
        }
    }

    /// Record a run that aborted after attempting `results`.
    #[must_use]
    pub fn aborted(
        recipe_id: RecipeId,
        event: &TriggerEvent,
        results: Vec<ActionHandlerResult>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::completed(recipe_id, event, results)
        }
    }

    /// Whether every attempted action executed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.results.iter().all(|r| r.executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> TriggerEvent {
        TriggerEvent::new("ReceivedEmail", EventData::new())
    }

    #[test]
    fn should_succeed_when_all_results_executed() {
        let inv = RecipeInvocation::completed(
            RecipeId::new(),
            &event(),
            vec![ActionHandlerResult::success("a"), ActionHandlerResult::success("b")],
        );
        assert!(inv.succeeded());
        assert_eq!(inv.trigger_kind, "ReceivedEmail");
    }

    #[test]
    fn should_fail_when_any_result_failed() {
        let inv = RecipeInvocation::completed(
            RecipeId::new(),
            &event(),
            vec![ActionHandlerResult::success("a"), ActionHandlerResult::failure("b")],
        );
        assert!(!inv.succeeded());
    }

    #[test]
    fn should_fail_when_aborted() {
        let inv = RecipeInvocation::aborted(
            RecipeId::new(),
            &event(),
            vec![ActionHandlerResult::success("order placed")],
            "bad config",
        );
        assert!(!inv.succeeded());
        assert_eq!(inv.results.len(), 1);
        assert_eq!(inv.error.as_deref(), Some("bad config"));
    }
}
