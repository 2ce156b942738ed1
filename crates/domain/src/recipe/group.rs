//! Action groups: ordered, policy-governed collections of actions and
//! nested groups.

use serde::{Deserialize, Serialize};

use super::action::RecipeAction;

/// What a group does after a child reports a failed execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationPolicy {
    /// Run every child regardless of earlier outcomes.
    Continue,
    /// Skip the remaining children once the latest result failed.
    #[default]
    StopOnFailure,
}

/// One child of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecipeStep {
    Action(RecipeAction),
    Group(RecipeActionGroup),
}

/// An ordered sequence of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeActionGroup {
    #[serde(default)]
    pub policy: ContinuationPolicy,
    #[serde(default)]
    pub steps: Vec<RecipeStep>,
}

impl RecipeActionGroup {
    #[must_use]
    pub fn new(policy: ContinuationPolicy) -> Self {
        Self {
            policy,
            steps: Vec::new(),
        }
    }

    /// Append an action step.
    #[must_use]
    pub fn action(mut self, action: RecipeAction) -> Self {
        self.steps.push(RecipeStep::Action(action));
        self
    }

    /// Append a nested group step.
    #[must_use]
    pub fn group(mut self, group: RecipeActionGroup) -> Self {
        self.steps.push(RecipeStep::Group(group));
        self
    }

    /// Every leaf action, depth-first in declared order.
    #[must_use]
    pub fn actions(&self) -> Vec<&RecipeAction> {
        let mut out = Vec::new();
        self.collect_actions(&mut out);
        out
    }

    fn collect_actions<'a>(&'a self, out: &mut Vec<&'a RecipeAction>) {
        for step in &self.steps {
            match step {
                RecipeStep::Action(action) => out.push(action),
                RecipeStep::Group(group) => group.collect_actions(out),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(id: &str) -> RecipeAction {
        RecipeAction::new(id, serde_json::json!({}))
    }

    #[test]
    fn should_default_to_stop_on_failure() {
        assert_eq!(
            RecipeActionGroup::default().policy,
            ContinuationPolicy::StopOnFailure
        );
    }

    #[test]
    fn should_list_leaf_actions_depth_first() {
        let group = RecipeActionGroup::new(ContinuationPolicy::Continue)
            .action(action("a"))
            .group(
                RecipeActionGroup::new(ContinuationPolicy::StopOnFailure)
                    .action(action("b"))
                    .action(action("c")),
            )
            .action(action("d"));

        let ids: Vec<&str> = group.actions().iter().map(|a| a.action_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn should_deserialize_tagged_steps() {
        let json = serde_json::json!({
            "policy": "continue",
            "steps": [
                {"type": "action", "action_id": "SendEmail", "data": {"to": "a@b.c"}},
                {"type": "group", "steps": [{"type": "action", "action_id": "ToggleRecipe"}]}
            ]
        });
        let group: RecipeActionGroup = serde_json::from_value(json).unwrap();
        assert_eq!(group.policy, ContinuationPolicy::Continue);
        assert!(matches!(&group.steps[0], RecipeStep::Action(a) if a.action_id == "SendEmail"));
        assert!(matches!(
            &group.steps[1],
            RecipeStep::Group(g) if g.policy == ContinuationPolicy::StopOnFailure
        ));
    }
}
