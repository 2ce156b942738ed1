//! Action dispatcher: walks a recipe's action graph against event data.
//!
//! Leaves are resolved to handlers through the [`ActionHandlerRegistry`];
//! groups run their children in order and honour their
//! [`ContinuationPolicy`]. Every produced result is also written back into
//! the event data (`PreviousAction`, `ActionData<N>`) so later actions can
//! template against it.

use std::future::Future;
use std::pin::Pin;

use switchyard_domain::action_result::ActionHandlerResult;
use switchyard_domain::error::SwitchyardError;
use switchyard_domain::id::RecipeId;
use switchyard_domain::recipe::{
    ContinuationPolicy, Recipe, RecipeAction, RecipeActionGroup, RecipeStep,
};
use switchyard_domain::trigger::{EventData, TriggerEvent};

use crate::actions::{ActionContext, ActionHandlerRegistry, describe};
use crate::ports::ServiceRegistry;

/// Event data key holding the latest result.
pub const PREVIOUS_ACTION_KEY: &str = "PreviousAction";
/// Prefix of the per-result keys (`ActionData0`, `ActionData1`, …).
pub const ACTION_DATA_PREFIX: &str = "ActionData";

type WalkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SwitchyardError>> + Send + 'a>>;

/// What running an action group produced.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every reachable step was attempted.
    Completed(Vec<ActionHandlerResult>),
    /// A hard error stopped the run. `results` holds the actions attempted
    /// before it, whose side effects already happened.
    Aborted {
        results: Vec<ActionHandlerResult>,
        error: SwitchyardError,
    },
}

impl RunOutcome {
    fn from_walk(walked: Result<(), SwitchyardError>, results: Vec<ActionHandlerResult>) -> Self {
        match walked {
            Ok(()) => Self::Completed(results),
            Err(error) => Self::Aborted { results, error },
        }
    }

    /// Results of the attempted actions, in execution order.
    #[must_use]
    pub fn results(&self) -> &[ActionHandlerResult] {
        match self {
            Self::Completed(results) | Self::Aborted { results, .. } => results,
        }
    }

    /// The error that aborted the run, if any.
    #[must_use]
    pub fn error(&self) -> Option<&SwitchyardError> {
        match self {
            Self::Completed(_) => None,
            Self::Aborted { error, .. } => Some(error),
        }
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<ActionHandlerResult>, Option<SwitchyardError>) {
        match self {
            Self::Completed(results) => (results, None),
            Self::Aborted { results, error } => (results, Some(error)),
        }
    }
}

/// Executes actions and action groups.
pub struct ActionDispatcher<G> {
    handlers: ActionHandlerRegistry,
    registry: G,
}

impl<G: ServiceRegistry> ActionDispatcher<G> {
    pub fn new(handlers: ActionHandlerRegistry, registry: G) -> Self {
        Self { handlers, registry }
    }

    /// Run every action of `recipe` against a copy of the event's data.
    ///
    /// Handler failures are results. An action whose configuration cannot
    /// be decoded aborts the run with a [`SwitchyardError::Configuration`]
    /// error, keeping the results gathered so far.
    #[tracing::instrument(skip_all, fields(recipe_id = %recipe.id, recipe_name = %recipe.name))]
    pub async fn run_recipe(&self, recipe: &Recipe, event: &TriggerEvent) -> RunOutcome {
        let mut data = event.data.clone();
        let mut results = Vec::new();
        let walked = self
            .walk(&mut data, &recipe.root, Some(recipe.id), &mut results)
            .await;
        RunOutcome::from_walk(walked, results)
    }

    /// Run a group, collecting the result of every attempted action.
    ///
    /// Aborts the same way as [`ActionDispatcher::run_recipe`].
    pub async fn dispatch_group(
        &self,
        data: &mut EventData,
        group: &RecipeActionGroup,
    ) -> RunOutcome {
        let mut results = Vec::new();
        let walked = self.walk(data, group, None, &mut results).await;
        RunOutcome::from_walk(walked, results)
    }

    /// Run one action.
    ///
    /// Returns `Ok(None)` when no registered handler takes the action.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::Configuration`] when the action's
    /// configuration cannot be decoded.
    #[tracing::instrument(skip_all, fields(action_id = %action.action_id))]
    pub async fn dispatch_action(
        &self,
        data: &EventData,
        action: &RecipeAction,
        recipe_id: Option<RecipeId>,
    ) -> Result<Option<ActionHandlerResult>, SwitchyardError> {
        let Some(handler) = self.handlers.get(&action.action_id) else {
            tracing::warn!("no handler registered, skipping action");
            return Ok(None);
        };
        if !handler.can_execute(data, action) {
            tracing::debug!("handler declined action");
            return Ok(None);
        }

        let service = match action.external_service_id {
            None => None,
            Some(service_id) => match self.registry.get(service_id).await {
                Ok(Some(service)) => Some(service),
                Ok(None) => {
                    return Ok(Some(ActionHandlerResult::failure(format!(
                        "External service {service_id} not found"
                    ))));
                }
                Err(err) => {
                    return Ok(Some(ActionHandlerResult::failure(format!(
                        "Could not load external service {service_id}: {}",
                        describe(&err)
                    ))));
                }
            },
        };
        let context = ActionContext { recipe_id, service };

        let task = {
            let data = data.clone();
            let action = action.clone();
            tokio::spawn(async move { handler.execute(&data, &action, &context).await })
        };
        let result = match task.await {
            Ok(outcome) => outcome?,
            Err(err) => {
                tracing::error!(%err, "action handler panicked");
                ActionHandlerResult::failure(format!("Action {} panicked", action.action_id))
            }
        };

        if result.executed {
            tracing::debug!(result = %result.result, "action executed");
        } else {
            tracing::warn!(result = %result.result, "action failed");
        }
        Ok(Some(result))
    }

    fn walk<'a>(
        &'a self,
        data: &'a mut EventData,
        group: &'a RecipeActionGroup,
        recipe_id: Option<RecipeId>,
        results: &'a mut Vec<ActionHandlerResult>,
    ) -> WalkFuture<'a> {
        Box::pin(async move {
            for (position, step) in group.steps.iter().enumerate() {
                let before = results.len();
                match step {
                    RecipeStep::Action(action) => {
                        if let Some(result) = self.dispatch_action(data, action, recipe_id).await? {
                            record(data, &result, results.len());
                            results.push(result);
                        }
                    }
                    RecipeStep::Group(child) => {
                        self.walk(data, child, recipe_id, results).await?;
                    }
                }

                let failed = results.len() > before && results.last().is_some_and(|r| !r.executed);
                if failed && group.policy == ContinuationPolicy::StopOnFailure {
                    tracing::debug!(
                        skipped = group.steps.len() - position - 1,
                        "stopping group after failure"
                    );
                    break;
                }
            }
            Ok(())
        })
    }
}

/// Expose `result` to the templates of later actions.
fn record(data: &mut EventData, result: &ActionHandlerResult, index: usize) {
    let value = exposed_value(result, index);
    data.insert(format!("{ACTION_DATA_PREFIX}{index}"), value.clone());
    data.insert(PREVIOUS_ACTION_KEY.to_string(), value);
}

fn exposed_value(result: &impl serde::Serialize, index: usize) -> serde_json::Value {
    serde_json::to_value(result).unwrap_or_else(|err| {
        tracing::warn!(%err, index, "action result not serializable, exposing null");
        serde_json::Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_bus::InProcessChangeBus;
    use crate::services::external_service_manager::ExternalServiceManager;
    use crate::testing::{InMemoryServiceRepo, echo, fail, test_handlers};
    use switchyard_domain::error::ConfigurationError;
    use switchyard_domain::id::ServiceId;

    fn dispatcher() -> ActionDispatcher<ExternalServiceManager<InMemoryServiceRepo>> {
        ActionDispatcher::new(
            test_handlers(),
            ExternalServiceManager::new(InMemoryServiceRepo::default(), InProcessChangeBus::new(4)),
        )
    }

    fn texts(results: &[ActionHandlerResult]) -> Vec<&str> {
        results.iter().map(|r| r.result.as_str()).collect()
    }

    fn completed(outcome: RunOutcome) -> Vec<ActionHandlerResult> {
        match outcome {
            RunOutcome::Completed(results) => results,
            RunOutcome::Aborted { error, .. } => panic!("run aborted: {error:?}"),
        }
    }

    #[tokio::test]
    async fn should_stop_group_after_failure() {
        let group = RecipeActionGroup::new(ContinuationPolicy::StopOnFailure)
            .action(fail())
            .action(echo("after"));

        let results = completed(
            dispatcher()
                .dispatch_group(&mut EventData::new(), &group)
                .await,
        );

        assert_eq!(results.len(), 1);
        assert!(!results[0].executed);
    }

    #[tokio::test]
    async fn should_continue_group_after_failure() {
        let group = RecipeActionGroup::new(ContinuationPolicy::Continue)
            .action(fail())
            .action(echo("after"));

        let results = completed(
            dispatcher()
                .dispatch_group(&mut EventData::new(), &group)
                .await,
        );

        assert_eq!(texts(&results), vec!["nope", "after"]);
    }

    #[tokio::test]
    async fn should_only_short_circuit_the_failing_group() {
        let group = RecipeActionGroup::new(ContinuationPolicy::Continue)
            .group(
                RecipeActionGroup::new(ContinuationPolicy::StopOnFailure)
                    .action(fail())
                    .action(echo("skipped")),
            )
            .action(echo("outer"));

        let results = completed(
            dispatcher()
                .dispatch_group(&mut EventData::new(), &group)
                .await,
        );

        assert_eq!(texts(&results), vec!["nope", "outer"]);
    }

    #[tokio::test]
    async fn should_stop_parent_when_nested_group_ends_in_failure() {
        let group = RecipeActionGroup::new(ContinuationPolicy::StopOnFailure)
            .group(
                RecipeActionGroup::new(ContinuationPolicy::Continue)
                    .action(echo("first"))
                    .action(fail()),
            )
            .action(echo("skipped"));

        let results = completed(
            dispatcher()
                .dispatch_group(&mut EventData::new(), &group)
                .await,
        );

        assert_eq!(texts(&results), vec!["first", "nope"]);
    }

    #[tokio::test]
    async fn should_skip_actions_without_handler() {
        let group = RecipeActionGroup::default()
            .action(RecipeAction::new("Unknown", serde_json::json!({})))
            .action(echo("ran"));

        let results = completed(
            dispatcher()
                .dispatch_group(&mut EventData::new(), &group)
                .await,
        );

        assert_eq!(texts(&results), vec!["ran"]);
    }

    #[tokio::test]
    async fn should_expose_earlier_results_to_later_templates() {
        let mut data = EventData::new();
        data.insert("Invoice".into(), serde_json::json!({"id": "inv-9"}));
        let group = RecipeActionGroup::default()
            .action(echo("paid {{Invoice.id}}"))
            .action(echo("{{PreviousAction.data.value}} / {{ActionData0.result}}"));

        let results = completed(dispatcher().dispatch_group(&mut data, &group).await);

        assert_eq!(results[1].result, "paid inv-9 / paid inv-9");
        assert_eq!(data[PREVIOUS_ACTION_KEY]["result"], "paid inv-9 / paid inv-9");
        assert!(data.contains_key("ActionData1"));
    }

    #[tokio::test]
    async fn should_report_missing_service_as_failed_result() {
        let action = echo("x").on_service(ServiceId::new());

        let result = dispatcher()
            .dispatch_action(&EventData::new(), &action, None)
            .await
            .unwrap()
            .unwrap();

        assert!(!result.executed);
        assert!(result.result.contains("not found"));
    }

    #[tokio::test]
    async fn should_contain_handler_panic() {
        let group = RecipeActionGroup::new(ContinuationPolicy::Continue)
            .action(RecipeAction::new("Panic", serde_json::json!({})))
            .action(echo("still here"));

        let results = completed(
            dispatcher()
                .dispatch_group(&mut EventData::new(), &group)
                .await,
        );

        assert_eq!(texts(&results), vec!["Action Panic panicked", "still here"]);
    }

    #[tokio::test]
    async fn should_abort_on_malformed_action_config() {
        let group = RecipeActionGroup::default()
            .action(RecipeAction::new("Echo", serde_json::json!({"txt": 1})));

        let outcome = dispatcher()
            .dispatch_group(&mut EventData::new(), &group)
            .await;

        assert!(matches!(
            outcome.error(),
            Some(SwitchyardError::Configuration(
                ConfigurationError::MalformedActionConfig { .. }
            ))
        ));
    }

    #[test]
    fn should_expose_null_for_unserializable_result() {
        let tuple_keys = std::collections::HashMap::from([((1, 2), "x")]);
        assert_eq!(exposed_value(&tuple_keys, 0), serde_json::Value::Null);
        assert_eq!(
            exposed_value(&ActionHandlerResult::success("ok"), 1)["result"],
            "ok"
        );
    }

    #[tokio::test]
    async fn should_keep_results_of_actions_run_before_abort() {
        let group = RecipeActionGroup::new(ContinuationPolicy::Continue)
            .action(echo("order placed"))
            .action(RecipeAction::new("Echo", serde_json::json!({"bad": true})))
            .action(echo("never reached"));

        let outcome = dispatcher()
            .dispatch_group(&mut EventData::new(), &group)
            .await;

        assert!(outcome.error().is_some());
        assert_eq!(texts(outcome.results()), vec!["order placed"]);
    }
}
