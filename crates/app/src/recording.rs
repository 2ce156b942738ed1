//! Trigger sink that records every recipe run in the invocation history.

use switchyard_domain::invocation::RecipeInvocation;
use switchyard_domain::trigger::TriggerEvent;

use crate::actions::describe;
use crate::ports::{InvocationStore, RecipeRepository, ServiceRegistry, TriggerSink};
use crate::trigger_dispatcher::TriggerDispatcher;

/// Wraps a [`TriggerDispatcher`] and appends one [`RecipeInvocation`] per
/// recipe run to an [`InvocationStore`].
pub struct RecordingTriggerSink<R, G, S> {
    dispatcher: TriggerDispatcher<R, G>,
    store: S,
}

impl<R, G, S> RecordingTriggerSink<R, G, S> {
    pub fn new(dispatcher: TriggerDispatcher<R, G>, store: S) -> Self {
        Self { dispatcher, store }
    }
}

impl<R, G, S> TriggerSink for RecordingTriggerSink<R, G, S>
where
    R: RecipeRepository,
    G: ServiceRegistry,
    S: InvocationStore,
{
    async fn dispatch_trigger(&self, event: TriggerEvent) {
        let outcomes = match self.dispatcher.dispatch(&event).await {
            Ok(outcomes) => outcomes,
            Err(err) => {
                tracing::warn!(kind = %event.kind, error = %err, "trigger dispatch failed");
                return;
            }
        };

        for outcome in outcomes {
            let invocation = match outcome.outcome.into_parts() {
                (results, None) => RecipeInvocation::completed(outcome.recipe_id, &event, results),
                (results, Some(err)) => {
                    RecipeInvocation::aborted(outcome.recipe_id, &event, results, describe(&err))
                }
            };
            if let Err(err) = self.store.append(invocation).await {
                tracing::warn!(
                    recipe_id = %outcome.recipe_id,
                    error = %err,
                    "invocation could not be recorded"
                );
            }
        }
    }
}
