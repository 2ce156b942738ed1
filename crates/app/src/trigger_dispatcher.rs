//! Trigger dispatcher: routes a trigger event to every enabled recipe
//! subscribed to it and collects what each run produced.

use switchyard_domain::error::SwitchyardError;
use switchyard_domain::id::RecipeId;
use switchyard_domain::trigger::TriggerEvent;

use crate::action_dispatcher::{ActionDispatcher, RunOutcome};
use crate::ports::{RecipeRepository, ServiceRegistry, TriggerSink};

/// The result of running one recipe for one event.
#[derive(Debug)]
pub struct RecipeOutcome {
    pub recipe_id: RecipeId,
    pub recipe_name: String,
    pub outcome: RunOutcome,
}

impl RecipeOutcome {
    /// Whether the run completed and every attempted action executed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        match &self.outcome {
            RunOutcome::Completed(results) => results.iter().all(|r| r.executed),
            RunOutcome::Aborted { .. } => false,
        }
    }
}

/// Fans trigger events out to recipes.
pub struct TriggerDispatcher<R, G> {
    recipes: R,
    actions: ActionDispatcher<G>,
}

impl<R, G> TriggerDispatcher<R, G>
where
    R: RecipeRepository,
    G: ServiceRegistry,
{
    pub fn new(recipes: R, actions: ActionDispatcher<G>) -> Self {
        Self { recipes, actions }
    }

    /// Run every enabled recipe whose trigger accepts `event`.
    ///
    /// Recipes run one after another; a recipe that aborts does not keep
    /// the others from running.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the enabled recipes cannot be loaded.
    #[tracing::instrument(skip_all, fields(kind = %event.kind))]
    pub async fn dispatch(
        &self,
        event: &TriggerEvent,
    ) -> Result<Vec<RecipeOutcome>, SwitchyardError> {
        let recipes = self.recipes.get_enabled().await?;
        let mut outcomes = Vec::new();

        for recipe in recipes.iter().filter(|r| r.trigger.matches(event)) {
            let outcome = self.actions.run_recipe(recipe, event).await;
            match &outcome {
                RunOutcome::Completed(results) => tracing::info!(
                    recipe_id = %recipe.id,
                    attempted = results.len(),
                    failed = results.iter().filter(|r| !r.executed).count(),
                    "recipe ran"
                ),
                RunOutcome::Aborted { results, error } => tracing::error!(
                    recipe_id = %recipe.id,
                    attempted = results.len(),
                    %error,
                    "recipe aborted"
                ),
            }
            outcomes.push(RecipeOutcome {
                recipe_id: recipe.id,
                recipe_name: recipe.name.clone(),
                outcome,
            });
        }

        if outcomes.is_empty() {
            tracing::debug!("no recipe subscribed");
        }
        Ok(outcomes)
    }
}

impl<R, G> TriggerSink for TriggerDispatcher<R, G>
where
    R: RecipeRepository,
    G: ServiceRegistry,
{
    async fn dispatch_trigger(&self, event: TriggerEvent) {
        if let Err(err) = self.dispatch(&event).await {
            tracing::warn!(kind = %event.kind, error = %err, "trigger dispatch failed");
        }
    }
}
