//! Action handlers: the code behind each `action_id` a recipe can use.
//!
//! Handlers are written against [`TypedActionHandler`], which receives the
//! action's configuration already interpolated and decoded. The blanket
//! [`ActionHandler`] impl erases that type so handlers of every kind can
//! live in one [`ActionHandlerRegistry`], built once at startup.

mod place_order;
mod send_email;
mod toggle_recipe;

pub use place_order::{PlaceOrderConfig, PlaceOrderHandler};
pub use send_email::{SendEmailConfig, SendEmailHandler};
pub use toggle_recipe::{ToggleOption, ToggleRecipeConfig, ToggleRecipeHandler};

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use switchyard_domain::action_result::ActionHandlerResult;
use switchyard_domain::error::{ConfigurationError, NotFoundError, SwitchyardError};
use switchyard_domain::external_service::ExternalService;
use switchyard_domain::id::RecipeId;
use switchyard_domain::recipe::RecipeAction;
use switchyard_domain::template;
use switchyard_domain::trigger::EventData;

/// Collaborators resolved for one action execution.
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    /// Recipe the action belongs to.
    pub recipe_id: Option<RecipeId>,
    /// The service named by the action's `external_service_id`.
    pub service: Option<ExternalService>,
}

impl ActionContext {
    /// The resolved service, or an error naming the action that needs one.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchyardError::NotFound`] when the action has no service.
    pub fn require_service(
        &self,
        action: &RecipeAction,
    ) -> Result<&ExternalService, SwitchyardError> {
        self.service.as_ref().ok_or_else(|| {
            NotFoundError {
                entity: "ExternalService",
                id: format!("for action {action}"),
            }
            .into()
        })
    }
}

/// A handler with a typed configuration.
pub trait TypedActionHandler: Send + Sync + 'static {
    /// Decoded from the action's interpolated `data`.
    type Config: DeserializeOwned + Send;

    /// Identifier recipes use to select this handler.
    fn action_id(&self) -> &'static str;

    /// Whether this handler takes `action` given the current event data.
    fn can_execute(&self, data: &EventData, action: &RecipeAction) -> bool {
        let _ = data;
        action.action_id == self.action_id()
    }

    /// Run the action.
    ///
    /// An `Err` is reported as a failed result by the dispatcher; handlers
    /// that want a specific failure text return
    /// [`ActionHandlerResult::failure`] themselves.
    fn execute(
        &self,
        data: &EventData,
        action: &RecipeAction,
        config: Self::Config,
        context: &ActionContext,
    ) -> impl Future<Output = Result<ActionHandlerResult, SwitchyardError>> + Send;
}

/// Type-erased handler stored in the registry.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn action_id(&self) -> &str;

    fn can_execute(&self, data: &EventData, action: &RecipeAction) -> bool;

    /// Interpolate and decode the configuration, then execute.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MalformedActionConfig`] when the
    /// configuration cannot be decoded. Execution errors are returned as a
    /// failed [`ActionHandlerResult`].
    async fn execute(
        &self,
        data: &EventData,
        action: &RecipeAction,
        context: &ActionContext,
    ) -> Result<ActionHandlerResult, SwitchyardError>;
}

#[async_trait]
impl<T: TypedActionHandler> ActionHandler for T {
    fn action_id(&self) -> &str {
        TypedActionHandler::action_id(self)
    }

    fn can_execute(&self, data: &EventData, action: &RecipeAction) -> bool {
        TypedActionHandler::can_execute(self, data, action)
    }

    async fn execute(
        &self,
        data: &EventData,
        action: &RecipeAction,
        context: &ActionContext,
    ) -> Result<ActionHandlerResult, SwitchyardError> {
        let config = decode_config::<T::Config>(action, data)?;
        match TypedActionHandler::execute(self, data, action, config, context).await {
            Ok(result) => Ok(result),
            Err(err) => Ok(ActionHandlerResult::failure(describe(&err))),
        }
    }
}

/// Interpolate every string of `action.data` against `data` and decode it.
///
/// # Errors
///
/// Returns [`ConfigurationError::MalformedActionConfig`] when the result
/// does not match `C`.
pub fn decode_config<C: DeserializeOwned>(
    action: &RecipeAction,
    data: &EventData,
) -> Result<C, SwitchyardError> {
    let resolved = template::interpolate_value(&action.data, data);
    serde_json::from_value(resolved).map_err(|err| {
        ConfigurationError::MalformedActionConfig {
            action_id: action.action_id.clone(),
            reason: err.to_string(),
        }
        .into()
    })
}

/// Render an error with its whole source chain.
pub(crate) fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Lookup table from `action_id` to handler.
#[derive(Clone, Default)]
pub struct ActionHandlerRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionHandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler, replacing any earlier one with the same id.
    #[must_use]
    pub fn with(mut self, handler: impl ActionHandler + 'static) -> Self {
        self.register(handler);
        self
    }

    pub fn register(&mut self, handler: impl ActionHandler + 'static) {
        let id = handler.action_id().to_string();
        if self.handlers.insert(id.clone(), Arc::new(handler)).is_some() {
            tracing::warn!(action_id = %id, "action handler replaced");
        }
    }

    #[must_use]
    pub fn get(&self, action_id: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(action_id).cloned()
    }

    /// Registered identifiers, sorted.
    #[must_use]
    pub fn action_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for ActionHandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandlerRegistry")
            .field("handlers", &self.action_ids())
            .finish()
    }
}
