//! # switchyard-app
//!
//! Application layer: use-cases, **port definitions** (traits) and the
//! automation engine itself.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ExternalServiceRepository`: CRUD and checkpoint writes for services
//!   - `RecipeRepository`: CRUD for recipes
//!   - `InvocationStore`: append & query recipe run history
//!   - `InvoiceClient`, `MailboxClient`, `MailSender`, `ExchangeClient`: remote services
//! - Define **driving/inbound** use-cases:
//!   - `ExternalServiceManager`: configure services; doubles as the `ServiceRegistry`
//!   - `RecipeService`: create, update, enable/disable recipes
//! - Run the engine:
//!   - `ServiceWatcher`: per-type polling loop over a live set of services
//!   - `TriggerDispatcher`: routes detected events to subscribed recipes
//!   - `ActionDispatcher`: walks a recipe's action graph
//!   - built-in action handlers (`ToggleRecipe`, `PlaceOrder`, `SendEmail`)
//! - Provide **in-process infrastructure** (change bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `switchyard-domain` only (plus `tokio` for channels, timers
//! and tasks). Never imports adapter crates. Adapters depend on *this*
//! crate, not the reverse.

pub mod action_dispatcher;
pub mod actions;
pub mod change_bus;
pub mod ports;
pub mod recording;
pub mod services;
pub mod trigger_dispatcher;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;
