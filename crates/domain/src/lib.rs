//! # switchyard-domain
//!
//! Pure domain model for the switchyard automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **External services** (watched or acted-upon remote accounts) and
//!   the registry's change notifications
//! - Define **Checkpoints** and the change detection run against them
//! - Define **Triggers** (detected changes) and recipe subscriptions
//! - Define **Recipes** (trigger → action graph) and action results
//! - Resolve `{{…}}` templates against event data
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action_result;
pub mod checkpoint;
pub mod external_service;
pub mod invocation;
pub mod recipe;
pub mod template;
pub mod trigger;
