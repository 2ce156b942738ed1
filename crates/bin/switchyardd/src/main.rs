//! # switchyardd: switchyard daemon
//!
//! Composition root that wires all adapters together and runs the watchers.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct application services, injecting repositories via port traits
//! - Register the action handlers and build the dispatch chain
//! - Start one watcher per enabled service type
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod demo;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use switchyard_adapter_storage_sqlite_sqlx::{
    Config as DatabaseConfig, SqliteExternalServiceRepository, SqliteInvocationStore,
    SqliteRecipeRepository,
};
use switchyard_adapter_virtual::{VirtualExchange, VirtualInvoiceFeed, VirtualMailbox};
use switchyard_app::action_dispatcher::ActionDispatcher;
use switchyard_app::actions::{
    ActionHandlerRegistry, PlaceOrderHandler, SendEmailHandler, ToggleRecipeHandler,
};
use switchyard_app::change_bus::InProcessChangeBus;
use switchyard_app::recording::RecordingTriggerSink;
use switchyard_app::services::external_service_manager::ExternalServiceManager;
use switchyard_app::services::recipe_service::RecipeService;
use switchyard_app::trigger_dispatcher::TriggerDispatcher;
use switchyard_app::watcher::{InvoiceScanner, MailboxScanner, ServiceWatcher};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading switchyard.toml")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = DatabaseConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("initialising database")?;
    let pool = db.pool().clone();

    // Repositories
    let service_repo = SqliteExternalServiceRepository::new(pool.clone());
    let recipe_repo = Arc::new(SqliteRecipeRepository::new(pool.clone()));
    let invocation_store = SqliteInvocationStore::new(pool);

    // Services
    let bus = InProcessChangeBus::new(config.bus.capacity);
    let registry = Arc::new(ExternalServiceManager::new(service_repo, bus));
    let recipes = RecipeService::new(Arc::clone(&recipe_repo));

    // Remote clients
    let invoice_feed = Arc::new(VirtualInvoiceFeed::default());
    let mailbox = Arc::new(VirtualMailbox::default());
    let exchange = Arc::new(VirtualExchange::default());

    // Dispatch chain
    let handlers = ActionHandlerRegistry::new()
        .with(ToggleRecipeHandler::new(Arc::clone(&recipe_repo)))
        .with(PlaceOrderHandler::new(Arc::clone(&exchange)))
        .with(SendEmailHandler::new(Arc::clone(&mailbox)));
    tracing::info!(handlers = ?handlers.action_ids(), "action handlers registered");

    let dispatcher = TriggerDispatcher::new(
        Arc::clone(&recipe_repo),
        ActionDispatcher::new(handlers, Arc::clone(&registry)),
    );
    let sink = Arc::new(RecordingTriggerSink::new(dispatcher, invocation_store));

    let mut activity = None;
    if config.demo.enabled {
        demo::seed(&registry, &recipes)
            .await
            .context("seeding demo services")?;
        activity = Some(tokio::spawn(demo::simulate(
            Arc::clone(&registry),
            Arc::clone(&invoice_feed),
            Duration::from_secs(config.demo.activity_interval_secs),
        )));
    }

    // Watchers
    let settings = config.watcher_settings();
    let mut invoice_watcher = ServiceWatcher::new(
        InvoiceScanner::new(Arc::clone(&invoice_feed)),
        Arc::clone(&registry),
        Arc::clone(&sink),
        settings,
    );
    let mut mailbox_watcher = ServiceWatcher::new(
        MailboxScanner::new(Arc::clone(&mailbox)),
        Arc::clone(&registry),
        Arc::clone(&sink),
        settings,
    );
    if config.watchers.invoice_enabled {
        invoice_watcher
            .start()
            .await
            .context("starting invoice watcher")?;
    }
    if config.watchers.mailbox_enabled {
        mailbox_watcher
            .start()
            .await
            .context("starting mailbox watcher")?;
    }

    tracing::info!("switchyardd running, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    tracing::info!("shutting down");
    if let Some(task) = activity {
        task.abort();
    }
    invoice_watcher.stop().await;
    mailbox_watcher.stop().await;
    db.close().await;

    Ok(())
}
