//! Demo mode: seeds simulated services and recipes into an empty
//! database and keeps the simulated invoice feed busy.

use std::sync::Arc;
use std::time::Duration;

use switchyard_adapter_virtual::{DEMO_MAILBOX_ADDRESS, VirtualInvoiceFeed, demo_services};
use switchyard_app::ports::{ExternalServiceRepository, RecipeRepository, ServiceRegistry};
use switchyard_app::services::external_service_manager::ExternalServiceManager;
use switchyard_app::services::recipe_service::RecipeService;
use switchyard_domain::error::SwitchyardError;
use switchyard_domain::external_service::{ExternalService, service_type};
use switchyard_domain::id::{RecipeId, ServiceId};
use switchyard_domain::recipe::{ContinuationPolicy, Recipe, RecipeAction, RecipeActionGroup};
use switchyard_domain::trigger::{RecipeTrigger, trigger_kind};

fn id_of(services: &[ExternalService], kind: &str) -> Option<ServiceId> {
    services
        .iter()
        .find(|s| s.service_type == kind)
        .map(|s| s.id)
}

fn paid_invoice_mail(shop: ServiceId, inbox: ServiceId) -> Result<Recipe, SwitchyardError> {
    Recipe::builder()
        .name("Mail the owner when an invoice is paid")
        .trigger(
            RecipeTrigger::new(trigger_kind::INVOICE_STATUS_CHANGED)
                .for_service(shop)
                .with_filter(serde_json::json!({"statuses": ["Paid"]})),
        )
        .action(
            RecipeAction::new(
                "SendEmail",
                serde_json::json!({
                    "to": DEMO_MAILBOX_ADDRESS,
                    "subject": "Invoice {{Invoice.id}} paid",
                    "body": "Received {{Invoice.amount}} {{Invoice.currency}}.",
                }),
            )
            .on_service(inbox),
        )
        .build()
}

/// Buys once on the first payment mail, then disables itself.
fn buy_once_on_payment(inbox: ServiceId, exchange: ServiceId) -> Result<Recipe, SwitchyardError> {
    let id = RecipeId::new();
    Recipe::builder()
        .id(id)
        .name("Buy once after the first payment")
        .trigger(
            RecipeTrigger::new(trigger_kind::RECEIVED_EMAIL)
                .for_service(inbox)
                .with_filter(serde_json::json!({"subject_contains": "paid"})),
        )
        .root(
            RecipeActionGroup::new(ContinuationPolicy::StopOnFailure)
                .action(
                    RecipeAction::new(
                        "PlaceOrder",
                        serde_json::json!({
                            "market_symbol": "BTC-EUR",
                            "side": "buy",
                            "order_type": "market",
                            "amount": "0.001",
                        }),
                    )
                    .on_service(exchange),
                )
                .action(RecipeAction::new(
                    "ToggleRecipe",
                    serde_json::json!({"target_recipe_id": id, "option": "disable"}),
                )),
        )
        .build()
}

/// Seed the demo services and recipes unless services already exist.
///
/// Returns whether anything was created.
///
/// # Errors
///
/// Propagates repository errors.
pub async fn seed<S, R>(
    registry: &ExternalServiceManager<S>,
    recipes: &RecipeService<R>,
) -> Result<bool, SwitchyardError>
where
    S: ExternalServiceRepository,
    R: RecipeRepository,
{
    if !registry.list_services().await?.is_empty() {
        tracing::debug!("services already configured, skipping demo seed");
        return Ok(false);
    }

    let mut created = Vec::new();
    for service in demo_services()? {
        created.push(registry.create_service(service).await?);
    }

    let (Some(shop), Some(inbox), Some(exchange)) = (
        id_of(&created, service_type::INVOICE_FEED),
        id_of(&created, service_type::MAILBOX),
        id_of(&created, service_type::EXCHANGE),
    ) else {
        return Ok(true);
    };

    recipes
        .create_recipe(paid_invoice_mail(shop, inbox)?)
        .await?;
    recipes
        .create_recipe(buy_once_on_payment(inbox, exchange)?)
        .await?;

    tracing::info!(services = created.len(), recipes = 2, "demo seeded");
    Ok(true)
}

/// Every `interval`, advance the invoices of every invoice feed and open a
/// new one. Runs until the task is aborted.
pub async fn simulate<G: ServiceRegistry>(
    registry: G,
    feed: Arc<VirtualInvoiceFeed>,
    interval: Duration,
) {
    let mut issued: u32 = 0;
    loop {
        tokio::time::sleep(interval).await;
        let stores = match registry.list(service_type::INVOICE_FEED).await {
            Ok(stores) => stores,
            Err(err) => {
                tracing::warn!(error = %err, "demo could not list invoice feeds");
                continue;
            }
        };
        for store in stores {
            let moved = feed.advance(store.id);
            issued += 1;
            let invoice_id = feed.create_invoice(store.id, f64::from(issued) * 10.0, "EUR");
            tracing::debug!(service_id = %store.id, moved, %invoice_id, "demo activity");
        }
    }
}
