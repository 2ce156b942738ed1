//! In-memory port implementations shared by the unit tests of this crate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;

use switchyard_domain::checkpoint::RemoteItem;
use switchyard_domain::error::{NotFoundError, SwitchyardError};
use switchyard_domain::external_service::ExternalService;
use switchyard_domain::id::{RecipeId, ServiceId};
use switchyard_domain::invocation::RecipeInvocation;
use switchyard_domain::recipe::Recipe;
use switchyard_domain::time::Timestamp;
use switchyard_domain::trigger::TriggerEvent;

use switchyard_domain::action_result::ActionHandlerResult;
use switchyard_domain::recipe::RecipeAction;
use switchyard_domain::trigger::EventData;

use crate::actions::{ActionContext, ActionHandlerRegistry, TypedActionHandler};
use crate::ports::{
    ExchangeClient, ExternalServiceRepository, InvocationStore, InvoiceClient, MailSender,
    MailboxClient, MailboxSession, OrderRequest, OrderResult, OutgoingEmail, RecipeRepository,
    TriggerSink,
};

// ── Recipes ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryRecipeRepo {
    store: Mutex<HashMap<RecipeId, Recipe>>,
}

impl InMemoryRecipeRepo {
    pub fn with(recipes: Vec<Recipe>) -> Self {
        let map: HashMap<_, _> = recipes.into_iter().map(|r| (r.id, r)).collect();
        Self {
            store: Mutex::new(map),
        }
    }

    pub fn snapshot(&self, id: RecipeId) -> Option<Recipe> {
        self.store.lock().unwrap().get(&id).cloned()
    }
}

impl RecipeRepository for InMemoryRecipeRepo {
    fn create(
        &self,
        recipe: Recipe,
    ) -> impl Future<Output = Result<Recipe, SwitchyardError>> + Send {
        self.store.lock().unwrap().insert(recipe.id, recipe.clone());
        async { Ok(recipe) }
    }

    fn get_by_id(
        &self,
        id: RecipeId,
    ) -> impl Future<Output = Result<Option<Recipe>, SwitchyardError>> + Send {
        let r = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(r) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Recipe>, SwitchyardError>> + Send {
        let r: Vec<_> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(r) }
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Recipe>, SwitchyardError>> + Send {
        let mut r: Vec<_> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.enabled)
            .cloned()
            .collect();
        r.sort_by(|a, b| a.name.cmp(&b.name));
        async { Ok(r) }
    }

    fn update(
        &self,
        recipe: Recipe,
    ) -> impl Future<Output = Result<Recipe, SwitchyardError>> + Send {
        self.store.lock().unwrap().insert(recipe.id, recipe.clone());
        async { Ok(recipe) }
    }

    fn delete(&self, id: RecipeId) -> impl Future<Output = Result<(), SwitchyardError>> + Send {
        self.store.lock().unwrap().remove(&id);
        async { Ok(()) }
    }
}

// ── External services ──────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryServiceRepo {
    store: Mutex<HashMap<ServiceId, ExternalService>>,
}

impl InMemoryServiceRepo {
    pub fn with(services: Vec<ExternalService>) -> Self {
        let map: HashMap<_, _> = services.into_iter().map(|s| (s.id, s)).collect();
        Self {
            store: Mutex::new(map),
        }
    }
}

impl ExternalServiceRepository for InMemoryServiceRepo {
    fn create(
        &self,
        service: ExternalService,
    ) -> impl Future<Output = Result<ExternalService, SwitchyardError>> + Send {
        self.store
            .lock()
            .unwrap()
            .insert(service.id, service.clone());
        async { Ok(service) }
    }

    fn get_by_id(
        &self,
        id: ServiceId,
    ) -> impl Future<Output = Result<Option<ExternalService>, SwitchyardError>> + Send {
        let r = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(r) }
    }

    fn get_all(
        &self,
    ) -> impl Future<Output = Result<Vec<ExternalService>, SwitchyardError>> + Send {
        let r: Vec<_> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(r) }
    }

    fn find_by_type(
        &self,
        service_type: &str,
    ) -> impl Future<Output = Result<Vec<ExternalService>, SwitchyardError>> + Send {
        let r: Vec<_> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.service_type == service_type)
            .cloned()
            .collect();
        async { Ok(r) }
    }

    fn update(
        &self,
        service: ExternalService,
    ) -> impl Future<Output = Result<ExternalService, SwitchyardError>> + Send {
        let mut store = self.store.lock().unwrap();
        let checkpoint = store
            .get(&service.id)
            .map(|s| s.checkpoint.clone())
            .unwrap_or_default();
        let updated = ExternalService {
            checkpoint,
            ..service
        };
        store.insert(updated.id, updated.clone());
        async { Ok(updated) }
    }

    fn update_checkpoint(
        &self,
        id: ServiceId,
        checkpoint: serde_json::Value,
    ) -> impl Future<Output = Result<(), SwitchyardError>> + Send {
        let result = match self.store.lock().unwrap().get_mut(&id) {
            Some(service) => {
                service.checkpoint = checkpoint;
                Ok(())
            }
            None => Err(NotFoundError {
                entity: "ExternalService",
                id: id.to_string(),
            }
            .into()),
        };
        async { result }
    }

    fn delete(&self, id: ServiceId) -> impl Future<Output = Result<(), SwitchyardError>> + Send {
        self.store.lock().unwrap().remove(&id);
        async { Ok(()) }
    }
}

// ── Invocations ────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryInvocationStore {
    pub records: Mutex<Vec<RecipeInvocation>>,
}

impl InvocationStore for InMemoryInvocationStore {
    fn append(
        &self,
        invocation: RecipeInvocation,
    ) -> impl Future<Output = Result<RecipeInvocation, SwitchyardError>> + Send {
        self.records.lock().unwrap().push(invocation.clone());
        async { Ok(invocation) }
    }

    fn find_by_recipe(
        &self,
        recipe_id: RecipeId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RecipeInvocation>, SwitchyardError>> + Send {
        let r: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|i| i.recipe_id == recipe_id)
            .take(limit)
            .cloned()
            .collect();
        async { Ok(r) }
    }
}

// ── Remote clients ─────────────────────────────────────────────────

/// Per-service behaviour switches read from the service config.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Behaviour {
    denied: bool,
    fail: bool,
    delay_ms: u64,
}

fn behaviour(service: &ExternalService) -> Behaviour {
    serde_json::from_value(service.config.clone()).unwrap_or_default()
}

fn remote_failure(message: &str) -> SwitchyardError {
    SwitchyardError::remote(std::io::Error::other(message.to_string()))
}

pub fn remote_item(id: &str, status: &str, timestamp: Timestamp) -> RemoteItem {
    RemoteItem {
        id: id.to_string(),
        status: status.to_string(),
        timestamp,
        payload: serde_json::json!({"id": id}),
    }
}

#[derive(Default)]
pub struct FakeInvoiceClient {
    invoices: Mutex<HashMap<ServiceId, Vec<RemoteItem>>>,
    pub fetches: AtomicUsize,
}

impl FakeInvoiceClient {
    pub fn set_invoices(&self, service_id: ServiceId, items: Vec<RemoteItem>) {
        self.invoices.lock().unwrap().insert(service_id, items);
    }
}

impl InvoiceClient for FakeInvoiceClient {
    async fn check_access(&self, service: &ExternalService) -> Result<bool, SwitchyardError> {
        Ok(!behaviour(service).denied)
    }

    async fn fetch_invoices(
        &self,
        service: &ExternalService,
    ) -> Result<Vec<RemoteItem>, SwitchyardError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let behaviour = behaviour(service);
        if behaviour.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(behaviour.delay_ms)).await;
        }
        if behaviour.fail {
            return Err(remote_failure("invoice feed unavailable"));
        }
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .get(&service.id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeMailboxClient {
    messages: Mutex<HashMap<ServiceId, Vec<RemoteItem>>>,
    pub disconnects: Arc<AtomicUsize>,
}

impl FakeMailboxClient {
    pub fn set_messages(&self, service_id: ServiceId, items: Vec<RemoteItem>) {
        self.messages.lock().unwrap().insert(service_id, items);
    }
}

pub struct FakeMailboxSession {
    messages: Vec<RemoteItem>,
    fail: bool,
    delay: Duration,
    disconnects: Arc<AtomicUsize>,
}

impl MailboxSession for FakeMailboxSession {
    async fn fetch_messages(&mut self) -> Result<Vec<RemoteItem>, SwitchyardError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(remote_failure("mailbox read failed"));
        }
        Ok(self.messages.clone())
    }

    async fn disconnect(self) -> Result<(), SwitchyardError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl MailboxClient for FakeMailboxClient {
    type Session = FakeMailboxSession;

    async fn check_access(&self, service: &ExternalService) -> Result<bool, SwitchyardError> {
        Ok(!behaviour(service).denied)
    }

    async fn connect(
        &self,
        service: &ExternalService,
    ) -> Result<FakeMailboxSession, SwitchyardError> {
        let messages = self
            .messages
            .lock()
            .unwrap()
            .get(&service.id)
            .cloned()
            .unwrap_or_default();
        let behaviour = behaviour(service);
        Ok(FakeMailboxSession {
            messages,
            fail: behaviour.fail,
            delay: Duration::from_millis(behaviour.delay_ms),
            disconnects: Arc::clone(&self.disconnects),
        })
    }
}

#[derive(Default)]
pub struct FakeExchange {
    pub orders: Mutex<Vec<OrderRequest>>,
}

impl ExchangeClient for FakeExchange {
    async fn place_order(
        &self,
        service: &ExternalService,
        order: OrderRequest,
    ) -> Result<OrderResult, SwitchyardError> {
        if behaviour(service).fail {
            return Err(remote_failure("insufficient funds"));
        }
        let mut orders = self.orders.lock().unwrap();
        orders.push(order);
        Ok(OrderResult {
            order_id: format!("ord-{}", orders.len()),
            status: "open".to_string(),
            amount_filled: 0.0,
            average_price: None,
        })
    }

    async fn get_order(
        &self,
        _service: &ExternalService,
        order_id: &str,
    ) -> Result<OrderResult, SwitchyardError> {
        let amount = self
            .orders
            .lock()
            .unwrap()
            .last()
            .map_or(0.0, |o| o.amount);
        Ok(OrderResult {
            order_id: order_id.to_string(),
            status: "filled".to_string(),
            amount_filled: amount,
            average_price: Some(100.0),
        })
    }
}

#[derive(Default)]
pub struct FakeMailSender {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

impl MailSender for FakeMailSender {
    async fn send(
        &self,
        service: &ExternalService,
        email: OutgoingEmail,
    ) -> Result<String, SwitchyardError> {
        if behaviour(service).fail {
            return Err(remote_failure("smtp rejected"));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email);
        Ok(format!("msg-{}", sent.len()))
    }
}

// ── Sinks ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<TriggerEvent>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<TriggerEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl TriggerSink for RecordingSink {
    async fn dispatch_trigger(&self, event: TriggerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Poll `condition` until it holds or a second has passed.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

// ── Action handlers ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EchoConfig {
    pub text: String,
}

/// `Echo`: succeeds with its (templated) text, also exposed as `data.value`.
pub struct EchoHandler;

impl TypedActionHandler for EchoHandler {
    type Config = EchoConfig;

    fn action_id(&self) -> &'static str {
        "Echo"
    }

    async fn execute(
        &self,
        _data: &EventData,
        _action: &RecipeAction,
        config: EchoConfig,
        _context: &ActionContext,
    ) -> Result<ActionHandlerResult, SwitchyardError> {
        Ok(ActionHandlerResult::success(config.text.clone())
            .with_data(serde_json::json!({"value": config.text})))
    }
}

/// `Fail`: always reports a failed execution.
pub struct FailHandler;

impl TypedActionHandler for FailHandler {
    type Config = serde_json::Value;

    fn action_id(&self) -> &'static str {
        "Fail"
    }

    async fn execute(
        &self,
        _data: &EventData,
        _action: &RecipeAction,
        _config: serde_json::Value,
        _context: &ActionContext,
    ) -> Result<ActionHandlerResult, SwitchyardError> {
        Ok(ActionHandlerResult::failure("nope"))
    }
}

/// `Panic`: panics while executing.
pub struct PanicHandler;

impl TypedActionHandler for PanicHandler {
    type Config = serde_json::Value;

    fn action_id(&self) -> &'static str {
        "Panic"
    }

    async fn execute(
        &self,
        _data: &EventData,
        _action: &RecipeAction,
        _config: serde_json::Value,
        _context: &ActionContext,
    ) -> Result<ActionHandlerResult, SwitchyardError> {
        panic!("handler bug")
    }
}

pub fn test_handlers() -> ActionHandlerRegistry {
    ActionHandlerRegistry::new()
        .with(EchoHandler)
        .with(FailHandler)
        .with(PanicHandler)
}

pub fn echo(text: &str) -> RecipeAction {
    RecipeAction::new("Echo", serde_json::json!({"text": text}))
}

pub fn fail() -> RecipeAction {
    RecipeAction::new("Fail", serde_json::json!({}))
}
