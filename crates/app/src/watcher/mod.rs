//! Service watchers: one polling loop per service type.
//!
//! A [`ServiceWatcher`] keeps an in-memory set of handles for every
//! registered service of its type, kept in sync with the registry's change
//! notifications. On every tick it checks all handles concurrently through
//! its [`ServiceScanner`], hands the detected trigger events to a
//! [`TriggerSink`], and then persists the new checkpoint. The next tick only
//! starts once every check of the current one has finished.

mod invoice;
mod mailbox;

pub use invoice::InvoiceScanner;
pub use mailbox::MailboxScanner;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio::time::error::Elapsed;

use switchyard_domain::error::{ConfigurationError, SwitchyardError};
use switchyard_domain::external_service::{ChangeAction, ExternalService, ServiceChange};
use switchyard_domain::id::ServiceId;
use switchyard_domain::time::{self, Timestamp};
use switchyard_domain::trigger::TriggerEvent;

use crate::ports::{ServiceRegistry, TriggerSink};

/// What one successful check produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    /// Checkpoint to persist once the events were dispatched.
    pub checkpoint: serde_json::Value,
    /// Events to dispatch, in detection order.
    pub events: Vec<TriggerEvent>,
}

impl ScanOutcome {
    /// Serialize a typed checkpoint into an outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MalformedCheckpoint`] when the checkpoint
    /// cannot be represented as JSON.
    pub fn new(
        service_id: ServiceId,
        checkpoint: &impl Serialize,
        events: Vec<TriggerEvent>,
    ) -> Result<Self, SwitchyardError> {
        let checkpoint = serde_json::to_value(checkpoint).map_err(|err| {
            ConfigurationError::MalformedCheckpoint {
                service_id: service_id.to_string(),
                reason: err.to_string(),
            }
        })?;
        Ok(Self { checkpoint, events })
    }
}

/// Type-specific half of a watcher: how to check one service.
pub trait ServiceScanner: Send + Sync + 'static {
    /// The service type this scanner handles.
    fn service_type(&self) -> &'static str;

    /// Reject a service whose config or checkpoint this scanner cannot read.
    ///
    /// # Errors
    ///
    /// Returns a [`SwitchyardError::Configuration`] describing the problem.
    fn validate(&self, service: &ExternalService) -> Result<(), SwitchyardError> {
        let _ = service;
        Ok(())
    }

    /// Check one service against its current checkpoint.
    ///
    /// `checked_at` is captured before any remote call and becomes the new
    /// checkpoint's scan time. Remote calls must finish within `limit` (see
    /// [`remote_call`]); releasing a session gets its own `limit`, so it runs
    /// even after a timed out fetch. Returns `Ok(None)` when access was
    /// denied, in which case nothing is dispatched and the checkpoint is left
    /// alone.
    fn scan(
        &self,
        service: &ExternalService,
        checked_at: Timestamp,
        limit: Duration,
    ) -> impl Future<Output = Result<Option<ScanOutcome>, SwitchyardError>> + Send;
}

/// Await a remote call, failing with a [`SwitchyardError::Remote`] wrapping
/// [`Elapsed`] once `deadline` has passed.
///
/// # Errors
///
/// Returns the call's own error, or the timeout.
pub async fn remote_call<T>(
    deadline: Instant,
    call: impl Future<Output = Result<T, SwitchyardError>>,
) -> Result<T, SwitchyardError> {
    tokio::time::timeout_at(deadline, call)
        .await
        .map_err(SwitchyardError::remote)?
}

fn is_timeout(err: &SwitchyardError) -> bool {
    matches!(err, SwitchyardError::Remote(source) if source.is::<Elapsed>())
}

/// Timing knobs of a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherSettings {
    /// Pause between the end of one tick and the start of the next.
    pub interval: Duration,
    /// Upper bound for the remote calls of a single service check.
    pub check_timeout: Duration,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            check_timeout: Duration::from_secs(30),
        }
    }
}

struct Shared<S, G, K> {
    scanner: S,
    registry: G,
    sink: K,
    settings: WatcherSettings,
    handles: RwLock<HashMap<ServiceId, ExternalService>>,
}

/// Polls every registered service of one type.
pub struct ServiceWatcher<S, G, K> {
    shared: Arc<Shared<S, G, K>>,
    shutdown: Option<watch::Sender<bool>>,
    scan_task: Option<JoinHandle<()>>,
    listen_task: Option<JoinHandle<()>>,
}

impl<S, G, K> ServiceWatcher<S, G, K>
where
    S: ServiceScanner,
    G: ServiceRegistry + 'static,
    K: TriggerSink + 'static,
{
    /// Create a stopped watcher.
    pub fn new(scanner: S, registry: G, sink: K, settings: WatcherSettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                scanner,
                registry,
                sink,
                settings,
                handles: RwLock::new(HashMap::new()),
            }),
            shutdown: None,
            scan_task: None,
            listen_task: None,
        }
    }

    /// The service type this watcher handles.
    #[must_use]
    pub fn service_type(&self) -> &'static str {
        self.shared.scanner.service_type()
    }

    /// Snapshot of the handles currently watched.
    #[must_use]
    pub fn services(&self) -> Vec<ExternalService> {
        self.shared.snapshot()
    }

    /// Replace the handle set with the registry's current view.
    ///
    /// Returns the number of handles loaded.
    ///
    /// # Errors
    ///
    /// Returns the registry error when listing fails.
    pub async fn load(&self) -> Result<usize, SwitchyardError> {
        self.shared.reload().await
    }

    /// Check every handle once and wait for all checks to finish.
    pub async fn scan_once(&self) {
        self.shared.tick().await;
    }

    /// Load handles, follow registry changes and start polling.
    ///
    /// Calling `start` on a running watcher does nothing.
    ///
    /// # Errors
    ///
    /// Returns the registry error when the initial load fails.
    #[tracing::instrument(skip(self), fields(service_type = self.service_type()))]
    pub async fn start(&mut self) -> Result<(), SwitchyardError> {
        if self.scan_task.is_some() {
            tracing::debug!("watcher already running");
            return Ok(());
        }

        let changes = self.shared.registry.subscribe();
        let count = self.shared.reload().await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.listen_task = Some(tokio::spawn(Arc::clone(&self.shared).listen(changes)));
        self.scan_task = Some(tokio::spawn(Arc::clone(&self.shared).run(shutdown_rx)));
        self.shutdown = Some(shutdown_tx);

        tracing::info!(
            services = count,
            interval_secs = self.shared.settings.interval.as_secs(),
            "watcher started"
        );
        Ok(())
    }

    /// Stop polling, letting an in-flight tick finish, and stop following
    /// registry changes.
    #[tracing::instrument(skip(self), fields(service_type = self.service_type()))]
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        if let Some(task) = self.scan_task.take() {
            if let Err(err) = task.await {
                tracing::error!(%err, "scan loop ended abnormally");
            }
        }
        if let Some(task) = self.listen_task.take() {
            task.abort();
        }
        tracing::info!("watcher stopped");
    }
}

impl<S, G, K> Shared<S, G, K>
where
    S: ServiceScanner,
    G: ServiceRegistry + 'static,
    K: TriggerSink + 'static,
{
    fn snapshot(&self) -> Vec<ExternalService> {
        self.handles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn admit(&self, service: &ExternalService) -> bool {
        match self.scanner.validate(service) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    service_id = %service.id,
                    service_name = %service.name,
                    error = %err,
                    "ignoring service the watcher cannot read"
                );
                false
            }
        }
    }

    async fn reload(&self) -> Result<usize, SwitchyardError> {
        let services = self
            .registry
            .list(self.scanner.service_type())
            .await?;

        let mut handles = self.handles.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = HashMap::with_capacity(services.len());
        for mut service in services {
            if !self.admit(&service) {
                continue;
            }
            // The running checkpoint can be ahead of the stored one.
            if let Some(current) = handles.get(&service.id) {
                service.checkpoint = current.checkpoint.clone();
            }
            next.insert(service.id, service);
        }
        *handles = next;
        Ok(handles.len())
    }

    fn apply(&self, change: ServiceChange) {
        let ServiceChange { action, item } = change;
        let ours = item.service_type == self.scanner.service_type();
        let mut handles = self.handles.write().unwrap_or_else(PoisonError::into_inner);

        match action {
            ChangeAction::Added if ours => {
                if handles.contains_key(&item.id) || !self.admit(&item) {
                    return;
                }
                tracing::info!(service_id = %item.id, service_name = %item.name, "watching service");
                handles.insert(item.id, item);
            }
            ChangeAction::Removed => {
                if handles.remove(&item.id).is_some() {
                    tracing::info!(service_id = %item.id, "stopped watching service");
                }
            }
            ChangeAction::Updated if ours => match handles.get_mut(&item.id) {
                Some(existing) => {
                    existing.name = item.name;
                    existing.config = item.config;
                    tracing::debug!(service_id = %item.id, "service configuration refreshed");
                }
                None => {
                    if self.admit(&item) {
                        handles.insert(item.id, item);
                    }
                }
            },
            ChangeAction::Updated => {
                // Changed type: no longer ours.
                handles.remove(&item.id);
            }
            ChangeAction::Added => {}
        }
    }

    async fn listen(self: Arc<Self>, mut changes: broadcast::Receiver<ServiceChange>) {
        loop {
            match changes.recv().await {
                Ok(change) => self.apply(change),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "change notifications lost, reloading services");
                    if let Err(err) = self.reload().await {
                        tracing::warn!(error = %err, "service reload failed");
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }
            self.tick().await;
            tokio::select! {
                () = tokio::time::sleep(self.settings.interval) => {}
                _ = shutdown.changed() => break,
            }
        }
    }

    async fn tick(self: &Arc<Self>) {
        let services = self.snapshot();
        if services.is_empty() {
            return;
        }
        tracing::debug!(
            service_type = self.scanner.service_type(),
            count = services.len(),
            "checking services"
        );

        let mut checks = JoinSet::new();
        for service in services {
            let shared = Arc::clone(self);
            checks.spawn(async move { shared.check(service).await });
        }
        while let Some(joined) = checks.join_next().await {
            if let Err(err) = joined {
                tracing::error!(%err, "service check panicked");
            }
        }
    }

    #[tracing::instrument(skip_all, fields(service_id = %service.id, service_name = %service.name))]
    async fn check(&self, service: ExternalService) {
        let checked_at = time::now();
        let scan = self
            .scanner
            .scan(&service, checked_at, self.settings.check_timeout)
            .await;

        let outcome = match scan {
            Ok(Some(outcome)) => outcome,
            Ok(None) => {
                tracing::warn!("access denied, skipping service");
                return;
            }
            Err(err) if is_timeout(&err) => {
                tracing::warn!(
                    timeout_secs = self.settings.check_timeout.as_secs_f64(),
                    "service check timed out"
                );
                return;
            }
            Err(err) => {
                tracing::warn!(error = %err, "service check failed");
                return;
            }
        };

        if !outcome.events.is_empty() {
            tracing::info!(count = outcome.events.len(), "dispatching trigger events");
        }
        for event in outcome.events {
            self.sink.dispatch_trigger(event).await;
        }

        if !self.is_watched(service.id) {
            tracing::debug!("service removed during check, dropping checkpoint");
            return;
        }
        if let Err(err) = self
            .registry
            .update_checkpoint(service.id, outcome.checkpoint.clone())
            .await
        {
            tracing::warn!(error = %err, "checkpoint could not be persisted");
        }
        if let Some(handle) = self
            .handles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&service.id)
        {
            handle.checkpoint = outcome.checkpoint;
        }
    }

    fn is_watched(&self, id: ServiceId) -> bool {
        self.handles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }
}
