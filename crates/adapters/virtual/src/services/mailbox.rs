//! Virtual mailbox: inboxes keyed by address, plus an outbox.
//!
//! A mailbox service reads the inbox named by its `address` config field.
//! Sending through a mailbox service delivers into the inbox of the
//! recipient address, so a send action can feed a `ReceivedEmail` watcher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

use switchyard_app::ports::{MailSender, MailboxClient, MailboxSession, OutgoingEmail};
use switchyard_domain::checkpoint::RemoteItem;
use switchyard_domain::error::SwitchyardError;
use switchyard_domain::external_service::ExternalService;
use switchyard_domain::time::now;

use super::{ensure_access, has_access};
use crate::error::VirtualError;

#[derive(Debug, Deserialize)]
struct MailboxConfig {
    #[serde(default)]
    address: String,
}

fn address_of(service: &ExternalService) -> Result<String, VirtualError> {
    let config: MailboxConfig = serde_json::from_value(service.config.clone())?;
    Ok(config.address.to_lowercase())
}

#[derive(Default)]
struct State {
    inboxes: HashMap<String, Vec<RemoteItem>>,
    outbox: Vec<(String, OutgoingEmail)>,
}

/// Simulated mail server.
#[derive(Default)]
pub struct VirtualMailbox {
    state: Mutex<State>,
    counter: AtomicU64,
}

impl VirtualMailbox {
    /// Drop a message into the inbox of `address`, dated now.
    pub fn deliver(&self, address: &str, from: &str, subject: &str, body: &str) -> String {
        let id = format!("msg-{}", self.counter.fetch_add(1, Ordering::Relaxed) + 1);
        let item = RemoteItem {
            id: id.clone(),
            status: "unread".to_string(),
            timestamp: now(),
            payload: serde_json::json!({
                "from": from,
                "to": address,
                "subject": subject,
                "body": body,
            }),
        };
        self.lock()
            .inboxes
            .entry(address.to_lowercase())
            .or_default()
            .push(item);
        tracing::debug!(%address, message_id = %id, "virtual email delivered");
        id
    }

    /// Messages currently in the inbox of `address`.
    #[must_use]
    pub fn inbox(&self, address: &str) -> Vec<RemoteItem> {
        self.lock()
            .inboxes
            .get(&address.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// Every email sent so far, with the sender address.
    #[must_use]
    pub fn outbox(&self) -> Vec<(String, OutgoingEmail)> {
        self.lock().outbox.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Snapshot of one inbox taken at connect time.
pub struct VirtualMailboxSession {
    messages: Vec<RemoteItem>,
}

impl MailboxSession for VirtualMailboxSession {
    async fn fetch_messages(&mut self) -> Result<Vec<RemoteItem>, SwitchyardError> {
        Ok(std::mem::take(&mut self.messages))
    }

    async fn disconnect(self) -> Result<(), SwitchyardError> {
        Ok(())
    }
}

impl MailboxClient for VirtualMailbox {
    type Session = VirtualMailboxSession;

    async fn check_access(&self, service: &ExternalService) -> Result<bool, SwitchyardError> {
        Ok(has_access(service)?)
    }

    async fn connect(
        &self,
        service: &ExternalService,
    ) -> Result<VirtualMailboxSession, SwitchyardError> {
        ensure_access(service)?;
        let address = address_of(service)?;
        Ok(VirtualMailboxSession {
            messages: self.inbox(&address),
        })
    }
}

impl MailSender for VirtualMailbox {
    async fn send(
        &self,
        service: &ExternalService,
        email: OutgoingEmail,
    ) -> Result<String, SwitchyardError> {
        ensure_access(service)?;
        let from = address_of(service)?;
        let id = self.deliver(&email.to, &from, &email.subject, &email.body);
        self.lock().outbox.push((from, email));
        Ok(id)
    }
}
