//! Mailbox scanner: fires `ReceivedEmail` for every message received since
//! the previous scan.

use std::time::Duration;

use tokio::time::Instant;

use switchyard_domain::checkpoint::{DetectedChange, RemoteItem, TimestampCheckpoint};
use switchyard_domain::error::SwitchyardError;
use switchyard_domain::external_service::{ExternalService, service_type};
use switchyard_domain::id::ServiceId;
use switchyard_domain::time::Timestamp;
use switchyard_domain::trigger::{TriggerEvent, trigger_kind};

use super::{ScanOutcome, ServiceScanner, remote_call};
use crate::ports::{MailboxClient, MailboxSession};

/// Key of the email object inside trigger data.
pub const EMAIL_KEY: &str = "Email";

/// Scanner for [`service_type::MAILBOX`] services.
pub struct MailboxScanner<C> {
    client: C,
}

impl<C> MailboxScanner<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

fn email_event(service_id: ServiceId, item: RemoteItem) -> TriggerEvent {
    let mut email = match item.payload {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    email.insert("id".into(), item.id.into());
    email.insert("received_at".into(), item.timestamp.to_rfc3339().into());

    TriggerEvent::from_service(
        trigger_kind::RECEIVED_EMAIL,
        service_id,
        EMAIL_KEY,
        serde_json::Value::Object(email),
    )
}

impl<C: MailboxClient + 'static> ServiceScanner for MailboxScanner<C> {
    fn service_type(&self) -> &'static str {
        service_type::MAILBOX
    }

    fn validate(&self, service: &ExternalService) -> Result<(), SwitchyardError> {
        service.checkpoint_as::<TimestampCheckpoint>().map(|_| ())
    }

    async fn scan(
        &self,
        service: &ExternalService,
        checked_at: Timestamp,
        limit: Duration,
    ) -> Result<Option<ScanOutcome>, SwitchyardError> {
        let deadline = Instant::now() + limit;
        if !remote_call(deadline, self.client.check_access(service)).await? {
            return Ok(None);
        }
        let previous: TimestampCheckpoint = service.checkpoint_as()?;

        let mut session = remote_call(deadline, self.client.connect(service)).await?;
        let fetched = remote_call(deadline, session.fetch_messages()).await;
        let released = remote_call(Instant::now() + limit, session.disconnect()).await;
        if let Err(err) = released {
            tracing::debug!(error = %err, "mailbox disconnect failed");
        }
        let messages = fetched?;

        let (next, changes) = previous.observe(&messages, checked_at);
        tracing::debug!(
            fetched = messages.len(),
            received = changes.len(),
            "mailbox compared"
        );

        let events = changes
            .into_iter()
            .map(|DetectedChange { item, .. }| email_event(service.id, item))
            .collect();
        ScanOutcome::new(service.id, &next, events).map(Some)
    }
}
