//! Invoice feed scanner: fires `InvoiceStatusChanged` for new invoices and
//! status transitions.

use std::time::Duration;

use tokio::time::Instant;

use switchyard_domain::checkpoint::{DetectedChange, ItemClass, StatusCheckpoint};
use switchyard_domain::error::SwitchyardError;
use switchyard_domain::external_service::{ExternalService, service_type};
use switchyard_domain::id::ServiceId;
use switchyard_domain::time::Timestamp;
use switchyard_domain::trigger::{TriggerEvent, trigger_kind};

use super::{ScanOutcome, ServiceScanner, remote_call};
use crate::ports::InvoiceClient;

/// Key of the invoice object inside trigger data.
pub const INVOICE_KEY: &str = "Invoice";

/// Scanner for [`service_type::INVOICE_FEED`] services.
pub struct InvoiceScanner<C> {
    client: C,
}

impl<C> InvoiceScanner<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

fn invoice_event(service_id: ServiceId, change: DetectedChange) -> TriggerEvent {
    let DetectedChange { item, class } = change;
    let mut invoice = match item.payload {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    invoice.insert("id".into(), item.id.into());
    invoice.insert("status".into(), item.status.into());
    invoice.insert("timestamp".into(), item.timestamp.to_rfc3339().into());
    let previous = match class {
        ItemClass::Changed { previous } => serde_json::Value::String(previous),
        ItemClass::New | ItemClass::Unchanged => serde_json::Value::Null,
    };
    invoice.insert("previous_status".into(), previous);

    TriggerEvent::from_service(
        trigger_kind::INVOICE_STATUS_CHANGED,
        service_id,
        INVOICE_KEY,
        serde_json::Value::Object(invoice),
    )
}

impl<C: InvoiceClient + 'static> ServiceScanner for InvoiceScanner<C> {
    fn service_type(&self) -> &'static str {
        service_type::INVOICE_FEED
    }

    fn validate(&self, service: &ExternalService) -> Result<(), SwitchyardError> {
        service.checkpoint_as::<StatusCheckpoint>().map(|_| ())
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
        let previous: StatusCheckpoint = service.checkpoint_as()?;
        let invoices = remote_call(deadline, self.client.fetch_invoices(service)).await?;

        let (next, changes) = previous.observe(&invoices, checked_at);
        tracing::debug!(
            fetched = invoices.len(),
            changed = changes.len(),
            baseline = !previous.has_baseline(),
            "invoices compared"
        );

        let events = changes
            .into_iter()
            .map(|change| invoice_event(service.id, change))
            .collect();
        ScanOutcome::new(service.id, &next, events).map(Some)
    }
}
