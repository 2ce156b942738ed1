//! Virtual invoice feed: a store whose invoices move through
//! `New → Paid → Complete`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use switchyard_app::ports::InvoiceClient;
use switchyard_domain::checkpoint::RemoteItem;
use switchyard_domain::error::SwitchyardError;
use switchyard_domain::external_service::ExternalService;
use switchyard_domain::id::ServiceId;
use switchyard_domain::time::now;

use super::{ensure_access, has_access};

/// Simulated payment-processor store.
#[derive(Default)]
pub struct VirtualInvoiceFeed {
    invoices: Mutex<HashMap<ServiceId, Vec<RemoteItem>>>,
    counter: AtomicU64,
}

impl VirtualInvoiceFeed {
    /// Open a new invoice in state `New` and return its id.
    pub fn create_invoice(&self, service_id: ServiceId, amount: f64, currency: &str) -> String {
        let id = format!("inv-{}", self.counter.fetch_add(1, Ordering::Relaxed) + 1);
        let item = RemoteItem {
            id: id.clone(),
            status: "New".to_string(),
            timestamp: now(),
            payload: serde_json::json!({"amount": amount, "currency": currency}),
        };
        self.lock().entry(service_id).or_default().push(item);
        tracing::debug!(%service_id, invoice_id = %id, "virtual invoice created");
        id
    }

    /// Force an invoice into `status`. Returns `false` for unknown invoices.
    pub fn set_status(&self, service_id: ServiceId, invoice_id: &str, status: &str) -> bool {
        let mut invoices = self.lock();
        let Some(item) = invoices
            .get_mut(&service_id)
            .and_then(|items| items.iter_mut().find(|i| i.id == invoice_id))
        else {
            return false;
        };
        item.status = status.to_string();
        item.timestamp = now();
        true
    }

    /// Move every open invoice one step along its lifecycle.
    ///
    /// Returns the number of invoices that changed.
    pub fn advance(&self, service_id: ServiceId) -> usize {
        let mut invoices = self.lock();
        let Some(items) = invoices.get_mut(&service_id) else {
            return 0;
        };
        let mut moved = 0;
        for item in items.iter_mut() {
            let next = match item.status.as_str() {
                "New" => "Paid",
                "Paid" => "Complete",
                _ => continue,
            };
            item.status = next.to_string();
            item.timestamp = now();
            moved += 1;
        }
        moved
    }

    /// Snapshot of the invoices of one store.
    #[must_use]
    pub fn invoices(&self, service_id: ServiceId) -> Vec<RemoteItem> {
        self.lock().get(&service_id).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ServiceId, Vec<RemoteItem>>> {
        self.invoices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InvoiceClient for VirtualInvoiceFeed {
    async fn check_access(&self, service: &ExternalService) -> Result<bool, SwitchyardError> {
        Ok(has_access(service)?)
    }

    async fn fetch_invoices(
        &self,
        service: &ExternalService,
    ) -> Result<Vec<RemoteItem>, SwitchyardError> {
        ensure_access(service)?;
        Ok(self.invoices(service.id))
    }
}
