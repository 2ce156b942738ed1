//! # switchyard-adapter-virtual
//!
//! Virtual/demo remote services for testing and demonstration purposes.
//!
//! ## Provided services
//!
//! | Service | Port | Behaviour |
//! |---------|------|-----------|
//! | [`VirtualInvoiceFeed`] | `InvoiceClient` | Invoices advance `New → Paid → Complete` on demand |
//! | [`VirtualMailbox`] | `MailboxClient`, `MailSender` | Inboxes keyed by address; sent mail loops back |
//! | [`VirtualExchange`] | `ExchangeClient` | Market orders fill, limit/stop orders stay open |
//!
//! Every service reads an `api_key` from its config; an empty key or the
//! value `"revoked"` denies access.
//!
//! ## Dependency rule
//!
//! Depends on `switchyard-app` (port traits) and `switchyard-domain` only.

mod error;
mod services;

pub use error::VirtualError;
pub use services::{REVOKED_KEY, VirtualExchange, VirtualInvoiceFeed, VirtualMailbox};

use switchyard_domain::error::SwitchyardError;
use switchyard_domain::external_service::{ExternalService, service_type};

/// Address of the mailbox created by [`demo_services`].
pub const DEMO_MAILBOX_ADDRESS: &str = "owner@switchyard.local";

/// One service of each type, wired to the virtual clients.
///
/// # Errors
///
/// Only fails if a definition violates the domain invariants.
pub fn demo_services() -> Result<Vec<ExternalService>, SwitchyardError> {
    Ok(vec![
        ExternalService::builder()
            .name("Demo shop")
            .service_type(service_type::INVOICE_FEED)
            .config(serde_json::json!({"api_key": "demo"}))
            .build()?,
        ExternalService::builder()
            .name("Demo inbox")
            .service_type(service_type::MAILBOX)
            .config(serde_json::json!({"api_key": "demo", "address": DEMO_MAILBOX_ADDRESS}))
            .build()?,
        ExternalService::builder()
            .name("Demo exchange")
            .service_type(service_type::EXCHANGE)
            .config(serde_json::json!({"api_key": "demo"}))
            .build()?,
    ])
}
