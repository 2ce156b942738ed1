//! Simulated remote services.
//!
//! State is kept per [`ServiceId`] so several configured services of the
//! same type stay independent. Access is granted while the service config
//! carries a non-empty `api_key` other than `"revoked"`.

mod exchange;
mod invoice_feed;
mod mailbox;

pub use exchange::VirtualExchange;
pub use invoice_feed::VirtualInvoiceFeed;
pub use mailbox::VirtualMailbox;

use serde::Deserialize;

use switchyard_domain::external_service::ExternalService;

use crate::error::VirtualError;

/// Value of `api_key` that simulates revoked credentials.
pub const REVOKED_KEY: &str = "revoked";

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    api_key: String,
}

fn credentials(service: &ExternalService) -> Result<Credentials, VirtualError> {
    if service.config.is_null() {
        return Ok(Credentials {
            api_key: String::new(),
        });
    }
    Ok(serde_json::from_value(service.config.clone())?)
}

/// Whether `service` would be let in.
fn has_access(service: &ExternalService) -> Result<bool, VirtualError> {
    let creds = credentials(service)?;
    Ok(!creds.api_key.is_empty() && creds.api_key != REVOKED_KEY)
}

fn ensure_access(service: &ExternalService) -> Result<(), VirtualError> {
    if has_access(service)? {
        Ok(())
    } else {
        Err(VirtualError::AccessDenied)
    }
}
