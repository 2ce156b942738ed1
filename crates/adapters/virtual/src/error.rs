//! Errors raised by the simulated services.

use switchyard_domain::error::SwitchyardError;

#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    /// The service config does not carry the expected credentials.
    #[error("invalid service config")]
    Config(#[from] serde_json::Error),

    /// The credentials were revoked.
    #[error("access denied")]
    AccessDenied,

    /// The order id is not known to the exchange.
    #[error("unknown order {0}")]
    UnknownOrder(String),

    /// The order was refused.
    #[error("order rejected: {0}")]
    OrderRejected(String),
}

impl From<VirtualError> for SwitchyardError {
    fn from(err: VirtualError) -> Self {
        Self::remote(err)
    }
}
