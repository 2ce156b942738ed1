//! Remote client ports: one per kind of external service.
//!
//! Wire protocols live in adapters; these traits only fix the data shapes
//! the core consumes. Every method receives the [`ExternalService`] whose
//! opaque config carries the credentials.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use switchyard_domain::checkpoint::RemoteItem;
use switchyard_domain::error::SwitchyardError;
use switchyard_domain::external_service::ExternalService;

/// Payment-processor invoice feed.
pub trait InvoiceClient: Send + Sync {
    /// Whether the stored credentials still grant access.
    fn check_access(
        &self,
        service: &ExternalService,
    ) -> impl Future<Output = Result<bool, SwitchyardError>> + Send;

    /// Every invoice currently visible, `status` set to the invoice status.
    fn fetch_invoices(
        &self,
        service: &ExternalService,
    ) -> impl Future<Output = Result<Vec<RemoteItem>, SwitchyardError>> + Send;
}

/// An open connection to a mailbox, held for one check only.
pub trait MailboxSession: Send {
    /// Headers and bodies of every message in the mailbox.
    fn fetch_messages(
        &mut self,
    ) -> impl Future<Output = Result<Vec<RemoteItem>, SwitchyardError>> + Send;

    /// Close the connection.
    fn disconnect(self) -> impl Future<Output = Result<(), SwitchyardError>> + Send;
}

/// Mailbox retrieval.
pub trait MailboxClient: Send + Sync {
    type Session: MailboxSession;

    /// Whether the stored credentials still grant access.
    fn check_access(
        &self,
        service: &ExternalService,
    ) -> impl Future<Output = Result<bool, SwitchyardError>> + Send;

    /// Open a session.
    fn connect(
        &self,
        service: &ExternalService,
    ) -> impl Future<Output = Result<Self::Session, SwitchyardError>> + Send;
}

/// An email to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail submission.
pub trait MailSender: Send + Sync {
    /// Send `email` through `service`, returning the message id.
    fn send(
        &self,
        service: &ExternalService,
        email: OutgoingEmail,
    ) -> impl Future<Output = Result<String, SwitchyardError>> + Send;
}

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Order execution style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Limit,
    Market,
    Stop,
}

/// An order to place on an exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub market_symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub amount: f64,
    pub price: Option<f64>,
    pub stop_price: Option<f64>,
    pub is_margin: bool,
}

/// Exchange-reported state of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
    pub status: String,
    pub amount_filled: f64,
    pub average_price: Option<f64>,
}

/// Exchange trading API.
pub trait ExchangeClient: Send + Sync {
    /// Submit an order.
    fn place_order(
        &self,
        service: &ExternalService,
        order: OrderRequest,
    ) -> impl Future<Output = Result<OrderResult, SwitchyardError>> + Send;

    /// Re-read an order after submission.
    fn get_order(
        &self,
        service: &ExternalService,
        order_id: &str,
    ) -> impl Future<Output = Result<OrderResult, SwitchyardError>> + Send;
}

impl<T: InvoiceClient> InvoiceClient for Arc<T> {
    fn check_access(
        &self,
        service: &ExternalService,
    ) -> impl Future<Output = Result<bool, SwitchyardError>> + Send {
        (**self).check_access(service)
    }

    fn fetch_invoices(
        &self,
        service: &ExternalService,
    ) -> impl Future<Output = Result<Vec<RemoteItem>, SwitchyardError>> + Send {
        (**self).fetch_invoices(service)
    }
}

impl<T: MailboxClient> MailboxClient for Arc<T> {
    type Session = T::Session;

    fn check_access(
        &self,
        service: &ExternalService,
    ) -> impl Future<Output = Result<bool, SwitchyardError>> + Send {
        (**self).check_access(service)
    }

    fn connect(
        &self,
        service: &ExternalService,
    ) -> impl Future<Output = Result<Self::Session, SwitchyardError>> + Send {
        (**self).connect(service)
    }
}

impl<T: MailSender> MailSender for Arc<T> {
    fn send(
        &self,
        service: &ExternalService,
        email: OutgoingEmail,
    ) -> impl Future<Output = Result<String, SwitchyardError>> + Send {
        (**self).send(service, email)
    }
}

impl<T: ExchangeClient> ExchangeClient for Arc<T> {
    fn place_order(
        &self,
        service: &ExternalService,
        order: OrderRequest,
    ) -> impl Future<Output = Result<OrderResult, SwitchyardError>> + Send {
        (**self).place_order(service, order)
    }

    fn get_order(
        &self,
        service: &ExternalService,
        order_id: &str,
    ) -> impl Future<Output = Result<OrderResult, SwitchyardError>> + Send {
        (**self).get_order(service, order_id)
    }
}
