//! Virtual exchange: market orders fill immediately, limit and stop
//! orders rest on the book.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use switchyard_app::ports::{ExchangeClient, OrderRequest, OrderResult, OrderType};
use switchyard_domain::error::SwitchyardError;
use switchyard_domain::external_service::ExternalService;

use super::ensure_access;
use crate::error::VirtualError;

/// Price used to fill market orders that carry none.
const REFERENCE_PRICE: f64 = 100.0;

/// Simulated exchange account.
#[derive(Default)]
pub struct VirtualExchange {
    orders: Mutex<HashMap<String, OrderResult>>,
    counter: AtomicU64,
}

impl VirtualExchange {
    /// Fill a resting order at `price`. Returns `false` for unknown orders.
    pub fn fill(&self, order_id: &str, price: f64) -> bool {
        let mut orders = self.lock();
        let Some(order) = orders.get_mut(order_id) else {
            return false;
        };
        order.status = "filled".to_string();
        order.average_price = Some(price);
        true
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, OrderResult>> {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn check(order: &OrderRequest) -> Result<(), VirtualError> {
    if order.market_symbol.is_empty() {
        return Err(VirtualError::OrderRejected("missing market symbol".into()));
    }
    if !(order.amount.is_finite() && order.amount > 0.0) {
        return Err(VirtualError::OrderRejected(format!(
            "invalid amount {}",
            order.amount
        )));
    }
    if order.order_type == OrderType::Limit && order.price.is_none() {
        return Err(VirtualError::OrderRejected("limit order without price".into()));
    }
    if order.order_type == OrderType::Stop && order.stop_price.is_none() {
        return Err(VirtualError::OrderRejected("stop order without stop price".into()));
    }
    Ok(())
}

impl ExchangeClient for VirtualExchange {
    async fn place_order(
        &self,
        service: &ExternalService,
        order: OrderRequest,
    ) -> Result<OrderResult, SwitchyardError> {
        ensure_access(service)?;
        check(&order)?;

        let order_id = format!("vx-{}", self.counter.fetch_add(1, Ordering::Relaxed) + 1);
        let result = match order.order_type {
            OrderType::Market => OrderResult {
                order_id: order_id.clone(),
                status: "filled".to_string(),
                amount_filled: order.amount,
                average_price: Some(order.price.unwrap_or(REFERENCE_PRICE)),
            },
            OrderType::Limit | OrderType::Stop => OrderResult {
                order_id: order_id.clone(),
                status: "open".to_string(),
                amount_filled: 0.0,
                average_price: None,
            },
        };
        tracing::debug!(
            %order_id,
            symbol = %order.market_symbol,
            side = ?order.side,
            status = %result.status,
            "virtual order placed"
        );
        self.lock().insert(order_id, result.clone());
        Ok(result)
    }

    async fn get_order(
        &self,
        service: &ExternalService,
        order_id: &str,
    ) -> Result<OrderResult, SwitchyardError> {
        ensure_access(service)?;
        self.lock()
            .get(order_id)
            .cloned()
            .ok_or_else(|| VirtualError::UnknownOrder(order_id.to_string()).into())
    }
}
