//! `PlaceOrder`: submits an order on an exchange account.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use switchyard_domain::action_result::ActionHandlerResult;
use switchyard_domain::error::SwitchyardError;
use switchyard_domain::recipe::RecipeAction;
use switchyard_domain::trigger::EventData;

use super::{ActionContext, TypedActionHandler, describe};
use crate::ports::{ExchangeClient, OrderRequest, OrderSide, OrderType};

/// A number given either as JSON number or as (templated) text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(f64),
    Text(String),
}

impl Quantity {
    fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrderConfig {
    pub market_symbol: String,
    pub side: OrderSide,
    #[serde(default)]
    pub order_type: OrderType,
    pub amount: Quantity,
    #[serde(default)]
    pub price: Option<Quantity>,
    #[serde(default)]
    pub stop_price: Option<Quantity>,
    #[serde(default)]
    pub is_margin: bool,
}

impl PlaceOrderConfig {
    fn to_request(&self) -> Result<OrderRequest, String> {
        let number = |name: &str, quantity: &Quantity| {
            quantity
                .value()
                .ok_or_else(|| format!("{name} {quantity:?} is not a number"))
        };
        let optional = |name: &str, quantity: Option<&Quantity>| {
            quantity.map(|q| number(name, q)).transpose()
        };
        Ok(OrderRequest {
            market_symbol: self.market_symbol.clone(),
            side: self.side,
            order_type: self.order_type,
            amount: number("amount", &self.amount)?,
            price: optional("price", self.price.as_ref())?,
            stop_price: optional("stop_price", self.stop_price.as_ref())?,
            is_margin: self.is_margin,
        })
    }
}

/// Handler for the `PlaceOrder` action.
pub struct PlaceOrderHandler<C> {
    client: C,
    settle_delay: Duration,
}

impl<C> PlaceOrderHandler<C> {
    pub const ACTION_ID: &'static str = "PlaceOrder";

    pub fn new(client: C) -> Self {
        Self {
            client,
            settle_delay: Duration::from_millis(500),
        }
    }

    /// Pause between submitting an order and re-reading it.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

impl<C: ExchangeClient + 'static> TypedActionHandler for PlaceOrderHandler<C> {
    type Config = PlaceOrderConfig;

    fn action_id(&self) -> &'static str {
        Self::ACTION_ID
    }

    async fn execute(
        &self,
        _data: &EventData,
        action: &RecipeAction,
        config: PlaceOrderConfig,
        context: &ActionContext,
    ) -> Result<ActionHandlerResult, SwitchyardError> {
        let service = context.require_service(action)?;
        let order = match config.to_request() {
            Ok(order) => order,
            Err(reason) => {
                return Ok(ActionHandlerResult::failure(format!(
                    "Could not place order because {reason}"
                )));
            }
        };

        tracing::info!(
            service_id = %service.id,
            market = %order.market_symbol,
            side = ?order.side,
            amount = order.amount,
            "placing order"
        );
        let placed = match self.client.place_order(service, order).await {
            Ok(placed) => placed,
            Err(err) => {
                return Ok(ActionHandlerResult::failure(format!(
                    "Could not place order because {}",
                    describe(&err)
                )));
            }
        };

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        let order = match self.client.get_order(service, &placed.order_id).await {
            Ok(order) => order,
            Err(err) => {
                tracing::warn!(order_id = %placed.order_id, error = %err, "order re-read failed");
                placed
            }
        };

        let data = serde_json::to_value(&order).unwrap_or_default();
        Ok(ActionHandlerResult::success(format!(
            "Place order ({}) Status: {}",
            order.order_id, order.status
        ))
        .with_data(data))
    }
}
