use crate::{
    adapter::{OrderAdapter, OrderReceipt},
    error::AdapterError,
};
use async_trait::async_trait;
use marlin_core::{Order, OrderKind, OrderStatus, Side};
use marlin_integration::{LazyCredentials, RateLimiter, RestClient, TransportError};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::{str::FromStr, sync::Arc};
use tracing::debug;

const ORDER_PATH: &str = "/api/v3/order";

/// Venue request weights, summed against the rolling-minute budget.
const WEIGHT_PLACE: u32 = 1;
const WEIGHT_QUERY: u32 = 2;
const WEIGHT_CANCEL: u32 = 1;

/// Weight budget per rolling minute.
pub const RATE_LIMIT_CAPACITY: u32 = 1200;

fn side_param(side: Side) -> &'static str {
    match side {
        Side::Buy => "BUY",
        Side::Sell => "SELL",
    }
}

fn kind_param(kind: OrderKind) -> &'static str {
    match kind {
        OrderKind::Market => "MARKET",
        OrderKind::Limit => "LIMIT",
        OrderKind::StopLoss => "STOP_LOSS",
        OrderKind::StopLossLimit => "STOP_LOSS_LIMIT",
        OrderKind::TakeProfit => "TAKE_PROFIT",
        OrderKind::TakeProfitLimit => "TAKE_PROFIT_LIMIT",
    }
}

fn parse_status(status: &str) -> Option<OrderStatus> {
    Some(match status {
        "NEW" => OrderStatus::New,
        "PARTIALLY_FILLED" => OrderStatus::PartiallyFilled,
        "FILLED" => OrderStatus::Filled,
        "CANCELED" => OrderStatus::Canceled,
        "REJECTED" => OrderStatus::Rejected,
        "EXPIRED" => OrderStatus::Expired,
        _ => return None,
    })
}

fn decimal_or_zero(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap_or(Decimal::ZERO)
}

/// Order endpoint response, shared by place, query and cancel.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VenueOrder {
    #[allow(dead_code)]
    symbol: String,
    order_id: i64,
    status: String,
    #[serde(default)]
    executed_qty: String,
    #[serde(default)]
    cummulative_quote_qty: String,
}

impl VenueOrder {
    fn to_receipt(&self) -> Result<OrderReceipt, AdapterError> {
        let status = parse_status(&self.status)
            .ok_or_else(|| AdapterError::Exchange(format!("unknown status {}", self.status)))?;

        let executed = decimal_or_zero(&self.executed_qty);
        let quote = decimal_or_zero(&self.cummulative_quote_qty);
        let filled_price = if executed > Decimal::ZERO {
            quote / executed
        } else {
            Decimal::ZERO
        };

        Ok(OrderReceipt {
            exchange_order_id: Some(self.order_id.to_string()),
            status,
            filled_quantity: executed,
            filled_price,
            commission: Decimal::ZERO,
        })
    }
}

/// Signed REST adapter against the live venue.
///
/// Credentials load lazily on first use through the secret provider; the
/// rolling-minute rate limiter makes callers wait when the weight budget is
/// spent. Transience classification is left to the caller, which owns the
/// live circuit.
pub struct LiveAdapter {
    rest: RestClient,
    credentials: Arc<LazyCredentials>,
    limiter: RateLimiter,
}

impl std::fmt::Debug for LiveAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveAdapter")
            .field("base_url", &self.rest.base_url())
            .finish()
    }
}

impl LiveAdapter {
    pub fn new(rest: RestClient, credentials: Arc<LazyCredentials>, limiter: RateLimiter) -> Self {
        Self {
            rest,
            credentials,
            limiter,
        }
    }

    async fn send(
        &self,
        method: Method,
        params: Vec<(String, String)>,
        weight: u32,
    ) -> Result<OrderReceipt, AdapterError> {
        self.limiter.acquire(weight).await;
        let credentials = self.credentials.get().await?;

        let body = self
            .rest
            .send_signed(method, ORDER_PATH, params, credentials)
            .await
            .map_err(|error| match error {
                TransportError::HttpResponse(status, body)
                    if status.is_client_error()
                        && status != reqwest::StatusCode::TOO_MANY_REQUESTS =>
                {
                    AdapterError::Exchange(body)
                }
                other => AdapterError::Transport(other),
            })?;

        let venue_order: VenueOrder = serde_json::from_str(&body)?;
        venue_order.to_receipt()
    }

    fn place_params(order: &Order) -> Vec<(String, String)> {
        let mut params = vec![
            ("symbol".to_string(), order.symbol.to_string()),
            ("side".to_string(), side_param(order.side).to_string()),
            ("type".to_string(), kind_param(order.kind).to_string()),
            ("quantity".to_string(), order.quantity.to_string()),
        ];

        if matches!(
            order.kind,
            OrderKind::Limit | OrderKind::StopLossLimit | OrderKind::TakeProfitLimit
        ) {
            params.push(("timeInForce".to_string(), "GTC".to_string()));
        }
        if let Some(price) = order.price {
            params.push(("price".to_string(), price.to_string()));
        }
        if let Some(stop_price) = order.stop_price {
            params.push(("stopPrice".to_string(), stop_price.to_string()));
        }
        params.push(("newClientOrderId".to_string(), order.id.to_string()));
        params
    }

    fn lookup_params(order: &Order) -> Vec<(String, String)> {
        vec![
            ("symbol".to_string(), order.symbol.to_string()),
            ("origClientOrderId".to_string(), order.id.to_string()),
        ]
    }
}

#[async_trait]
impl OrderAdapter for LiveAdapter {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn place_order(&self, order: &Order) -> Result<OrderReceipt, AdapterError> {
        debug!(symbol = %order.symbol, side = ?order.side, "placing live order");
        self.send(Method::POST, Self::place_params(order), WEIGHT_PLACE)
            .await
    }

    async fn query_order(&self, order: &Order) -> Result<OrderReceipt, AdapterError> {
        self.send(Method::GET, Self::lookup_params(order), WEIGHT_QUERY)
            .await
    }

    async fn cancel_order(&self, order: &Order) -> Result<OrderReceipt, AdapterError> {
        self.send(Method::DELETE, Self::lookup_params(order), WEIGHT_CANCEL)
            .await
    }
}
