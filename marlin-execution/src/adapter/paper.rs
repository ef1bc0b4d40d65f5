use crate::{
    adapter::{OrderAdapter, OrderReceipt},
    error::AdapterError,
};
use async_trait::async_trait;
use fnv::FnvHashMap;
use marlin_bus::{Cache, SharedCache, keys};
use marlin_core::Order;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::{str::FromStr, time::Duration};
use tracing::debug;
use uuid::Uuid;

/// Simulated commission rate applied to paper fills.
const FEE_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 3); // 0.1%

/// Paper trading adapter: fills instantly at the cached latest price.
///
/// An order for a symbol with no cached price is rejected rather than
/// filled at a fabricated level. Completed orders are indexed in memory so
/// query and cancel behave like a real venue.
pub struct PaperAdapter {
    cache: SharedCache,
    fill_latency: Duration,
    orders: Mutex<FnvHashMap<Uuid, OrderReceipt>>,
}

impl std::fmt::Debug for PaperAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperAdapter")
            .field("fill_latency", &self.fill_latency)
            .field("orders", &self.orders.lock().len())
            .finish()
    }
}

impl PaperAdapter {
    pub fn new(cache: SharedCache, fill_latency: Duration) -> Self {
        Self {
            cache,
            fill_latency,
            orders: Mutex::new(FnvHashMap::default()),
        }
    }

    async fn latest_price(&self, symbol: &str) -> Result<Decimal, AdapterError> {
        let cached = self
            .cache
            .get(&keys::price_latest(symbol))
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AdapterError::NoMarketPrice(symbol.to_string()))?;

        Decimal::from_str(&cached).map_err(|_| AdapterError::NoMarketPrice(symbol.to_string()))
    }
}

#[async_trait]
impl OrderAdapter for PaperAdapter {
    fn name(&self) -> &'static str {
        "paper"
    }

    async fn place_order(&self, order: &Order) -> Result<OrderReceipt, AdapterError> {
        let price = self.latest_price(&order.symbol).await?;

        if !self.fill_latency.is_zero() {
            tokio::time::sleep(self.fill_latency).await;
        }

        let commission = (order.quantity * price * FEE_RATE).round_dp(8);
        let receipt = OrderReceipt::filled(
            format!("PAPER-{}", order.id.simple()),
            order.quantity,
            price,
            commission,
        );

        debug!(symbol = %order.symbol, %price, "paper fill");
        self.orders.lock().insert(order.id, receipt.clone());
        Ok(receipt)
    }

    async fn query_order(&self, order: &Order) -> Result<OrderReceipt, AdapterError> {
        self.orders
            .lock()
            .get(&order.id)
            .cloned()
            .ok_or(AdapterError::UnknownOrder)
    }

    async fn cancel_order(&self, order: &Order) -> Result<OrderReceipt, AdapterError> {
        // Paper fills are instantaneous, so a cancel can only ever observe
        // the already-terminal state.
        self.query_order(order).await
    }
}
