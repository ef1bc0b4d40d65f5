use crate::error::AdapterError;
use async_trait::async_trait;
use marlin_core::{Order, OrderStatus};
use rust_decimal::Decimal;

pub mod fake;
pub mod live;
pub mod paper;

/// Result of one adapter interaction, folded into the tracked order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub exchange_order_id: Option<String>,
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    pub filled_price: Decimal,
    pub commission: Decimal,
}

impl OrderReceipt {
    /// A receipt reporting a full fill at the given price.
    pub fn filled(
        exchange_order_id: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
        commission: Decimal,
    ) -> Self {
        Self {
            exchange_order_id: Some(exchange_order_id.into()),
            status: OrderStatus::Filled,
            filled_quantity: quantity,
            filled_price: price,
            commission,
        }
    }

    pub fn canceled() -> Self {
        Self {
            exchange_order_id: None,
            status: OrderStatus::Canceled,
            filled_quantity: Decimal::ZERO,
            filled_price: Decimal::ZERO,
            commission: Decimal::ZERO,
        }
    }

    pub fn rejected() -> Self {
        Self {
            exchange_order_id: None,
            status: OrderStatus::Rejected,
            filled_quantity: Decimal::ZERO,
            filled_price: Decimal::ZERO,
            commission: Decimal::ZERO,
        }
    }
}

/// Venue seam used by the execution service.
///
/// Every method returns a typed receipt rather than throwing through the
/// pipeline; callers branch on the result.
#[async_trait]
pub trait OrderAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn place_order(&self, order: &Order) -> Result<OrderReceipt, AdapterError>;

    async fn query_order(&self, order: &Order) -> Result<OrderReceipt, AdapterError>;

    async fn cancel_order(&self, order: &Order) -> Result<OrderReceipt, AdapterError>;
}
