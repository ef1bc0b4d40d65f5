use crate::Symbol;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order side.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

/// Exchange order type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Limit,
    StopLoss,
    StopLossLimit,
    TakeProfit,
    TakeProfitLimit,
}

/// Exchange order status. Terminal states are absorbing.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Canceled | Self::Rejected | Self::Expired)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::New | Self::PartiallyFilled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::PartiallyFilled => "PartiallyFilled",
            Self::Filled => "Filled",
            Self::Canceled => "Canceled",
            Self::Rejected => "Rejected",
            Self::Expired => "Expired",
        }
    }
}

/// Exchange order owned by the execution engine.
///
/// Lifecycle: `New -> (PartiallyFilled)* -> Filled | Canceled | Rejected | Expired`,
/// with a monotonically non-decreasing `filled_quantity`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub exchange_id: Option<String>,
    pub symbol: Symbol,
    pub side: Side,
    pub kind: OrderKind,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    pub filled_price: Decimal,
    pub commission: Decimal,
    pub correlation_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Construct a fresh market order in status `New`.
    pub fn market(symbol: Symbol, side: Side, quantity: Decimal, correlation_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            exchange_id: None,
            symbol,
            side,
            kind: OrderKind::Market,
            quantity,
            price: None,
            stop_price: None,
            status: OrderStatus::New,
            filled_quantity: Decimal::ZERO,
            filled_price: Decimal::ZERO,
            commission: Decimal::ZERO,
            correlation_id,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Apply an execution report to this order.
    ///
    /// Terminal states are absorbing and `filled_quantity` never regresses;
    /// a stale or out-of-order report is therefore a no-op for those fields.
    /// Returns true if the order transitioned into a terminal state.
    pub fn apply_update(
        &mut self,
        status: OrderStatus,
        filled_quantity: Decimal,
        filled_price: Decimal,
        commission: Decimal,
    ) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.filled_quantity = self.filled_quantity.max(filled_quantity);
        if filled_quantity > Decimal::ZERO {
            self.filled_price = filled_price;
        }
        self.commission = self.commission.max(commission);
        self.status = status;
        self.updated_at = Some(Utc::now());

        status.is_terminal()
    }

    /// Quantity remaining to be filled.
    pub fn remaining_quantity(&self) -> Decimal {
        (self.quantity - self.filled_quantity).max(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order() -> Order {
        Order::market(Symbol::new("BTCUSDT"), Side::Buy, dec!(1), Uuid::new_v4())
    }

    #[test]
    fn test_filled_quantity_is_monotone() {
        let mut order = order();
        order.apply_update(OrderStatus::PartiallyFilled, dec!(0.6), dec!(100), dec!(0));
        order.apply_update(OrderStatus::PartiallyFilled, dec!(0.4), dec!(100), dec!(0));
        assert_eq!(order.filled_quantity, dec!(0.6));
        assert_eq!(order.remaining_quantity(), dec!(0.4));
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        let mut order = order();
        let terminal = order.apply_update(OrderStatus::Filled, dec!(1), dec!(100), dec!(0.1));
        assert!(terminal);

        let again = order.apply_update(OrderStatus::Canceled, dec!(0), dec!(0), dec!(0));
        assert!(!again);
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.filled_quantity, dec!(1));
    }

    #[test]
    fn test_new_market_order_defaults() {
        let order = order();
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.kind, OrderKind::Market);
        assert!(order.exchange_id.is_none());
        assert!(order.status.is_pending());
    }
}
