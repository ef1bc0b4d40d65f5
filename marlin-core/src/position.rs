use crate::{Side, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of open exposure.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl From<Side> for PositionSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => Self::Long,
            Side::Sell => Self::Short,
        }
    }
}

/// Open exposure on one symbol, alive from first fill until flat.
///
/// Related orders are referenced by id only; there are no back-pointers.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: Symbol,
    pub side: PositionSide,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    pub quantity: Decimal,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Open a new position from the first fill.
    pub fn open(symbol: Symbol, side: PositionSide, price: Decimal, quantity: Decimal) -> Self {
        Self {
            symbol,
            side,
            entry_price: price,
            current_price: price,
            quantity,
            unrealized_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            stop_loss: None,
            take_profit: None,
            opened_at: Utc::now(),
        }
    }

    /// Re-mark the position against the latest traded price.
    pub fn mark(&mut self, price: Decimal) {
        self.current_price = price;
        self.unrealized_pnl = match self.side {
            PositionSide::Long => (price - self.entry_price) * self.quantity,
            PositionSide::Short => (self.entry_price - price) * self.quantity,
        };
    }

    /// Realised profit from closing `quantity` units at `price`.
    pub fn close_pnl(&self, price: Decimal, quantity: Decimal) -> Decimal {
        match self.side {
            PositionSide::Long => (price - self.entry_price) * quantity,
            PositionSide::Short => (self.entry_price - price) * quantity,
        }
    }
}

/// Point-in-time view of the whole portfolio, published to cache on a cadence.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub total_equity: Decimal,
    pub available_balance: Decimal,
    pub total_unrealized_pnl: Decimal,
    pub total_realized_pnl: Decimal,
    /// Percentage distance from the running peak equity.
    pub drawdown_percent: Decimal,
    pub positions: Vec<Position>,
    pub time: DateTime<Utc>,
}

impl PortfolioSnapshot {
    pub fn flat(equity: Decimal) -> Self {
        Self {
            total_equity: equity,
            available_balance: equity,
            total_unrealized_pnl: Decimal::ZERO,
            total_realized_pnl: Decimal::ZERO,
            drawdown_percent: Decimal::ZERO,
            positions: Vec::new(),
            time: Utc::now(),
        }
    }

    pub fn open_position_count(&self) -> usize {
        self.positions.len()
    }
}
