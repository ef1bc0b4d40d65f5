use crate::Symbol;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directional recommendation a strategy endorses for a symbol.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum SignalAction {
    Buy,
    Sell,
    CloseLong,
    CloseShort,
}

impl SignalAction {
    /// True for actions that open new exposure rather than flatten it.
    pub fn opens_position(&self) -> bool {
        matches!(self, Self::Buy | Self::Sell)
    }
}

/// Advisory produced by a strategy, pending risk validation.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSignal {
    pub symbol: Symbol,
    pub action: SignalAction,
    pub price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub strategy: Symbol,
    /// Confidence in [0, 1], raised by confluence with agreeing strategies.
    pub confidence: Decimal,
    pub correlation_id: Uuid,
    pub time: DateTime<Utc>,
}

impl TradeSignal {
    /// Reward distance divided by risk distance, when both exits are set.
    ///
    /// Returns `None` when either exit is absent or the stop distance is zero.
    pub fn risk_reward(&self) -> Option<Decimal> {
        let (stop, target) = (self.stop_loss?, self.take_profit?);
        let risk = (self.price - stop).abs();
        let reward = (target - self.price).abs();

        if risk.is_zero() {
            return None;
        }
        Some(reward / risk)
    }
}
