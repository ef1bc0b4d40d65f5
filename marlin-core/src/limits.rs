use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Portfolio-wide risk limits. Runtime-mutable; read on every signal.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskLimits {
    /// Maximum equity percentage put at risk by a single trade.
    pub max_risk_per_trade_percent: Decimal,
    /// Drawdown percentage from peak equity that trips the kill switch.
    pub max_drawdown_percent: Decimal,
    /// Minimum reward-to-risk ratio required when both exits are set.
    pub min_risk_reward_ratio: Decimal,
    pub max_open_positions: usize,
    /// Daily realised loss, as an equity percentage, that trips the kill switch.
    pub max_daily_loss: Decimal,
    pub kill_switch_enabled: bool,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_risk_per_trade_percent: Decimal::ONE,
            max_drawdown_percent: Decimal::from(10),
            min_risk_reward_ratio: Decimal::new(15, 1),
            max_open_positions: 5,
            max_daily_loss: Decimal::from(5),
            kill_switch_enabled: true,
        }
    }
}
