use crate::sizer::PositionSizer;
use marlin_core::{Order, PortfolioSnapshot, RiskLimits, Side, SignalAction, TradeSignal};
use rust_decimal::Decimal;

/// Why a signal did not become an order. A non-error outcome, surfaced to
/// operators as a `risk.alerts` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    KillSwitchActive,
    MaxOpenPositions { open: usize, limit: usize },
    RiskRewardTooLow { ratio: Decimal, minimum: Decimal },
    NoPositionToClose,
    ZeroQuantity,
}

impl Rejection {
    pub fn reason(&self) -> String {
        match self {
            Self::KillSwitchActive => "Kill switch active".to_string(),
            Self::MaxOpenPositions { open, limit } => {
                format!("Open position limit reached ({open}/{limit})")
            }
            Self::RiskRewardTooLow { ratio, minimum } => {
                format!("Risk/reward {ratio:.2} below minimum {minimum:.2}")
            }
            Self::NoPositionToClose => "No open position to close".to_string(),
            Self::ZeroQuantity => "Sized quantity is zero".to_string(),
        }
    }
}

/// The ordered validation pipeline applied to every signal.
#[derive(Debug, Clone, Default)]
pub struct SignalValidator {
    sizer: PositionSizer,
}

impl SignalValidator {
    pub fn new(sizer: PositionSizer) -> Self {
        Self { sizer }
    }

    /// Validate a signal against the limits and the current portfolio view,
    /// producing a market order on approval.
    pub fn validate(
        &self,
        signal: &TradeSignal,
        limits: &RiskLimits,
        kill_switch_active: bool,
        snapshot: &PortfolioSnapshot,
    ) -> Result<Order, Rejection> {
        if limits.kill_switch_enabled && kill_switch_active {
            return Err(Rejection::KillSwitchActive);
        }

        let open = snapshot.open_position_count();
        if signal.action.opens_position() && open >= limits.max_open_positions {
            return Err(Rejection::MaxOpenPositions {
                open,
                limit: limits.max_open_positions,
            });
        }

        // Only gate on risk/reward when the signal defines both exits.
        if let Some(ratio) = signal.risk_reward() {
            if ratio < limits.min_risk_reward_ratio {
                return Err(Rejection::RiskRewardTooLow {
                    ratio,
                    minimum: limits.min_risk_reward_ratio,
                });
            }
        }

        let (side, quantity) = match signal.action {
            SignalAction::Buy | SignalAction::Sell => {
                let side = match signal.action {
                    SignalAction::Buy => Side::Buy,
                    _ => Side::Sell,
                };
                let quantity = self.sizer.size(
                    snapshot.total_equity,
                    signal.price,
                    signal.stop_loss,
                    None,
                    limits.max_risk_per_trade_percent,
                );
                (side, quantity)
            }
            // Closes unwind the tracked position at its full size.
            SignalAction::CloseLong | SignalAction::CloseShort => {
                let position = snapshot
                    .positions
                    .iter()
                    .find(|position| position.symbol == signal.symbol)
                    .ok_or(Rejection::NoPositionToClose)?;
                let side = match signal.action {
                    SignalAction::CloseLong => Side::Sell,
                    _ => Side::Buy,
                };
                (side, position.quantity)
            }
        };

        if quantity.is_zero() {
            return Err(Rejection::ZeroQuantity);
        }

        Ok(Order::market(
            signal.symbol.clone(),
            side,
            quantity,
            signal.correlation_id,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use marlin_core::{OrderKind, OrderStatus, Position, PositionSide, Symbol};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn signal(action: SignalAction, stop: Option<Decimal>, target: Option<Decimal>) -> TradeSignal {
        TradeSignal {
            symbol: Symbol::new("BTCUSDT"),
            action,
            price: dec!(100),
            stop_loss: stop,
            take_profit: target,
            strategy: Symbol::new("test"),
            confidence: dec!(0.9),
            correlation_id: Uuid::new_v4(),
            time: Utc::now(),
        }
    }

    fn snapshot() -> PortfolioSnapshot {
        PortfolioSnapshot::flat(dec!(10000))
    }

    #[test]
    fn test_approved_buy_becomes_new_market_order() {
        let validator = SignalValidator::default();
        let signal = signal(SignalAction::Buy, Some(dec!(98)), Some(dec!(104)));

        let order = validator
            .validate(&signal, &RiskLimits::default(), false, &snapshot())
            .unwrap();

        assert_eq!(order.symbol, signal.symbol);
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.kind, OrderKind::Market);
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.quantity, dec!(50));
        assert_eq!(order.correlation_id, signal.correlation_id);
    }

    #[test]
    fn test_kill_switch_rejects_first() {
        let validator = SignalValidator::default();
        let signal = signal(SignalAction::Buy, Some(dec!(98)), Some(dec!(104)));

        let rejection = validator
            .validate(&signal, &RiskLimits::default(), true, &snapshot())
            .unwrap_err();
        assert_eq!(rejection, Rejection::KillSwitchActive);
        assert!(rejection.reason().contains("Kill switch"));
    }

    #[test]
    fn test_open_position_limit_only_blocks_openers() {
        let validator = SignalValidator::default();
        let limits = RiskLimits {
            max_open_positions: 1,
            ..RiskLimits::default()
        };
        let mut snapshot = snapshot();
        snapshot.positions.push(Position::open(
            Symbol::new("BTCUSDT"),
            PositionSide::Long,
            dec!(100),
            dec!(1),
        ));

        let opener = signal(SignalAction::Buy, Some(dec!(98)), Some(dec!(104)));
        assert!(matches!(
            validator.validate(&opener, &limits, false, &snapshot),
            Err(Rejection::MaxOpenPositions { open: 1, limit: 1 })
        ));

        let closer = signal(SignalAction::CloseLong, None, None);
        let order = validator.validate(&closer, &limits, false, &snapshot).unwrap();
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.quantity, dec!(1));
    }

    #[test]
    fn test_risk_reward_gate() {
        let validator = SignalValidator::default();
        // Reward 2 over risk 2: ratio 1.0, below the 1.5 default.
        let poor = signal(SignalAction::Buy, Some(dec!(98)), Some(dec!(102)));
        assert!(matches!(
            validator.validate(&poor, &RiskLimits::default(), false, &snapshot()),
            Err(Rejection::RiskRewardTooLow { .. })
        ));

        // The gate skips when either exit is absent.
        let no_target = signal(SignalAction::Buy, Some(dec!(98)), None);
        assert!(validator
            .validate(&no_target, &RiskLimits::default(), false, &snapshot())
            .is_ok());
    }

    #[test]
    fn test_close_without_position_rejected() {
        let validator = SignalValidator::default();
        let closer = signal(SignalAction::CloseShort, None, None);
        assert_eq!(
            validator
                .validate(&closer, &RiskLimits::default(), false, &snapshot())
                .unwrap_err(),
            Rejection::NoPositionToClose
        );
    }

    #[test]
    fn test_zero_stop_distance_rejected_as_zero_quantity() {
        let validator = SignalValidator::default();
        let degenerate = signal(SignalAction::Buy, Some(dec!(100)), None);
        assert_eq!(
            validator
                .validate(&degenerate, &RiskLimits::default(), false, &snapshot())
                .unwrap_err(),
            Rejection::ZeroQuantity
        );
    }
}
