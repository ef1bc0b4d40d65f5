use crate::drawdown::DrawdownMonitor;
use chrono::NaiveDate;
use marlin_core::{PortfolioSnapshot, RiskLimits};
use rust_decimal::Decimal;

/// Why the kill switch tripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripReason {
    DrawdownBreached { drawdown_percent: Decimal },
    DailyLossBreached { loss: Decimal },
    ConsecutiveLosses { count: u32 },
}

impl TripReason {
    pub fn reason(&self) -> String {
        match self {
            Self::DrawdownBreached { drawdown_percent } => {
                format!("Max drawdown breached: {drawdown_percent:.2}%")
            }
            Self::DailyLossBreached { loss } => {
                format!("Max daily loss breached: {loss:.2}")
            }
            Self::ConsecutiveLosses { count } => {
                format!("{count} consecutive losing snapshots")
            }
        }
    }
}

const CONSECUTIVE_LOSS_LIMIT: u32 = 3;

/// Watches periodic portfolio snapshots for kill-switch conditions:
/// drawdown from peak equity, daily realised loss, and a run of losing
/// snapshot reads.
#[derive(Debug, Default)]
pub struct EquityMonitor {
    drawdown: DrawdownMonitor,
    day: Option<NaiveDate>,
    day_open_realized: Decimal,
    consecutive_losses: u32,
}

impl EquityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest drawdown percentage, for event payloads.
    pub fn drawdown_percent(&self) -> Decimal {
        self.drawdown.drawdown_percent()
    }

    /// Fold in one snapshot read; returns the first trip condition hit.
    pub fn observe(
        &mut self,
        snapshot: &PortfolioSnapshot,
        limits: &RiskLimits,
    ) -> Option<TripReason> {
        let drawdown_percent = self.drawdown.update(snapshot.total_equity);

        // Day rollover re-anchors the realised-loss baseline.
        let date = snapshot.time.date_naive();
        if self.day != Some(date) {
            self.day = Some(date);
            self.day_open_realized = snapshot.total_realized_pnl;
        }

        // A snapshot showing negative realised PnL counts as losing; three
        // in a row trips. Any non-losing read clears the run.
        if snapshot.total_realized_pnl < Decimal::ZERO {
            self.consecutive_losses += 1;
        } else {
            self.consecutive_losses = 0;
        }

        if drawdown_percent >= limits.max_drawdown_percent {
            return Some(TripReason::DrawdownBreached { drawdown_percent });
        }

        let daily_loss = self.day_open_realized - snapshot.total_realized_pnl;
        let daily_limit = limits.max_daily_loss / Decimal::ONE_HUNDRED * snapshot.total_equity;
        if daily_loss > Decimal::ZERO && daily_limit > Decimal::ZERO && daily_loss >= daily_limit {
            return Some(TripReason::DailyLossBreached { loss: daily_loss });
        }

        if self.consecutive_losses >= CONSECUTIVE_LOSS_LIMIT {
            return Some(TripReason::ConsecutiveLosses {
                count: self.consecutive_losses,
            });
        }

        None
    }

    /// Manual kill-switch reset: clears peak tracking and the loss run.
    pub fn reset(&mut self) {
        self.drawdown.reset();
        self.consecutive_losses = 0;
        self.day = None;
        self.day_open_realized = Decimal::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn snapshot(equity: Decimal, realized: Decimal) -> PortfolioSnapshot {
        PortfolioSnapshot {
            total_equity: equity,
            available_balance: equity,
            total_unrealized_pnl: Decimal::ZERO,
            total_realized_pnl: realized,
            drawdown_percent: Decimal::ZERO,
            positions: Vec::new(),
            time: Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_drawdown_trip_at_six_percent() {
        let limits = RiskLimits {
            max_drawdown_percent: dec!(5),
            ..RiskLimits::default()
        };
        let mut monitor = EquityMonitor::new();

        assert_eq!(monitor.observe(&snapshot(dec!(10000), dec!(0)), &limits), None);
        let trip = monitor
            .observe(&snapshot(dec!(9400), dec!(0)), &limits)
            .unwrap();
        assert_eq!(trip, TripReason::DrawdownBreached { drawdown_percent: dec!(6) });
    }

    #[test]
    fn test_three_consecutive_losing_snapshots() {
        let limits = RiskLimits {
            // Wide limits so only the loss-run condition can fire.
            max_drawdown_percent: dec!(90),
            max_daily_loss: dec!(90),
            ..RiskLimits::default()
        };
        let mut monitor = EquityMonitor::new();

        assert_eq!(monitor.observe(&snapshot(dec!(10000), dec!(-10)), &limits), None);
        assert_eq!(monitor.observe(&snapshot(dec!(10000), dec!(-12)), &limits), None);
        let trip = monitor
            .observe(&snapshot(dec!(10000), dec!(-15)), &limits)
            .unwrap();
        assert_eq!(trip, TripReason::ConsecutiveLosses { count: 3 });
    }

    #[test]
    fn test_profitable_read_clears_the_loss_run() {
        let limits = RiskLimits {
            max_drawdown_percent: dec!(90),
            max_daily_loss: dec!(90),
            ..RiskLimits::default()
        };
        let mut monitor = EquityMonitor::new();

        monitor.observe(&snapshot(dec!(10000), dec!(-10)), &limits);
        monitor.observe(&snapshot(dec!(10000), dec!(-12)), &limits);
        monitor.observe(&snapshot(dec!(10000), dec!(5)), &limits);
        assert_eq!(monitor.observe(&snapshot(dec!(10000), dec!(-1)), &limits), None);
    }

    #[test]
    fn test_daily_loss_trip() {
        let limits = RiskLimits {
            max_drawdown_percent: dec!(90),
            max_daily_loss: dec!(5),
            ..RiskLimits::default()
        };
        let mut monitor = EquityMonitor::new();

        // Baseline anchors at +600 realised; dropping to 0 is a 600 loss,
        // above 5% of 10_000.
        assert_eq!(monitor.observe(&snapshot(dec!(10000), dec!(600)), &limits), None);
        let trip = monitor
            .observe(&snapshot(dec!(10000), dec!(0)), &limits)
            .unwrap();
        assert_eq!(trip, TripReason::DailyLossBreached { loss: dec!(600) });
    }

    #[test]
    fn test_reset_clears_everything() {
        let limits = RiskLimits {
            max_drawdown_percent: dec!(5),
            ..RiskLimits::default()
        };
        let mut monitor = EquityMonitor::new();
        monitor.observe(&snapshot(dec!(10000), dec!(-1)), &limits);
        monitor.observe(&snapshot(dec!(9400), dec!(-2)), &limits);

        monitor.reset();
        // Old peak forgotten: 9_000 seeds a fresh peak with zero drawdown.
        assert_eq!(monitor.observe(&snapshot(dec!(9000), dec!(0)), &limits), None);
        assert_eq!(monitor.drawdown_percent(), Decimal::ZERO);
    }
}
