use crate::strategy::Strategy;
use chrono::{DateTime, Utc};
use fnv::FnvHashMap;
use marlin_core::{Candle, MarketTick, SignalAction, Symbol, TradeSignal};
use marlin_ta::{Indicator, SimpleMovingAverage};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Moving-average crossover.
///
/// A golden cross (fast SMA closing above the slow SMA) endorses a buy, a
/// death cross a sell. Both averages are recomputed from the candle window
/// on each closed candle, so a restarted engine resumes identically.
#[derive(Debug)]
pub struct MaCrossover {
    fast_period: usize,
    slow_period: usize,
    enabled: bool,
    confidence: Decimal,
    stop_pct: Decimal,
    target_pct: Decimal,
    last_evaluated: FnvHashMap<Symbol, DateTime<Utc>>,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            enabled: true,
            confidence: Decimal::new(6, 1),
            stop_pct: Decimal::new(2, 2),
            target_pct: Decimal::new(4, 2),
            last_evaluated: FnvHashMap::default(),
        }
    }

    fn sma_over(closes: &[Decimal], period: usize) -> Option<Decimal> {
        if closes.len() < period {
            return None;
        }
        let mut sma = SimpleMovingAverage::new(period);
        let mut latest = None;
        for close in &closes[closes.len() - period..] {
            latest = sma.update(*close);
        }
        latest
    }

    fn detect_cross(&self, closes: &[Decimal]) -> Option<SignalAction> {
        if closes.len() < self.slow_period + 1 {
            return None;
        }

        let previous = &closes[..closes.len() - 1];
        let fast_now = Self::sma_over(closes, self.fast_period)?;
        let slow_now = Self::sma_over(closes, self.slow_period)?;
        let fast_before = Self::sma_over(previous, self.fast_period)?;
        let slow_before = Self::sma_over(previous, self.slow_period)?;

        if fast_before <= slow_before && fast_now > slow_now {
            Some(SignalAction::Buy)
        } else if fast_before >= slow_before && fast_now < slow_now {
            Some(SignalAction::Sell)
        } else {
            None
        }
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &'static str {
        "ma-crossover"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn evaluate(&mut self, tick: &MarketTick, candles: &[Candle]) -> Option<TradeSignal> {
        let latest = candles.last()?;

        // One evaluation per closed candle per symbol.
        if self.last_evaluated.get(&tick.symbol) == Some(&latest.close_time) {
            return None;
        }
        self.last_evaluated
            .insert(tick.symbol.clone(), latest.close_time);

        let closes: Vec<Decimal> = candles.iter().map(|candle| candle.close).collect();
        let action = self.detect_cross(&closes)?;

        let price = tick.price;
        let (stop_loss, take_profit) = match action {
            SignalAction::Buy => (
                price * (Decimal::ONE - self.stop_pct),
                price * (Decimal::ONE + self.target_pct),
            ),
            _ => (
                price * (Decimal::ONE + self.stop_pct),
                price * (Decimal::ONE - self.target_pct),
            ),
        };

        Some(TradeSignal {
            symbol: tick.symbol.clone(),
            action,
            price,
            stop_loss: Some(stop_loss),
            take_profit: Some(take_profit),
            strategy: Symbol::new(self.name()),
            confidence: self.confidence,
            correlation_id: Uuid::new_v4(),
            time: tick.time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marlin_core::CandleInterval;
    use rust_decimal_macros::dec;

    fn candles(closes: &[i64]) -> Vec<Candle> {
        let interval = CandleInterval::hours(1);
        closes
            .iter()
            .enumerate()
            .map(|(index, close)| {
                let open_time =
                    DateTime::<Utc>::from_timestamp(index as i64 * 3600, 0).unwrap();
                let close = Decimal::from(*close);
                Candle {
                    symbol: Symbol::new("BTCUSDT"),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: dec!(1),
                    open_time,
                    close_time: open_time + chrono::Duration::hours(1),
                    interval,
                }
            })
            .collect()
    }

    fn tick_at(price: Decimal, secs: i64) -> MarketTick {
        MarketTick::new(
            Symbol::new("BTCUSDT"),
            price,
            dec!(1),
            price,
            price,
            DateTime::<Utc>::from_timestamp(secs, 0).unwrap(),
        )
    }

    const SELLOFF_THEN_RECOVERY: [i64; 15] =
        [100, 98, 96, 94, 92, 90, 88, 86, 84, 82, 84, 86, 88, 92, 98];

    #[test]
    fn test_golden_cross_fires_once_after_recovery() {
        let mut strategy = MaCrossover::new(5, 10);
        let mut signals = Vec::new();

        for closed in 1..=SELLOFF_THEN_RECOVERY.len() {
            let window = candles(&SELLOFF_THEN_RECOVERY[..closed]);
            let last_close = window.last().unwrap().close;
            let tick = tick_at(last_close, closed as i64 * 3600);
            if let Some(signal) = strategy.evaluate(&tick, &window) {
                signals.push(signal);
            }
        }

        assert_eq!(signals.len(), 1);
        let signal = &signals[0];
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.symbol.as_str(), "BTCUSDT");
        assert_eq!(signal.confidence, dec!(0.6));
        assert!(signal.stop_loss.unwrap() < signal.price);
        assert!(signal.take_profit.unwrap() > signal.price);
    }

    #[test]
    fn test_same_candle_not_evaluated_twice() {
        let mut strategy = MaCrossover::new(5, 10);
        let window = candles(&SELLOFF_THEN_RECOVERY);
        let tick = tick_at(dec!(98), 15 * 3600);

        assert!(strategy.evaluate(&tick, &window).is_some());
        assert!(strategy.evaluate(&tick, &window).is_none());
    }

    #[test]
    fn test_death_cross_endorses_sell() {
        let mut strategy = MaCrossover::new(2, 4);
        let closes = [100, 101, 102, 103, 104, 90, 70];
        let mut actions = Vec::new();

        for closed in 1..=closes.len() {
            let window = candles(&closes[..closed]);
            let tick = tick_at(window.last().unwrap().close, closed as i64 * 3600);
            if let Some(signal) = strategy.evaluate(&tick, &window) {
                actions.push(signal.action);
            }
        }

        assert_eq!(actions, vec![SignalAction::Sell]);
    }

    #[test]
    fn test_short_window_is_silent() {
        let mut strategy = MaCrossover::new(5, 10);
        let window = candles(&[100, 101, 102]);
        let tick = tick_at(dec!(102), 3 * 3600);
        assert!(strategy.evaluate(&tick, &window).is_none());
    }
}
