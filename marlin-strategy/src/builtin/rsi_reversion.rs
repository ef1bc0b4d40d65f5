use crate::strategy::Strategy;
use chrono::{DateTime, Utc};
use fnv::FnvHashMap;
use marlin_core::{Candle, MarketTick, SignalAction, Symbol, TradeSignal};
use marlin_ta::{Indicator, RelativeStrengthIndex};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Mean reversion on RSI extremes: oversold endorses a buy, overbought a
/// sell. The oscillator is rebuilt from the candle window on every closed
/// candle.
#[derive(Debug)]
pub struct RsiReversion {
    period: usize,
    oversold: Decimal,
    overbought: Decimal,
    enabled: bool,
    confidence: Decimal,
    stop_pct: Decimal,
    target_pct: Decimal,
    last_evaluated: FnvHashMap<Symbol, DateTime<Utc>>,
}

impl RsiReversion {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            oversold: Decimal::from(30),
            overbought: Decimal::from(70),
            enabled: true,
            confidence: Decimal::new(55, 2),
            stop_pct: Decimal::new(15, 3),
            target_pct: Decimal::new(3, 2),
            last_evaluated: FnvHashMap::default(),
        }
    }

    pub fn with_bands(mut self, oversold: Decimal, overbought: Decimal) -> Self {
        self.oversold = oversold;
        self.overbought = overbought;
        self
    }

    fn rsi_over(&self, candles: &[Candle]) -> Option<Decimal> {
        let mut rsi = RelativeStrengthIndex::new(self.period);
        let mut latest = None;
        for candle in candles {
            latest = rsi.update(candle.close);
        }
        latest
    }
}

impl Strategy for RsiReversion {
    fn name(&self) -> &'static str {
        "rsi-reversion"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn evaluate(&mut self, tick: &MarketTick, candles: &[Candle]) -> Option<TradeSignal> {
        let latest = candles.last()?;
        if self.last_evaluated.get(&tick.symbol) == Some(&latest.close_time) {
            return None;
        }
        self.last_evaluated
            .insert(tick.symbol.clone(), latest.close_time);

        let rsi = self.rsi_over(candles)?;
        let action = if rsi <= self.oversold {
            SignalAction::Buy
        } else if rsi >= self.overbought {
            SignalAction::Sell
        } else {
            return None;
        };

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
