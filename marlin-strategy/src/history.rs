use fnv::FnvHashMap;
use marlin_core::{Candle, Symbol};

/// Default number of closed candles retained per symbol.
pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded per-symbol history of closed candles, oldest evicted first.
#[derive(Debug)]
pub struct CandleHistory {
    capacity: usize,
    candles: FnvHashMap<Symbol, Vec<Candle>>,
}

impl Default for CandleHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CandleHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            candles: FnvHashMap::default(),
        }
    }

    pub fn push(&mut self, candle: Candle) {
        let window = self.candles.entry(candle.symbol.clone()).or_default();
        if window.len() == self.capacity {
            window.remove(0);
        }
        window.push(candle);
    }

    /// The retained window for a symbol, oldest first. Empty if none closed yet.
    pub fn window(&self, symbol: &Symbol) -> &[Candle] {
        self.candles
            .get(symbol)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self, symbol: &Symbol) -> usize {
        self.window(symbol).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use marlin_core::CandleInterval;
    use rust_decimal_macros::dec;

    fn candle(index: i64) -> Candle {
        let interval = CandleInterval::minutes(1);
        let open_time = DateTime::<Utc>::from_timestamp(index * 60, 0).unwrap();
        Candle {
            symbol: Symbol::new("BTCUSDT"),
            open: dec!(100),
            high: dec!(101),
            low: dec!(99),
            close: dec!(100) + rust_decimal::Decimal::from(index),
            volume: dec!(1),
            open_time,
            close_time: open_time + chrono::Duration::minutes(1),
            interval,
        }
    }

    #[test]
    fn test_oldest_candle_evicted_at_capacity() {
        let mut history = CandleHistory::new(3);
        for index in 0..5 {
            history.push(candle(index));
        }

        let window = history.window(&Symbol::new("BTCUSDT"));
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].close, dec!(102));
        assert_eq!(window[2].close, dec!(104));
    }

    #[test]
    fn test_unknown_symbol_is_empty() {
        let history = CandleHistory::default();
        assert!(history.window(&Symbol::new("ETHUSDT")).is_empty());
    }
}
