use fnv::FnvHashMap;
use marlin_core::{Candle, CandleInterval, MarketTick, Symbol};
use tracing::warn;

/// The open candle for one `(symbol, window)` pair.
#[derive(Debug, Clone)]
struct CandleBuilder {
    symbol: Symbol,
    open_time: chrono::DateTime<chrono::Utc>,
    open: rust_decimal::Decimal,
    high: rust_decimal::Decimal,
    low: rust_decimal::Decimal,
    close: rust_decimal::Decimal,
    volume: rust_decimal::Decimal,
}

impl CandleBuilder {
    fn start(tick: &MarketTick, interval: CandleInterval) -> Self {
        Self {
            symbol: tick.symbol.clone(),
            open_time: interval.align(tick.time),
            open: tick.price,
            high: tick.price,
            low: tick.price,
            close: tick.price,
            volume: tick.volume,
        }
    }

    fn absorb(&mut self, tick: &MarketTick) {
        self.high = self.high.max(tick.price);
        self.low = self.low.min(tick.price);
        self.close = tick.price;
        self.volume += tick.volume;
    }

    fn finish(self, interval: CandleInterval) -> Candle {
        Candle {
            symbol: self.symbol,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            open_time: self.open_time,
            close_time: self.open_time + chrono::Duration::seconds(interval.as_secs() as i64),
            interval,
        }
    }
}

/// Aggregates ticks into OHLCV candles, one open builder per symbol.
///
/// A tick belonging to a later window than the open builder closes that
/// builder, emits the candle, and seeds the next builder with the tick.
/// Ticks older than the open window are dropped.
#[derive(Debug)]
pub struct CandleAggregator {
    interval: CandleInterval,
    builders: FnvHashMap<Symbol, CandleBuilder>,
}

impl CandleAggregator {
    pub fn new(interval: CandleInterval) -> Self {
        Self {
            interval,
            builders: FnvHashMap::default(),
        }
    }

    pub fn interval(&self) -> CandleInterval {
        self.interval
    }

    /// Fold one tick in; returns the candle closed by this tick, if any.
    pub fn update(&mut self, tick: &MarketTick) -> Option<Candle> {
        let window = self.interval.align(tick.time);

        match self.builders.get_mut(&tick.symbol) {
            None => {
                self.builders
                    .insert(tick.symbol.clone(), CandleBuilder::start(tick, self.interval));
                None
            }
            Some(builder) if window == builder.open_time => {
                builder.absorb(tick);
                None
            }
            Some(builder) if window > builder.open_time => {
                let closed = std::mem::replace(builder, CandleBuilder::start(tick, self.interval));
                Some(closed.finish(self.interval))
            }
            Some(builder) => {
                warn!(
                    symbol = %tick.symbol,
                    tick_time = %tick.time,
                    open_time = %builder.open_time,
                    "out-of-order tick dropped"
                );
                None
            }
        }
    }

    /// Flush the open candle for a symbol without waiting for the next window.
    pub fn flush(&mut self, symbol: &Symbol) -> Option<Candle> {
        self.builders
            .remove(symbol)
            .map(|builder| builder.finish(self.interval))
    }
}
