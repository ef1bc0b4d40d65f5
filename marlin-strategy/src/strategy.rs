use marlin_core::{Candle, MarketTick, TradeSignal};

/// A strategy plug-in.
///
/// Evaluation is synchronous and deterministic given the tick and candle
/// window: plug-ins may keep private indicator state, but they receive the
/// full retained window on every call so state can be rebuilt after a
/// restart without changing the emitted signals.
pub trait Strategy: Send {
    fn name(&self) -> &'static str;

    fn enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Inspect the latest tick against the symbol's closed-candle window and
    /// optionally emit a signal.
    fn evaluate(&mut self, tick: &MarketTick, candles: &[Candle]) -> Option<TradeSignal>;
}
