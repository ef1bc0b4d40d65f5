use crate::strategy::Strategy;
use marlin_core::{Candle, MarketTick, TradeSignal};
use parking_lot::Mutex;
use std::{panic::AssertUnwindSafe, sync::Arc};
use tracing::{error, warn};

/// Shared pool of strategy plug-ins.
///
/// The engine evaluates through one handle while the operator surface
/// toggles strategies through another. A panicking plug-in is logged and
/// isolated; the remaining strategies still run for that tick.
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: Arc<Mutex<Vec<Box<dyn Strategy>>>>,
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}

impl StrategyRegistry {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            strategies: Arc::new(Mutex::new(strategies)),
        }
    }

    /// `(name, enabled)` for every registered strategy.
    pub fn names(&self) -> Vec<(&'static str, bool)> {
        self.strategies
            .lock()
            .iter()
            .map(|strategy| (strategy.name(), strategy.enabled()))
            .collect()
    }

    /// Toggle a strategy by name; false if no such strategy exists.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut strategies = self.strategies.lock();
        match strategies
            .iter_mut()
            .find(|strategy| strategy.name() == name)
        {
            Some(strategy) => {
                strategy.set_enabled(enabled);
                true
            }
            None => {
                warn!(strategy = name, "toggle requested for unknown strategy");
                false
            }
        }
    }

    /// Evaluate every enabled strategy against the tick and candle window.
    pub fn evaluate_all(&self, tick: &MarketTick, candles: &[Candle]) -> Vec<TradeSignal> {
        let mut strategies = self.strategies.lock();
        let mut signals = Vec::new();

        for strategy in strategies.iter_mut() {
            if !strategy.enabled() {
                continue;
            }
            let name = strategy.name();

            match std::panic::catch_unwind(AssertUnwindSafe(|| strategy.evaluate(tick, candles)))
            {
                Ok(Some(signal)) => signals.push(signal),
                Ok(None) => {}
                Err(_) => error!(strategy = name, "strategy panicked during evaluation"),
            }
        }

        signals
    }
}
