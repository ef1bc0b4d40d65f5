use crate::{
    aggregator::CandleAggregator, confluence::apply_confluence, history::CandleHistory,
    registry::StrategyRegistry,
};
use marlin_bus::{EventBus, SharedBus};
use marlin_core::{EventEnvelope, MarketTick, MarlinEvent, Topic};
use marlin_integration::DropOldestBuffer;
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SOURCE: &str = "strategy";
const RETRY_QUEUE_CAPACITY: usize = 100;
const RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// The strategy engine service.
///
/// Consumes `market.tick`, maintains candles and per-symbol history, runs
/// the strategy pool, applies confluence scoring, and publishes surviving
/// signals. When the bus is unhealthy, outbound events queue in a bounded
/// drop-oldest buffer that a background cadence drains once the bus heals.
pub struct StrategyEngine {
    bus: SharedBus,
    aggregator: CandleAggregator,
    history: CandleHistory,
    registry: StrategyRegistry,
    min_confidence: Decimal,
    retry_queue: DropOldestBuffer<EventEnvelope>,
}

impl std::fmt::Debug for StrategyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyEngine")
            .field("interval", &self.aggregator.interval())
            .field("min_confidence", &self.min_confidence)
            .finish()
    }
}

impl StrategyEngine {
    pub fn new(
        bus: SharedBus,
        aggregator: CandleAggregator,
        registry: StrategyRegistry,
        min_confidence: Decimal,
    ) -> Self {
        Self {
            bus,
            aggregator,
            history: CandleHistory::default(),
            registry,
            min_confidence,
            retry_queue: DropOldestBuffer::new(RETRY_QUEUE_CAPACITY),
        }
    }

    /// Run until shutdown.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticks = self.bus.subscribe(Topic::MarketTick);
        let mut retry_cadence = tokio::time::interval(RETRY_INTERVAL);
        info!(strategies = ?self.registry.names(), "strategy engine started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
                _ = retry_cadence.tick() => self.drain_retry_queue(),
                event = ticks.recv() => {
                    let Some(event) = event else { return };
                    if let MarlinEvent::MarketTick(tick) = &event.payload {
                        self.on_tick(tick);
                    }
                }
            }
        }
    }

    /// One tick through the whole engine: candle aggregation, strategy
    /// evaluation, confluence scoring, confidence filtering, publication.
    pub fn on_tick(&mut self, tick: &MarketTick) {
        if let Some(candle) = self.aggregator.update(tick) {
            debug!(symbol = %candle.symbol, close = %candle.close, "candle closed");
            self.publish_or_queue(EventEnvelope::new(
                MarlinEvent::CandleClosed(candle.clone()),
                Uuid::new_v4().to_string(),
                SOURCE,
            ));
            self.history.push(candle);
        }

        let window = self.history.window(&tick.symbol);
        let mut signals = self.registry.evaluate_all(tick, window);
        if signals.is_empty() {
            return;
        }

        apply_confluence(&mut signals);
        let minimum = self.min_confidence;
        signals.retain(|signal| signal.confidence >= minimum);

        for signal in signals {
            info!(
                symbol = %signal.symbol,
                strategy = %signal.strategy,
                action = ?signal.action,
                confidence = %signal.confidence,
                "signal generated"
            );
            let correlation_id = signal.correlation_id.to_string();
            self.publish_or_queue(EventEnvelope::new(
                MarlinEvent::TradeSignal(signal),
                correlation_id,
                SOURCE,
            ));
        }
    }

    fn publish_or_queue(&mut self, envelope: EventEnvelope) {
        if !self.bus.is_healthy() {
            self.queue_for_retry(envelope);
            return;
        }

        if let Err(error) = self.bus.publish(envelope.clone()) {
            warn!(%error, "publish failed, queueing for retry");
            self.queue_for_retry(envelope);
        }
    }

    fn queue_for_retry(&mut self, envelope: EventEnvelope) {
        if self.retry_queue.push(envelope).is_some() {
            warn!("retry queue full, oldest event dropped");
        }
    }

    /// Flush queued events while the bus is healthy, stopping at the first
    /// failure so ordering is preserved.
    fn drain_retry_queue(&mut self) {
        while self.bus.is_healthy() {
            let Some(envelope) = self.retry_queue.pop() else {
                return;
            };
            if let Err(error) = self.bus.publish(envelope.clone()) {
                warn!(%error, "retry publish failed, keeping event queued");
                self.retry_queue.push_front(envelope);
                return;
            }
        }
    }

    /// Queued event count, exposed for health reporting.
    pub fn backlog(&self) -> usize {
        self.retry_queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::ma_crossover::MaCrossover;
    use chrono::{DateTime, Utc};
    use marlin_bus::{EventBus, InMemoryBus};
    use marlin_core::{CandleInterval, SignalAction, Symbol};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn tick(secs: i64, price: Decimal) -> MarketTick {
        MarketTick::new(
            Symbol::new("BTCUSDT"),
            price,
            dec!(1),
            price,
            price,
            DateTime::<Utc>::from_timestamp(secs, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_golden_cross_travels_from_ticks_to_signal_topic() {
        let bus = Arc::new(InMemoryBus::new());
        let mut candles = bus.subscribe(Topic::CandleClosed);
        let mut signals = bus.subscribe(Topic::StrategySignal);

        let registry = StrategyRegistry::new(vec![Box::new(MaCrossover::new(5, 10))]);
        let mut engine = StrategyEngine::new(
            bus.clone(),
            CandleAggregator::new(CandleInterval::hours(1)),
            registry,
            dec!(0.7),
        );

        let closes = [
            100, 98, 96, 94, 92, 90, 88, 86, 84, 82, 84, 86, 88, 92, 98,
        ];
        // One tick per hourly window, plus one more to close the final candle.
        for (hour, close) in closes.iter().enumerate() {
            engine.on_tick(&tick(hour as i64 * 3600, Decimal::from(*close)));
        }
        engine.on_tick(&tick(15 * 3600, dec!(98)));

        let mut closed = 0;
        while candles.try_recv().is_some() {
            closed += 1;
        }
        assert_eq!(closed, 15);

        let event = signals.recv().await.expect("one signal published");
        match &event.payload {
            MarlinEvent::TradeSignal(signal) => {
                assert_eq!(signal.action, SignalAction::Buy);
                assert_eq!(signal.symbol.as_str(), "BTCUSDT");
                // Confluence boost of a lone signal: 0.6 + 0.3.
                assert_eq!(signal.confidence, dec!(0.9));
                assert_eq!(event.correlation_id, signal.correlation_id.to_string());
            }
            other => panic!("unexpected payload: {other:?}"),
        }
        assert!(signals.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_low_confidence_signals_dropped() {
        let bus = Arc::new(InMemoryBus::new());
        let mut signals = bus.subscribe(Topic::StrategySignal);

        let registry = StrategyRegistry::new(vec![Box::new(MaCrossover::new(5, 10))]);
        let mut engine = StrategyEngine::new(
            bus.clone(),
            CandleAggregator::new(CandleInterval::hours(1)),
            registry,
            // Floor above the boosted confidence of a lone crossover signal.
            dec!(0.95),
        );

        let closes = [
            100, 98, 96, 94, 92, 90, 88, 86, 84, 82, 84, 86, 88, 92, 98,
        ];
        for (hour, close) in closes.iter().enumerate() {
            engine.on_tick(&tick(hour as i64 * 3600, Decimal::from(*close)));
        }
        engine.on_tick(&tick(15 * 3600, dec!(98)));

        assert!(signals.try_recv().is_none());
    }
}
