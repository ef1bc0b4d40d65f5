use crate::{
    error::DataError,
    provider::{MarketDataProvider, websocket::WebSocketProvider},
};
use chrono::Utc;
use marlin_bus::{Cache, EventBus, SharedBus, SharedCache, keys};
use marlin_core::{
    EventEnvelope, HealthStatus, MarketTick, MarlinEvent, Symbol, SystemHealthEvent,
};
use marlin_integration::CircuitBreaker;
use std::{sync::Arc, time::Duration};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const SOURCE: &str = "ingestion";
const PROBE_POLL: Duration = Duration::from_secs(1);
const RESTART_DELAY: Duration = Duration::from_secs(1);

/// Fallback wiring used while the WebSocket circuit is open.
pub struct FallbackPlan {
    pub provider: Arc<dyn MarketDataProvider>,
    pub websocket: Arc<WebSocketProvider>,
    pub circuit: Arc<CircuitBreaker>,
}

impl std::fmt::Debug for FallbackPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackPlan")
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// The ingestion service: runs the active provider, publishes every tick on
/// `market.tick`, keeps the latest price/tick cache keys fresh, and fans the
/// tick out on the `market:ticks` channel for the gateway.
pub struct IngestionService {
    bus: SharedBus,
    cache: SharedCache,
    symbols: Vec<Symbol>,
    primary: Arc<dyn MarketDataProvider>,
    fallback: Option<FallbackPlan>,
}

impl std::fmt::Debug for IngestionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionService")
            .field("symbols", &self.symbols)
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl IngestionService {
    pub fn new(
        bus: SharedBus,
        cache: SharedCache,
        symbols: Vec<Symbol>,
        primary: Arc<dyn MarketDataProvider>,
        fallback: Option<FallbackPlan>,
    ) -> Self {
        Self {
            bus,
            cache,
            symbols,
            primary,
            fallback,
        }
    }

    /// Run until shutdown. Provider failures rotate through reconnect and,
    /// when the circuit opens, the REST fallback; the tick pipeline itself
    /// never stops while the service is alive.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        let consumer = tokio::spawn(consume_ticks(
            self.bus.clone(),
            self.cache.clone(),
            tick_rx,
            shutdown.clone(),
        ));

        self.supervise_providers(tick_tx, shutdown).await;
        let _ = consumer.await;
    }

    async fn supervise_providers(
        &self,
        tick_tx: mpsc::UnboundedSender<MarketTick>,
        shutdown: watch::Receiver<bool>,
    ) {
        loop {
            if *shutdown.borrow() {
                return;
            }

            let outcome = self
                .primary
                .run(&self.symbols, tick_tx.clone(), shutdown.clone())
                .await;

            match outcome {
                Ok(()) => return,
                Err(DataError::ConsumerClosed) => return,
                Err(DataError::CircuitOpen) => {
                    let Some(plan) = &self.fallback else {
                        error!("market data circuit open with no fallback configured");
                        return;
                    };

                    self.publish_health(
                        HealthStatus::Degraded,
                        "websocket circuit open, polling fallback active",
                    );
                    info!(fallback = plan.provider.name(), "failing over to polling provider");

                    tokio::select! {
                        result = plan.provider.run(&self.symbols, tick_tx.clone(), shutdown.clone()) => {
                            match result {
                                Err(DataError::ConsumerClosed) => return,
                                _ => {
                                    if *shutdown.borrow() {
                                        return;
                                    }
                                }
                            }
                        }
                        _ = probe_until_recovered(plan, &self.symbols) => {
                            self.publish_health(
                                HealthStatus::Healthy,
                                "websocket circuit closed, streaming restored",
                            );
                        }
                    }
                }
                Err(error) => {
                    warn!(%error, provider = self.primary.name(), "provider failed, restarting");
                    tokio::time::sleep(RESTART_DELAY).await;
                }
            }
        }
    }

    fn publish_health(&self, status: HealthStatus, detail: &str) {
        let event = MarlinEvent::SystemHealth(SystemHealthEvent {
            component: Symbol::new("market-data"),
            status,
            detail: detail.to_string(),
            time: Utc::now(),
        });
        if let Err(error) = self.bus.publish(EventEnvelope::new(
            event,
            Uuid::new_v4().to_string(),
            SOURCE,
        )) {
            warn!(%error, "failed to publish ingestion health event");
        }
    }
}

/// Probe the WebSocket endpoint on the circuit's cooldown cadence; returns
/// once a probe succeeds and the circuit closes.
async fn probe_until_recovered(plan: &FallbackPlan, symbols: &[Symbol]) {
    loop {
        tokio::time::sleep(PROBE_POLL).await;
        if !plan.circuit.probe_allowed() {
            continue;
        }

        match plan.websocket.probe(symbols).await {
            Ok(()) => {
                plan.circuit.record_success();
                return;
            }
            Err(error) => {
                debug!(%error, "websocket probe failed");
                plan.circuit.record_failure();
            }
        }
    }
}

/// Drain ticks from the active provider into the bus, cache and fan-out
/// channel. Individual write failures are logged and skipped so one slow or
/// broken sink never stalls the stream.
async fn consume_ticks(
    bus: SharedBus,
    cache: SharedCache,
    mut tick_rx: mpsc::UnboundedReceiver<MarketTick>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
            tick = tick_rx.recv() => {
                let Some(tick) = tick else { return };
                handle_tick(&bus, &cache, tick).await;
            }
        }
    }
}

async fn handle_tick(bus: &SharedBus, cache: &SharedCache, tick: MarketTick) {
    let symbol = tick.symbol.clone();

    let tick_json = match serde_json::to_string(&tick) {
        Ok(json) => json,
        Err(error) => {
            error!(%symbol, %error, "unserialisable tick dropped");
            return;
        }
    };

    let envelope = EventEnvelope::new(
        MarlinEvent::MarketTick(tick.clone()),
        Uuid::new_v4().to_string(),
        SOURCE,
    );
    if let Err(error) = bus.publish(envelope) {
        warn!(%symbol, %error, "tick publish failed");
    }

    let price = format!("{:.8}", tick.price);
    if let Err(error) = cache
        .set(&keys::price_latest(&symbol), price, Some(keys::PRICE_TTL))
        .await
    {
        warn!(%symbol, %error, "latest price cache write failed");
    }

    if let Err(error) = cache
        .set(&keys::tick_latest(&symbol), tick_json.clone(), Some(keys::PRICE_TTL))
        .await
    {
        warn!(%symbol, %error, "latest tick cache write failed");
    }

    if let Err(error) = cache.publish(keys::CHANNEL_MARKET_TICKS, tick_json).await {
        warn!(%symbol, %error, "tick fan-out publish failed");
    }
}
