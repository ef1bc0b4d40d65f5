use crate::health::{self, HealthRegistry};
use marlin_bus::{
    BusError, Cache, CacheError, EventBus, InMemoryBus, InMemoryCache, RedisBus, RedisCache,
    SharedBus, SharedCache,
};
use marlin_core::{CandleInterval, CoreError, MarlinConfig, ModeProvider, Symbol, TradingMode};
use marlin_data::{
    FallbackPlan, IngestionService, MarketDataProvider, RestPollingProvider, SimulationProvider,
    WebSocketProvider,
};
use marlin_execution::{ExecutionService, LiveAdapter, PaperAdapter, RATE_LIMIT_CAPACITY};
use marlin_integration::{
    CircuitBreaker, EnvSecretProvider, LazyCredentials, RateLimiter, RestClient,
};
use marlin_risk::{RiskControl, RiskManager};
use marlin_strategy::{
    CandleAggregator, MaCrossover, RsiReversion, Strategy, StrategyEngine, StrategyRegistry,
};
use rust_decimal::Decimal;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info, warn};

const WS_CIRCUIT_THRESHOLD: u32 = 5;
const WS_CIRCUIT_COOLDOWN: Duration = Duration::from_secs(30);
const HEALTH_PROBE_CADENCE: Duration = Duration::from_secs(5);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Paper and simulation sessions start from a fixed bankroll.
const PAPER_STARTING_EQUITY: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

const TESTNET_REST: &str = "https://testnet.binance.vision";
const TESTNET_WS: &str = "wss://testnet.binance.vision/ws";

/// Fatal start-up failures; the process logs CRITICAL and exits non-zero.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("cannot read config {0}: {1}")]
    ConfigRead(String, std::io::Error),

    #[error("cannot parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    ConfigValue(#[from] CoreError),

    #[error("invalid health listen address: {0}")]
    ListenAddress(String),

    #[error("bus backend unavailable: {0}")]
    Bus(#[from] BusError),

    #[error("cache backend unavailable: {0}")]
    Cache(#[from] CacheError),
}

/// The assembled trading system.
pub struct MarlinSystem {
    config: MarlinConfig,
    symbols: Vec<Symbol>,
    bus: SharedBus,
    cache: SharedCache,
    mode: Arc<ModeProvider>,
    registry: StrategyRegistry,
    risk_control: RiskControl,
    health: HealthRegistry,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for MarlinSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarlinSystem")
            .field("symbols", &self.symbols)
            .field("mode", &self.mode.mode())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl MarlinSystem {
    /// Construct every component from configuration and spawn the services.
    pub fn build(config: MarlinConfig) -> Result<Self, SystemError> {
        let mode_label: TradingMode = config.trading_mode.mode.parse()?;
        let interval: CandleInterval = config.strategy.default_timeframe.parse()?;
        let symbols = config.symbols.normalized();

        let (bus, cache) = build_backends(&config)?;
        let mode = Arc::new(ModeProvider::new(mode_label));
        let health = HealthRegistry::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            mode = %mode_label,
            %interval,
            symbols = ?symbols,
            "assembling trading system"
        );

        let mut tasks = Vec::new();

        // Ingestion.
        let ingestion = build_ingestion(&config, mode_label, bus.clone(), cache.clone(), &symbols);
        tasks.push(tokio::spawn(ingestion.run(shutdown_rx.clone())));

        // Strategy engine.
        let registry = build_registry(&config);
        let engine = StrategyEngine::new(
            bus.clone(),
            CandleAggregator::new(interval),
            registry.clone(),
            config.strategy.min_confidence_score,
        );
        tasks.push(tokio::spawn(engine.run(shutdown_rx.clone())));

        // Risk manager.
        let risk = RiskManager::new(
            bus.clone(),
            cache.clone(),
            config.risk.clone(),
            PAPER_STARTING_EQUITY,
        );
        let risk_control = risk.control();
        tasks.push(tokio::spawn(risk.run(shutdown_rx.clone())));

        // Execution engine.
        let execution = build_execution(&config, mode_label, bus.clone(), cache.clone(), &mode);
        tasks.push(tokio::spawn(execution.run(shutdown_rx.clone())));

        // Health endpoints and the backend probe loop.
        let listen: SocketAddr = config
            .health
            .listen
            .parse()
            .map_err(|_| SystemError::ListenAddress(config.health.listen.clone()))?;
        let health_server = health::serve(listen, health.clone(), shutdown_rx.clone());
        tasks.push(tokio::spawn(async move {
            if let Err(serve_error) = health_server.await {
                error!(%serve_error, "health endpoint server failed");
            }
        }));
        tasks.push(tokio::spawn(probe_backends(
            bus.clone(),
            cache.clone(),
            health.clone(),
            shutdown_rx,
        )));

        Ok(Self {
            config,
            symbols,
            bus,
            cache,
            mode,
            registry,
            risk_control,
            health,
            shutdown_tx,
            tasks,
        })
    }

    pub fn bus(&self) -> SharedBus {
        self.bus.clone()
    }

    pub fn cache(&self) -> SharedCache {
        self.cache.clone()
    }

    pub fn mode(&self) -> Arc<ModeProvider> {
        Arc::clone(&self.mode)
    }

    /// Strategy toggles for the operator surface.
    pub fn strategies(&self) -> StrategyRegistry {
        self.registry.clone()
    }

    /// Kill-switch controls for the operator surface.
    pub fn risk_control(&self) -> RiskControl {
        self.risk_control.clone()
    }

    pub fn health(&self) -> HealthRegistry {
        self.health.clone()
    }

    pub fn config(&self) -> &MarlinConfig {
        &self.config
    }

    /// Block until ctrl-c, then unwind every service through the shutdown
    /// channel, waiting up to a grace period for them to finish.
    pub async fn run_until_shutdown(self) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(signal_error) => error!(%signal_error, "signal listener failed, shutting down"),
        }
        self.shutdown().await;
    }

    /// Trigger an orderly shutdown.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
                warn!("service did not stop within the grace period");
            }
        }
        info!("trading system stopped");
    }
}

fn build_backends(config: &MarlinConfig) -> Result<(SharedBus, SharedCache), SystemError> {
    match &config.cache.redis_url {
        Some(url) => {
            info!(url = %url, "using redis bus and cache");
            let bus: SharedBus = Arc::new(RedisBus::connect(url)?);
            let cache: SharedCache = Arc::new(RedisCache::connect(url)?);
            Ok((bus, cache))
        }
        None => {
            info!("no redis configured, using in-process bus and cache");
            let bus: SharedBus = Arc::new(InMemoryBus::new());
            let cache: SharedCache = Arc::new(InMemoryCache::new());
            Ok((bus, cache))
        }
    }
}

fn build_ingestion(
    config: &MarlinConfig,
    mode: TradingMode,
    bus: SharedBus,
    cache: SharedCache,
    symbols: &[Symbol],
) -> IngestionService {
    match mode {
        TradingMode::Simulation | TradingMode::Backtest => {
            let provider: Arc<dyn MarketDataProvider> = Arc::new(
                SimulationProvider::new(42).with_emit_interval(Duration::from_millis(100)),
            );
            IngestionService::new(bus, cache, symbols.to_vec(), provider, None)
        }
        _ => {
            let ws_url = if config.exchange.use_testnet {
                TESTNET_WS.to_string()
            } else {
                config.exchange.web_socket_url.clone()
            };
            let circuit = Arc::new(CircuitBreaker::new(
                "market-data-ws",
                WS_CIRCUIT_THRESHOLD,
                WS_CIRCUIT_COOLDOWN,
            ));
            let websocket = Arc::new(WebSocketProvider::new(ws_url, Arc::clone(&circuit)));
            let rest = RestPollingProvider::new(RestClient::new(effective_rest_url(config)));

            let fallback = FallbackPlan {
                provider: Arc::new(rest),
                websocket: Arc::clone(&websocket),
                circuit,
            };
            IngestionService::new(bus, cache, symbols.to_vec(), websocket, Some(fallback))
        }
    }
}

fn effective_rest_url(config: &MarlinConfig) -> String {
    if config.exchange.use_testnet {
        TESTNET_REST.to_string()
    } else {
        config.exchange.base_url.clone()
    }
}

fn build_registry(config: &MarlinConfig) -> StrategyRegistry {
    let mut strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(MaCrossover::new(10, 30)),
        Box::new(RsiReversion::new(14)),
    ];

    let enabled = &config.strategy.enabled_strategies;
    for strategy in &mut strategies {
        let active = enabled.iter().any(|name| name == strategy.name());
        strategy.set_enabled(active);
    }
    StrategyRegistry::new(strategies)
}

fn build_execution(
    config: &MarlinConfig,
    mode: TradingMode,
    bus: SharedBus,
    cache: SharedCache,
    mode_provider: &Arc<ModeProvider>,
) -> ExecutionService {
    let paper = Arc::new(PaperAdapter::new(
        cache,
        Duration::from_millis(config.trading_mode.paper_fill_latency_ms),
    ));

    let mut service = ExecutionService::new(bus, Arc::clone(mode_provider), paper)
        .with_order_timeout(Duration::from_secs(config.execution.order_timeout_seconds))
        .with_auto_fallback(config.trading_mode.auto_fallback_to_paper_on_circuit_open);

    if mode == TradingMode::Live {
        let credentials = Arc::new(LazyCredentials::new(
            Box::new(EnvSecretProvider),
            config.exchange.api_key_name.clone(),
            config.exchange.api_secret_name.clone(),
        ));
        let live = LiveAdapter::new(
            RestClient::new(effective_rest_url(config)),
            credentials,
            RateLimiter::new(RATE_LIMIT_CAPACITY, RATE_LIMIT_WINDOW),
        );
        service = service.with_live_adapter(Arc::new(live));
    }

    service
}

/// Keep the readiness registry current with backend health.
async fn probe_backends(
    bus: SharedBus,
    cache: SharedCache,
    health: HealthRegistry,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut cadence = tokio::time::interval(HEALTH_PROBE_CADENCE);
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
            _ = cadence.tick() => {
                health.set("bus", bus.is_healthy());
                health.set("cache", cache.ping().await);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulation_system_builds_and_stops() {
        let mut config = MarlinConfig::default();
        config.trading_mode.mode = "simulation".to_string();
        config.strategy.default_timeframe = "1m".to_string();
        // Ephemeral port so parallel tests never collide.
        config.health.listen = "127.0.0.1:0".to_string();

        let system = MarlinSystem::build(config).unwrap();
        assert_eq!(system.mode().mode(), TradingMode::Simulation);
        assert_eq!(system.strategies().names().len(), 2);

        system.shutdown().await;
    }

    #[tokio::test]
    async fn test_bad_mode_is_fatal() {
        let mut config = MarlinConfig::default();
        config.trading_mode.mode = "warp-speed".to_string();
        assert!(matches!(
            MarlinSystem::build(config),
            Err(SystemError::ConfigValue(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_timeframe_is_fatal() {
        let mut config = MarlinConfig::default();
        config.strategy.default_timeframe = "sometimes".to_string();
        assert!(matches!(
            MarlinSystem::build(config),
            Err(SystemError::ConfigValue(_))
        ));
    }
}
