use crate::{RiskLimits, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange connectivity settings.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub web_socket_url: String,
    pub use_testnet: bool,
    /// Name under which the secret provider holds the API key.
    pub api_key_name: String,
    /// Name under which the secret provider holds the API secret.
    pub api_secret_name: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            web_socket_url: "wss://stream.binance.com:9443/ws".to_string(),
            use_testnet: false,
            api_key_name: "MARLIN_API_KEY".to_string(),
            api_secret_name: "MARLIN_API_SECRET".to_string(),
        }
    }
}

/// Symbols traded by this deployment.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymbolsConfig {
    pub symbols: Vec<String>,
}

impl SymbolsConfig {
    /// Symbols normalised to the exchange's upper-case convention.
    pub fn normalized(&self) -> Vec<Symbol> {
        self.symbols
            .iter()
            .map(|symbol| Symbol::new(symbol.to_ascii_uppercase()))
            .collect()
    }
}

impl Default for SymbolsConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTCUSDT".to_string()],
        }
    }
}

/// Strategy engine settings.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrategySettings {
    pub enabled_strategies: Vec<String>,
    /// Candle interval label fed to the aggregator, eg/ "1h".
    pub default_timeframe: String,
    /// Signals below this post-confluence confidence are dropped.
    pub min_confidence_score: Decimal,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            enabled_strategies: vec!["ma-crossover".to_string(), "rsi-reversion".to_string()],
            default_timeframe: "1h".to_string(),
            min_confidence_score: Decimal::new(7, 1),
        }
    }
}

/// Trading mode settings.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradingModeConfig {
    /// Initial mode label: "live", "paper", "backtest" or "simulation".
    pub mode: String,
    /// Flip Live -> Paper when the live adapter circuit opens.
    pub auto_fallback_to_paper_on_circuit_open: bool,
    pub paper_fill_latency_ms: u64,
}

impl Default for TradingModeConfig {
    fn default() -> Self {
        Self {
            mode: "paper".to_string(),
            auto_fallback_to_paper_on_circuit_open: true,
            paper_fill_latency_ms: 25,
        }
    }
}

/// Cache backend selection. In-memory unless a Redis URL is configured.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    pub redis_url: Option<String>,
}

/// Execution engine settings.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionConfig {
    /// Pending orders older than this are cancelled by the monitor.
    pub order_timeout_seconds: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            order_timeout_seconds: 60,
        }
    }
}

/// Operator health endpoint settings.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthConfig {
    pub listen: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8090".to_string(),
        }
    }
}

/// Top-level configuration aggregating every service's settings.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarlinConfig {
    pub exchange: ExchangeConfig,
    pub symbols: SymbolsConfig,
    pub strategy: StrategySettings,
    pub risk: RiskLimits,
    pub trading_mode: TradingModeConfig,
    pub cache: CacheConfig,
    pub execution: ExecutionConfig,
    pub health: HealthConfig,
}
