use crate::system::SystemError;
use marlin_core::MarlinConfig;
use std::path::Path;
use tracing::info;

/// Load configuration from a TOML file, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<MarlinConfig, SystemError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            let raw = std::fs::read_to_string(path)
                .map_err(|error| SystemError::ConfigRead(path.display().to_string(), error))?;
            toml::from_str(&raw).map_err(SystemError::ConfigParse)
        }
        None => {
            info!("no configuration file provided, using defaults");
            Ok(MarlinConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.trading_mode.mode, "paper");
    }

    #[test]
    fn test_camel_case_toml_keys() {
        let raw = r#"
            [symbols]
            symbols = ["btcusdt", "ethusdt"]

            [strategy]
            defaultTimeframe = "1m"
            minConfidenceScore = "0.75"

            [risk]
            maxDrawdownPercent = "5"
            maxOpenPositions = 3

            [tradingMode]
            mode = "simulation"
            paperFillLatencyMs = 10

            [execution]
            orderTimeoutSeconds = 30
        "#;
        let temp = std::env::temp_dir().join("marlin-config-test.toml");
        std::fs::write(&temp, raw).unwrap();

        let config = load_config(Some(&temp)).unwrap();
        assert_eq!(config.symbols.normalized().len(), 2);
        assert_eq!(config.strategy.default_timeframe, "1m");
        assert_eq!(config.strategy.min_confidence_score, dec!(0.75));
        assert_eq!(config.risk.max_drawdown_percent, dec!(5));
        assert_eq!(config.trading_mode.mode, "simulation");
        assert_eq!(config.execution.order_timeout_seconds, 30);

        std::fs::remove_file(&temp).ok();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let missing = Path::new("/definitely/not/here.toml");
        assert!(matches!(
            load_config(Some(missing)),
            Err(SystemError::ConfigRead(_, _))
        ));
    }
}
