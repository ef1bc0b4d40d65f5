use thiserror::Error;

/// Errors produced while constructing or parsing domain values.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("invalid candle interval: {0}")]
    InvalidInterval(String),

    #[error("invalid trading mode: {0}")]
    InvalidTradingMode(String),

    #[error("unknown topic: {0}")]
    InvalidTopic(String),

    #[error("invalid order transition: {from} -> {to}")]
    InvalidOrderTransition { from: &'static str, to: &'static str },
}
