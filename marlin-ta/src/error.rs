use thiserror::Error;

/// Errors raised while constructing indicators.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum IndicatorError {
    #[error("indicator period must be greater than zero")]
    ZeroPeriod,

    #[error("fast period {fast} must be shorter than slow period {slow}")]
    FastNotBelowSlow { fast: usize, slow: usize },
}
