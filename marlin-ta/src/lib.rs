#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms,
    rust_2024_compatibility
)]

//! Technical analysis indicators for Marlin strategies.
//!
//! Every indicator updates in O(1) per sample and exposes the same
//! contract: feed values in, ask whether the warm-up period has elapsed,
//! read the latest output, reset to start over. State is private so a
//! strategy can rebuild an indicator deterministically from a candle
//! window after restart.

pub mod error;
pub mod indicators;

pub use error::IndicatorError;
pub use indicators::{
    atr::AverageTrueRange,
    bollinger::{BollingerBands, BollingerOutput},
    ema::ExponentialMovingAverage,
    macd::{Macd, MacdOutput},
    rsi::RelativeStrengthIndex,
    sma::SimpleMovingAverage,
    supertrend::{SuperTrend, SuperTrendOutput, Trend},
};

/// Common contract implemented by every indicator.
///
/// `update` consumes one sample and returns the latest output once the
/// warm-up period has elapsed, `None` before that.
pub trait Indicator {
    type Input;
    type Output;

    fn name(&self) -> &'static str;

    fn is_ready(&self) -> bool;

    fn update(&mut self, input: Self::Input) -> Option<Self::Output>;

    fn reset(&mut self);
}

/// One candle's worth of input for range-based indicators.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CandleSample {
    pub high: rust_decimal::Decimal,
    pub low: rust_decimal::Decimal,
    pub close: rust_decimal::Decimal,
}
