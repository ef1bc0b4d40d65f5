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

//! The strategy engine: candles out of ticks, signals out of candles.
//!
//! Ticks are aggregated into interval-aligned OHLCV candles per symbol, the
//! most recent hundred closed candles are retained per symbol, and every
//! enabled strategy plug-in is evaluated on each tick against that window.
//! Raw signals for a symbol are boosted when strategies agree on direction,
//! filtered by a confidence floor, and published individually.

pub mod aggregator;
pub mod builtin;
pub mod confluence;
pub mod engine;
pub mod history;
pub mod registry;
pub mod strategy;

pub use aggregator::CandleAggregator;
pub use builtin::{ma_crossover::MaCrossover, rsi_reversion::RsiReversion};
pub use confluence::apply_confluence;
pub use engine::StrategyEngine;
pub use history::CandleHistory;
pub use registry::StrategyRegistry;
pub use strategy::Strategy;
