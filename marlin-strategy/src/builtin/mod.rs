//! Built-in strategy plug-ins.

pub mod ma_crossover;
pub mod rsi_reversion;
