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

//! Market data ingestion.
//!
//! Converts the exchange's trade stream into domain [`marlin_core::MarketTick`]s,
//! publishes them on `market.tick`, keeps the latest-price cache fresh, and
//! announces every tick on the out-of-band `market:ticks` channel.
//!
//! Three providers sit behind one seam: WebSocket streaming (primary), REST
//! polling (fallback while the WebSocket circuit is open), and a seeded
//! deterministic replay for simulation and backtest runs.

pub mod error;
pub mod provider;
pub mod service;

pub use error::DataError;
pub use provider::{
    MarketDataProvider, rest::RestPollingProvider, simulation::SimulationProvider,
    websocket::WebSocketProvider,
};
pub use service::{FallbackPlan, IngestionService};
