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

//! Domain model for the Marlin trading pipeline.
//!
//! Every entity that crosses a service boundary lives here: market ticks,
//! candles, trade signals, orders, positions, portfolio snapshots, risk
//! limits, the process-wide trading mode, and the typed events carried by
//! the bus. Cross-service views travel as serialised event payloads or
//! cache snapshots; no entity is shared mutably between services.

pub mod candle;
pub mod config;
pub mod error;
pub mod event;
pub mod limits;
pub mod mode;
pub mod order;
pub mod position;
pub mod signal;
pub mod tick;

pub use candle::{Candle, CandleInterval};
pub use config::MarlinConfig;
pub use error::CoreError;
pub use event::{
    Envelope, EventEnvelope, HealthStatus, KillSwitchEvent, MarlinEvent, RiskAlert,
    SystemHealthEvent, Topic,
};
pub use limits::RiskLimits;
pub use mode::{ModeProvider, TradingMode};
pub use order::{Order, OrderKind, OrderStatus, Side};
pub use position::{PortfolioSnapshot, Position, PositionSide};
pub use signal::{SignalAction, TradeSignal};
pub use tick::MarketTick;

/// Communicative type alias for an exchange trading pair symbol, eg/ "BTCUSDT".
pub type Symbol = smol_str::SmolStr;
