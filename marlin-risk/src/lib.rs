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

//! Risk management.
//!
//! Every trade signal passes an ordered validation pipeline before it can
//! become an order: kill-switch guard, open-position guard, risk/reward
//! guard, then position sizing. Rejections are non-errors published on
//! `risk.alerts`. Alongside the pipeline, an equity monitor tracks peak
//! drawdown, daily realised loss and consecutive losing snapshots, and owns
//! the process-wide kill switch.

pub mod drawdown;
pub mod killswitch;
pub mod ledger;
pub mod monitor;
pub mod service;
pub mod sizer;
pub mod validation;

pub use drawdown::DrawdownMonitor;
pub use killswitch::KillSwitch;
pub use ledger::PortfolioLedger;
pub use monitor::{EquityMonitor, TripReason};
pub use service::{RiskControl, RiskManager};
pub use sizer::PositionSizer;
pub use validation::{Rejection, SignalValidator};
