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

//! Marlin composition root.
//!
//! Wires the trading pipeline together: configuration, the event bus and
//! cache backends, the trading-mode provider, and the four services
//! (ingestion, strategy, risk, execution), plus the operator health
//! endpoints. The binary in `main.rs` is a thin shell over
//! [`system::MarlinSystem`].

pub mod config;
pub mod health;
pub mod system;

pub use config::load_config;
pub use health::HealthRegistry;
pub use system::{MarlinSystem, SystemError};
