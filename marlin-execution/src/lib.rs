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

//! Order execution.
//!
//! Approved orders are placed through the adapter matching the current
//! trading mode: a signed REST client against the live venue, a paper
//! simulator filling at the cached market price, or a deterministic fake
//! for tests. Fills feed an order tracker that owns the position index and
//! emits `orders.executed`; a background monitor cancels stale pending
//! orders and reconciles the rest. Repeated live-transport failures trip a
//! circuit that flips the process to paper trading without interrupting
//! the pipeline.

pub mod adapter;
pub mod error;
pub mod service;
pub mod tracker;

pub use adapter::{
    OrderAdapter, OrderReceipt,
    fake::{FakeAdapter, FakeCall},
    live::{LiveAdapter, RATE_LIMIT_CAPACITY},
    paper::PaperAdapter,
};
pub use error::AdapterError;
pub use service::ExecutionService;
pub use tracker::OrderTracker;
