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

//! Publish/subscribe event bus and shared key/value cache.
//!
//! Two bus implementations share one contract: an in-process bus with
//! exactly-once dispatch used by tests and single-process deployments, and a
//! Redis-backed bus with per-topic channels and at-least-once delivery for
//! multi-process deployments. Both guarantee per-topic FIFO from a single
//! publisher and isolate subscriber failures from publishers.
//!
//! The cache follows the same split: an in-memory TTL map and a Redis
//! `SET EX`/`PUBLISH` client behind the [`Cache`] seam.

pub mod bus;
pub mod cache;
pub mod error;
pub mod keys;

pub use bus::{EventBus, EventRx, SharedBus, memory::InMemoryBus, redis::RedisBus};
pub use cache::{Cache, SharedCache, memory::InMemoryCache, redis::RedisCache};
pub use error::{BusError, CacheError};
