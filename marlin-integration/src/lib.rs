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

//! Low-level framework shared by every Marlin service: WebSocket connect and
//! parse helpers, a signed REST client, a weight-based rolling-window rate
//! limiter, reconnect backoff, consecutive-failure circuit breaking, bounded
//! drop-oldest buffers, and the secret-provider seam.

pub mod backoff;
pub mod buffer;
pub mod circuit;
pub mod error;
pub mod http;
pub mod rate_limit;
pub mod secret;
pub mod websocket;

pub use backoff::ReconnectBackoff;
pub use buffer::DropOldestBuffer;
pub use circuit::CircuitBreaker;
pub use error::TransportError;
pub use http::{RestClient, sign_query};
pub use rate_limit::RateLimiter;
pub use secret::{ApiCredentials, EnvSecretProvider, LazyCredentials, SecretError, SecretProvider, StaticSecretProvider};
