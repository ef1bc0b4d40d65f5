use marlin_integration::{TransportError, secret::SecretError};
use thiserror::Error;

/// Failures surfaced by order adapters. Callers branch on transience: only
/// transport-level failures count against the live circuit, a venue
/// rejection is a single-order problem.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Hard venue rejection (4xx other than throttling).
    #[error("exchange rejected request: {0}")]
    Exchange(String),

    #[error("no cached market price for {0}")]
    NoMarketPrice(String),

    #[error("credentials unavailable: {0}")]
    Credentials(#[from] SecretError),

    #[error("malformed venue response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("order not known to this adapter")]
    UnknownOrder,
}

impl AdapterError {
    /// True for failures that should count against the live circuit.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(transport) if transport.is_transient())
    }
}
