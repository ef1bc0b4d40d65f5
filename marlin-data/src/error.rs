use marlin_bus::{BusError, CacheError};
use marlin_integration::TransportError;
use thiserror::Error;

/// Errors raised by ingestion providers and the ingestion service.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("bus failure: {0}")]
    Bus(#[from] BusError),

    #[error("cache failure: {0}")]
    Cache(#[from] CacheError),

    /// The upstream circuit tripped; the caller should fail over.
    #[error("market data circuit open")]
    CircuitOpen,

    #[error("tick consumer dropped")]
    ConsumerClosed,
}
