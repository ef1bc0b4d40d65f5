use thiserror::Error;

/// Errors raised by bus implementations. Subscriber handler failures are
/// logged and isolated, never surfaced through these variants.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("redis transport error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("event serialisation error: {0}")]
    Serialise(#[from] serde_json::Error),

    #[error("bus writer has shut down")]
    WriterClosed,
}

/// Errors raised by cache implementations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis cache error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache worker has shut down")]
    WorkerClosed,
}
