use crate::error::CacheError;
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};

pub mod memory;
pub mod redis;

/// Shared key/value store with per-write TTL and out-of-band pub/sub
/// channels for gateway fan-out.
///
/// Written by ingestion (latest tick/price) and risk (portfolio snapshot);
/// read by execution. Keys are namespaced, see [`crate::keys`].
#[async_trait]
pub trait Cache: Send + Sync {
    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Fire-and-forget fan-out on a named channel.
    async fn publish(&self, channel: &str, payload: String) -> Result<(), CacheError>;

    /// Liveness probe for readiness reporting.
    async fn ping(&self) -> bool;
}

/// Shared handle to the process-wide cache instance.
pub type SharedCache = Arc<dyn Cache>;
