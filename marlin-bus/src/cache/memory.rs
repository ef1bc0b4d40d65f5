use crate::{cache::Cache, error::CacheError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// In-memory cache with real TTL expiry, used by tests and single-process
/// simulation runs. Channel publishes are fanned out on a broadcast channel
/// so tests can observe them.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    channel_tx: broadcast::Sender<(String, String)>,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        let (channel_tx, _) = broadcast::channel(256);
        Self {
            entries: Mutex::new(HashMap::new()),
            channel_tx,
        }
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe `(channel, payload)` pairs published through this cache.
    pub fn subscribe_channels(&self) -> broadcast::Receiver<(String, String)> {
        self.channel_tx.subscribe()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let entry = Entry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn publish(&self, channel: &str, payload: String) -> Result<(), CacheError> {
        // Send errors just mean nobody is listening.
        let _ = self.channel_tx.send((channel.to_string(), payload));
        Ok(())
    }

    async fn ping(&self) -> bool {
        true
    }
}
