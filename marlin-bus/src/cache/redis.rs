use crate::{cache::Cache, error::CacheError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Redis-backed cache used in deployment.
///
/// Writes carry their TTL via `SET .. EX`; channel fan-out maps straight to
/// `PUBLISH`. Commands run on the blocking pool so the dispatch context is
/// never held up by socket IO.
#[derive(Debug, Clone)]
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    pub fn connect(url: &str) -> Result<Self, CacheError> {
        Ok(Self {
            client: redis::Client::open(url)?,
        })
    }

    async fn run<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&mut redis::Connection) -> redis::RedisResult<T> + Send + 'static,
    {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = client.get_connection()?;
            op(&mut connection)
        })
        .await
        .map_err(|_| CacheError::WorkerClosed)?
        .map_err(CacheError::from)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let key = key.to_string();
        self.run(move |conn| {
            let mut command = redis::cmd("SET");
            command.arg(&key).arg(&value);
            if let Some(ttl) = ttl {
                command.arg("EX").arg(ttl.as_secs().max(1));
            }
            command.query(conn)
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let key = key.to_string();
        self.run(move |conn| redis::cmd("GET").arg(&key).query(conn)).await
    }

    async fn publish(&self, channel: &str, payload: String) -> Result<(), CacheError> {
        let channel = channel.to_string();
        self.run(move |conn| {
            redis::cmd("PUBLISH").arg(&channel).arg(&payload).query(conn)
        })
        .await
        .map(|_: i64| ())
    }

    async fn ping(&self) -> bool {
        let pong: Result<String, CacheError> =
            self.run(|conn| redis::cmd("PING").query(conn)).await;
        match pong {
            Ok(reply) => reply == "PONG",
            Err(err) => {
                warn!(%err, "cache ping failed");
                false
            }
        }
    }
}
