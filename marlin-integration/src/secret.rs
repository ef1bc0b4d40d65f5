use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::debug;

/// Errors surfaced while resolving secrets.
#[derive(Debug, Clone, Error)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("secret provider failure: {0}")]
    Provider(String),
}

/// Seam over wherever credentials actually live (environment, vault, file).
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn secret(&self, name: &str) -> Result<String, SecretError>;
}

/// Reads secrets from process environment variables.
#[derive(Debug, Default, Clone)]
pub struct EnvSecretProvider;

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn secret(&self, name: &str) -> Result<String, SecretError> {
        std::env::var(name).map_err(|_| SecretError::NotFound(name.to_string()))
    }
}

/// Fixed in-memory secrets for tests and local simulation.
#[derive(Debug, Default, Clone)]
pub struct StaticSecretProvider {
    secrets: HashMap<String, String>,
}

impl StaticSecretProvider {
    pub fn new(secrets: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            secrets: secrets.into_iter().collect(),
        }
    }
}

#[async_trait]
impl SecretProvider for StaticSecretProvider {
    async fn secret(&self, name: &str) -> Result<String, SecretError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}

/// Exchange API credential pair. The secret never appears in Debug output.
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Credentials resolved lazily on first use and cached for the process
/// lifetime. The first load is single-flight: concurrent callers wait on the
/// same initialisation rather than hitting the provider in parallel.
pub struct LazyCredentials {
    provider: Box<dyn SecretProvider>,
    api_key_name: String,
    api_secret_name: String,
    cell: OnceCell<ApiCredentials>,
}

impl fmt::Debug for LazyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCredentials")
            .field("api_key_name", &self.api_key_name)
            .field("loaded", &self.cell.initialized())
            .finish()
    }
}

impl LazyCredentials {
    pub fn new(
        provider: Box<dyn SecretProvider>,
        api_key_name: impl Into<String>,
        api_secret_name: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            api_key_name: api_key_name.into(),
            api_secret_name: api_secret_name.into(),
            cell: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Result<&ApiCredentials, SecretError> {
        self.cell
            .get_or_try_init(|| async {
                debug!(key_name = %self.api_key_name, "loading exchange credentials");
                let api_key = self.provider.secret(&self.api_key_name).await?;
                let api_secret = self.provider.secret(&self.api_secret_name).await?;
                Ok(ApiCredentials { api_key, api_secret })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SecretProvider for CountingProvider {
        async fn secret(&self, name: &str) -> Result<String, SecretError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("value-of-{name}"))
        }
    }

    #[tokio::test]
    async fn test_lazy_load_happens_once() {
        let credentials = std::sync::Arc::new(LazyCredentials::new(
            Box::new(CountingProvider {
                calls: AtomicU32::new(0),
            }),
            "KEY",
            "SECRET",
        ));

        let first = credentials.get().await.unwrap().api_key.clone();
        let second = credentials.get().await.unwrap().api_key.clone();
        assert_eq!(first, "value-of-KEY");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_static_secret() {
        let provider = StaticSecretProvider::default();
        let credentials = LazyCredentials::new(Box::new(provider), "KEY", "SECRET");
        assert!(matches!(
            credentials.get().await,
            Err(SecretError::NotFound(_))
        ));
    }

    #[test]
    fn test_secret_redacted_in_debug() {
        let credentials = ApiCredentials {
            api_key: "key".to_string(),
            api_secret: "do-not-print".to_string(),
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("do-not-print"));
    }
}
