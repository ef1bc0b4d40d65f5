use crate::{
    error::DataError,
    provider::{MarketDataProvider, shutdown_requested},
};
use async_trait::async_trait;
use chrono::Utc;
use marlin_core::{MarketTick, Symbol};
use marlin_integration::RestClient;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::{str::FromStr, time::Duration};
use tokio::sync::{mpsc, watch};
use tracing::warn;

const TICKER_PATH: &str = "/api/v3/ticker/price";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Deserialize)]
struct PriceTicker {
    symbol: String,
    price: String,
}

/// Fallback provider: polls the venue's price ticker endpoint, emitting one
/// tick per symbol per poll round. Poll failures are logged and skipped; the
/// loop only ends on shutdown or when the consumer goes away.
#[derive(Debug)]
pub struct RestPollingProvider {
    client: RestClient,
    poll_interval: Duration,
}

impl RestPollingProvider {
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn poll_symbol(&self, symbol: &Symbol) -> Option<MarketTick> {
        let params = vec![("symbol".to_string(), symbol.to_string())];
        let body = match self.client.send_public(Method::GET, TICKER_PATH, &params).await {
            Ok(body) => body,
            Err(error) => {
                warn!(%symbol, %error, "price poll failed");
                return None;
            }
        };

        let ticker: PriceTicker = match serde_json::from_str(&body) {
            Ok(ticker) => ticker,
            Err(error) => {
                warn!(%symbol, %error, "malformed ticker response dropped");
                return None;
            }
        };

        let price = match Decimal::from_str(&ticker.price) {
            Ok(price) => price,
            Err(error) => {
                warn!(%symbol, %error, "unparseable ticker price dropped");
                return None;
            }
        };

        Some(MarketTick::new(
            Symbol::new(&ticker.symbol),
            price,
            Decimal::ZERO,
            price,
            price,
            Utc::now(),
        ))
    }
}

#[async_trait]
impl MarketDataProvider for RestPollingProvider {
    fn name(&self) -> &'static str {
        "rest-polling"
    }

    async fn run(
        &self,
        symbols: &[Symbol],
        tx: mpsc::UnboundedSender<MarketTick>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), DataError> {
        loop {
            if shutdown_requested(&shutdown) {
                return Ok(());
            }

            for symbol in symbols {
                if let Some(tick) = self.poll_symbol(symbol).await {
                    if tx.send(tick).is_err() {
                        return Err(DataError::ConsumerClosed);
                    }
                }
            }

            tokio::select! {
                _ = shutdown.changed() => {
                    if shutdown_requested(&shutdown) {
                        return Ok(());
                    }
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
