use crate::{
    error::DataError,
    provider::{MarketDataProvider, shutdown_requested},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use marlin_core::{MarketTick, Symbol};
use marlin_integration::{
    CircuitBreaker, ReconnectBackoff, TransportError,
    websocket::{self, WebSocket},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::{str::FromStr, sync::Arc};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// One message on the exchange's combined trade stream. Unknown fields are
/// ignored; the buyer/seller order ids the venue also sends are not needed.
#[derive(Clone, Debug, Deserialize)]
pub struct TradeMessage {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "q")]
    pub quantity: String,
    #[serde(rename = "T", default)]
    pub trade_time: i64,
}

impl TradeMessage {
    /// Convert to a domain tick; `None` when any numeric field is malformed.
    ///
    /// Trade streams carry no quote, so bid and ask fall back to the traded
    /// price until a tick with richer context replaces them downstream.
    pub fn to_tick(&self) -> Option<MarketTick> {
        let price = Decimal::from_str(&self.price).ok()?;
        let volume = Decimal::from_str(&self.quantity).ok()?;
        let time = DateTime::from_timestamp_millis(self.trade_time).unwrap_or_else(Utc::now);

        Some(MarketTick::new(
            Symbol::new(&self.symbol),
            price,
            volume,
            price,
            price,
            time,
        ))
    }
}

/// Build the combined stream url: `{base}/{s1}@trade/{s2}@trade/...`.
pub fn combined_stream_url(base: &str, symbols: &[Symbol]) -> String {
    let streams = symbols
        .iter()
        .map(|symbol| format!("{}@trade", symbol.to_ascii_lowercase()))
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", base.trim_end_matches('/'), streams)
}

/// Primary market data provider: a WebSocket read loop over the combined
/// trade stream with exponential reconnect backoff. Consecutive connection
/// failures trip the shared circuit, at which point `run` returns
/// [`DataError::CircuitOpen`] and the service fails over to REST polling.
#[derive(Debug)]
pub struct WebSocketProvider {
    base_url: String,
    circuit: Arc<CircuitBreaker>,
}

impl WebSocketProvider {
    pub fn new(base_url: impl Into<String>, circuit: Arc<CircuitBreaker>) -> Self {
        Self {
            base_url: base_url.into(),
            circuit,
        }
    }

    /// One-shot connection attempt used while probing an open circuit.
    pub async fn probe(&self, symbols: &[Symbol]) -> Result<(), TransportError> {
        let url = combined_stream_url(&self.base_url, symbols);
        let websocket = websocket::connect(&url).await?;
        drop(websocket);
        Ok(())
    }

    async fn read_stream(
        &self,
        mut stream: WebSocket,
        tx: &mpsc::UnboundedSender<MarketTick>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), DataError> {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if shutdown_requested(shutdown) {
                        return Ok(());
                    }
                }
                message = stream.next() => {
                    let Some(message) = message else {
                        return Err(TransportError::Terminated("stream ended".to_string()).into());
                    };

                    match websocket::parse_message::<TradeMessage>(message) {
                        Some(Ok(trade)) => match trade.to_tick() {
                            Some(tick) => {
                                if tx.send(tick).is_err() {
                                    return Err(DataError::ConsumerClosed);
                                }
                            }
                            None => warn!(symbol = %trade.symbol, "malformed trade fields dropped"),
                        },
                        Some(Err(TransportError::Deserialise { error, payload })) => {
                            warn!(%error, payload = %payload, "malformed stream message dropped");
                        }
                        Some(Err(error)) => return Err(error.into()),
                        None => {}
                    }
                }
            }
        }
    }
}

#[async_trait]
impl MarketDataProvider for WebSocketProvider {
    fn name(&self) -> &'static str {
        "websocket"
    }

    async fn run(
        &self,
        symbols: &[Symbol],
        tx: mpsc::UnboundedSender<MarketTick>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), DataError> {
        let url = combined_stream_url(&self.base_url, symbols);
        let mut backoff = ReconnectBackoff::new();

        loop {
            if shutdown_requested(&shutdown) {
                return Ok(());
            }

            match websocket::connect(&url).await {
                Ok(stream) => {
                    info!(url = %url, "market data stream connected");
                    self.circuit.record_success();
                    backoff.reset();

                    match self.read_stream(stream, &tx, &mut shutdown).await {
                        Ok(()) => return Ok(()),
                        Err(DataError::ConsumerClosed) => return Err(DataError::ConsumerClosed),
                        Err(error) => {
                            warn!(%error, "market data stream dropped, reconnecting");
                            if self.circuit.record_failure() {
                                return Err(DataError::CircuitOpen);
                            }
                        }
                    }
                }
                Err(error) => {
                    warn!(%error, "market data connection failed");
                    if self.circuit.record_failure() {
                        return Err(DataError::CircuitOpen);
                    }
                }
            }

            let delay = backoff.next_delay();
            debug!(?delay, "backing off before reconnect");
            tokio::select! {
                _ = shutdown.changed() => {
                    if shutdown_requested(&shutdown) {
                        return Ok(());
                    }
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_combined_stream_url() {
        let symbols = [Symbol::new("BTCUSDT"), Symbol::new("ETHUSDT")];
        assert_eq!(
            combined_stream_url("wss://stream.example.com:9443/ws", &symbols),
            "wss://stream.example.com:9443/ws/btcusdt@trade/ethusdt@trade"
        );
    }

    #[test]
    fn test_trade_message_to_tick() {
        let json = r#"{
            "e": "trade",
            "E": 1717000000100,
            "s": "BTCUSDT",
            "t": 12345,
            "p": "50000.10",
            "q": "0.250",
            "b": 88,
            "a": 50,
            "T": 1717000000099,
            "m": true
        }"#;
        let message: TradeMessage = serde_json::from_str(json).unwrap();
        let tick = message.to_tick().unwrap();
        assert_eq!(tick.symbol.as_str(), "BTCUSDT");
        assert_eq!(tick.price, dec!(50000.10));
        assert_eq!(tick.volume, dec!(0.250));
        assert_eq!(tick.bid, tick.price);
        assert_eq!(tick.time.timestamp_millis(), 1_717_000_000_099);
    }

    #[test]
    fn test_malformed_numeric_fields_yield_none() {
        let message = TradeMessage {
            symbol: "BTCUSDT".to_string(),
            price: "not-a-price".to_string(),
            quantity: "1".to_string(),
            trade_time: 0,
        };
        assert!(message.to_tick().is_none());
    }
}
