use crate::error::DataError;
use async_trait::async_trait;
use marlin_core::{MarketTick, Symbol};
use tokio::sync::{mpsc, watch};

pub mod rest;
pub mod simulation;
pub mod websocket;

/// Source of [`MarketTick`]s for the ingestion service.
///
/// `run` streams ticks into `tx` until the shutdown flag flips, the consumer
/// goes away, or the provider gives up (eg/ its circuit opens). Malformed
/// upstream messages are logged and skipped inside the provider; they never
/// end the stream.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        symbols: &[Symbol],
        tx: mpsc::UnboundedSender<MarketTick>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), DataError>;
}

pub(crate) fn shutdown_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}
