use crate::error::BusError;
use marlin_core::{EventEnvelope, Topic};
use std::sync::Arc;
use tokio::sync::mpsc;

pub mod memory;
pub mod redis;

/// Topic-based publish/subscribe seam shared by every service.
///
/// `publish` returns after local dispatch and never propagates a subscriber
/// failure back to the caller. Subscribers receive events in publish order
/// for any single publisher; a slow subscriber only delays itself because
/// each subscription owns a private queue.
pub trait EventBus: Send + Sync {
    fn publish(&self, event: EventEnvelope) -> Result<(), BusError>;

    fn subscribe(&self, topic: Topic) -> EventRx;

    /// True while the underlying transport is usable. The in-process bus is
    /// always healthy; the remote bus reports false while its circuit is open.
    fn is_healthy(&self) -> bool;
}

/// Shared handle to the process-wide bus instance.
pub type SharedBus = Arc<dyn EventBus>;

/// Receiving half of one subscription.
#[derive(Debug)]
pub struct EventRx {
    rx: mpsc::UnboundedReceiver<Arc<EventEnvelope>>,
}

impl EventRx {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Arc<EventEnvelope>>) -> Self {
        Self { rx }
    }

    /// Wait for the next event; `None` once the bus is dropped.
    pub async fn recv(&mut self) -> Option<Arc<EventEnvelope>> {
        self.rx.recv().await
    }

    /// Non-blocking receive for drain-style consumers.
    pub fn try_recv(&mut self) -> Option<Arc<EventEnvelope>> {
        self.rx.try_recv().ok()
    }
}
