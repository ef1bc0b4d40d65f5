use crate::{
    bus::{EventBus, EventRx},
    error::BusError,
};
use marlin_core::{EventEnvelope, Topic};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::mpsc;
use tracing::trace;

type SubscriberTx = mpsc::UnboundedSender<Arc<EventEnvelope>>;

/// In-process bus with exactly-once dispatch.
///
/// The subscriber map is snapshotted before dispatch so concurrent
/// subscription changes never deadlock a publisher, and events are fanned
/// out through per-subscriber unbounded queues so one stalled consumer
/// cannot hold up the rest.
#[derive(Debug, Default)]
pub struct InMemoryBus {
    subscribers: RwLock<HashMap<Topic, Vec<SubscriberTx>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch an event to every live subscriber of its topic, pruning
    /// subscriptions whose receivers have been dropped.
    pub(crate) fn dispatch(&self, event: Arc<EventEnvelope>) {
        let topic = event.topic();

        // Snapshot under the read lock; send outside it.
        let snapshot = self
            .subscribers
            .read()
            .get(&topic)
            .cloned()
            .unwrap_or_default();

        trace!(%topic, subscribers = snapshot.len(), "dispatching event");

        let mut any_dead = false;
        for tx in &snapshot {
            if tx.send(Arc::clone(&event)).is_err() {
                any_dead = true;
            }
        }

        if any_dead {
            self.subscribers
                .write()
                .entry(topic)
                .or_default()
                .retain(|tx| !tx.is_closed());
        }
    }
}

impl EventBus for InMemoryBus {
    fn publish(&self, event: EventEnvelope) -> Result<(), BusError> {
        self.dispatch(Arc::new(event));
        Ok(())
    }

    fn subscribe(&self, topic: Topic) -> EventRx {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().entry(topic).or_default().push(tx);
        EventRx::new(rx)
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use marlin_core::{MarketTick, MarlinEvent, Symbol};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn tick_event(price: rust_decimal::Decimal) -> EventEnvelope {
        EventEnvelope::new(
            MarlinEvent::MarketTick(MarketTick::new(
                Symbol::new("BTCUSDT"),
                price,
                dec!(1),
                price,
                price,
                Utc::now(),
            )),
            Uuid::new_v4().to_string(),
            "test",
        )
    }

    #[tokio::test]
    async fn test_single_publisher_fifo() {
        let bus = InMemoryBus::new();
        let mut rx = bus.subscribe(Topic::MarketTick);

        for index in 0..5 {
            bus.publish(tick_event(rust_decimal::Decimal::from(index))).unwrap();
        }

        for index in 0..5 {
            let event = rx.recv().await.unwrap();
            match &event.payload {
                MarlinEvent::MarketTick(tick) => {
                    assert_eq!(tick.price, rust_decimal::Decimal::from(index));
                }
                other => panic!("unexpected payload: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_receive() {
        let bus = InMemoryBus::new();
        let mut first = bus.subscribe(Topic::MarketTick);
        let mut second = bus.subscribe(Topic::MarketTick);

        bus.publish(tick_event(dec!(100))).unwrap();

        assert!(first.recv().await.is_some());
        assert!(second.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let bus = InMemoryBus::new();
        let mut signals = bus.subscribe(Topic::StrategySignal);

        bus.publish(tick_event(dec!(100))).unwrap();
        assert!(signals.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_fail_publish() {
        let bus = InMemoryBus::new();
        let rx = bus.subscribe(Topic::MarketTick);
        drop(rx);

        assert!(bus.publish(tick_event(dec!(100))).is_ok());
        // The dead subscription is pruned on the next dispatch pass.
        assert!(bus.publish(tick_event(dec!(101))).is_ok());
        assert!(bus.subscribers.read().get(&Topic::MarketTick).unwrap().is_empty());
    }
}
