use crate::{
    bus::{EventBus, EventRx, memory::InMemoryBus},
    error::BusError,
};
use marlin_core::{EventEnvelope, Topic};
use marlin_integration::DropOldestBuffer;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};
use tokio::sync::mpsc;
use tracing::{error, warn};

const CHANNEL_PREFIX: &str = "marlin:events:";
const PUBLISH_BUFFER_CAPACITY: usize = 100;
const RECONNECT_DELAY: Duration = Duration::from_millis(500);

/// Name of the Redis channel carrying the given topic.
pub fn channel_for(topic: Topic) -> String {
    format!("{CHANNEL_PREFIX}{topic}")
}

fn topic_from_channel(channel: &str) -> Option<Topic> {
    channel.strip_prefix(CHANNEL_PREFIX)?.parse().ok()
}

/// Redis-backed bus: one channel per topic, JSON camelCase envelopes,
/// at-least-once delivery.
///
/// Publishing hands the envelope to a dedicated writer thread and returns
/// immediately. While the Redis connection is down the writer holds up to
/// [`PUBLISH_BUFFER_CAPACITY`] events in a drop-oldest buffer and drains it
/// on recovery; subscribers attach to a local dispatcher fed by a reader
/// thread subscribed to every topic channel.
#[derive(Debug)]
pub struct RedisBus {
    local: Arc<InMemoryBus>,
    outbound_tx: mpsc::UnboundedSender<EventEnvelope>,
    healthy: Arc<AtomicBool>,
}

impl RedisBus {
    /// Connect to the broker at `url` and start the writer/reader threads.
    pub fn connect(url: &str) -> Result<Self, BusError> {
        let client = redis::Client::open(url)?;
        let local = Arc::new(InMemoryBus::new());
        let healthy = Arc::new(AtomicBool::new(true));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        {
            let client = client.clone();
            let healthy = Arc::clone(&healthy);
            thread::Builder::new()
                .name("marlin-bus-writer".to_string())
                .spawn(move || run_writer(client, outbound_rx, healthy))
                .map_err(|_| BusError::WriterClosed)?;
        }

        {
            let local = Arc::clone(&local);
            thread::Builder::new()
                .name("marlin-bus-reader".to_string())
                .spawn(move || run_reader(client, local))
                .map_err(|_| BusError::WriterClosed)?;
        }

        Ok(Self {
            local,
            outbound_tx,
            healthy,
        })
    }
}

impl EventBus for RedisBus {
    fn publish(&self, event: EventEnvelope) -> Result<(), BusError> {
        self.outbound_tx
            .send(event)
            .map_err(|_| BusError::WriterClosed)
    }

    fn subscribe(&self, topic: Topic) -> EventRx {
        self.local.subscribe(topic)
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}

fn run_writer(
    client: redis::Client,
    mut outbound_rx: mpsc::UnboundedReceiver<EventEnvelope>,
    healthy: Arc<AtomicBool>,
) {
    let mut buffer: DropOldestBuffer<EventEnvelope> =
        DropOldestBuffer::new(PUBLISH_BUFFER_CAPACITY);
    let mut connection: Option<redis::Connection> = None;

    loop {
        if buffer.is_empty() {
            match outbound_rx.blocking_recv() {
                Some(event) => {
                    buffer.push(event);
                }
                // All publishers dropped; nothing left to flush.
                None => return,
            }
        }

        // Sweep any further queued events into the bounded buffer.
        while let Ok(event) = outbound_rx.try_recv() {
            if buffer.push(event).is_some() {
                warn!("publish buffer overflow, oldest event dropped");
            }
        }

        if connection.is_none() {
            match client.get_connection() {
                Ok(fresh) => connection = Some(fresh),
                Err(err) => {
                    healthy.store(false, Ordering::Relaxed);
                    warn!(%err, buffered = buffer.len(), "bus transport unavailable, buffering");
                    thread::sleep(RECONNECT_DELAY);
                    continue;
                }
            }
        }

        let drained = match connection.as_mut() {
            Some(conn) => flush_buffer(&mut buffer, conn),
            None => continue,
        };

        if drained {
            healthy.store(true, Ordering::Relaxed);
        } else {
            connection = None;
            healthy.store(false, Ordering::Relaxed);
        }
    }
}

/// Publish buffered events in order. Returns false on the first transport
/// failure, leaving the failed event at the head for the next attempt.
fn flush_buffer(buffer: &mut DropOldestBuffer<EventEnvelope>, conn: &mut redis::Connection) -> bool {
    while let Some(event) = buffer.pop() {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(err) => {
                error!(%err, topic = %event.topic(), "unserialisable event skipped");
                continue;
            }
        };

        let published: redis::RedisResult<()> = redis::cmd("PUBLISH")
            .arg(channel_for(event.topic()))
            .arg(json)
            .query(conn);

        if let Err(err) = published {
            warn!(%err, "publish failed, requeueing and reconnecting");
            buffer.push_front(event);
            return false;
        }
    }
    true
}

fn run_reader(client: redis::Client, local: Arc<InMemoryBus>) {
    loop {
        let mut connection = match client.get_connection() {
            Ok(connection) => connection,
            Err(err) => {
                warn!(%err, "bus reader cannot connect, retrying");
                thread::sleep(RECONNECT_DELAY);
                continue;
            }
        };

        let mut pubsub = connection.as_pubsub();
        if Topic::ALL
            .into_iter()
            .any(|topic| pubsub.subscribe(channel_for(topic)).is_err())
        {
            warn!("bus reader failed to subscribe, retrying");
            thread::sleep(RECONNECT_DELAY);
            continue;
        }

        loop {
            let message = match pubsub.get_message() {
                Ok(message) => message,
                Err(err) => {
                    warn!(%err, "bus reader connection lost, reconnecting");
                    break;
                }
            };

            let Some(topic) = topic_from_channel(message.get_channel_name()) else {
                continue;
            };
            let payload: String = match message.get_payload() {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(%err, %topic, "undecodable bus payload dropped");
                    continue;
                }
            };

            match EventEnvelope::from_topic_json(topic, &payload) {
                Ok(envelope) => local.dispatch(Arc::new(envelope)),
                Err(err) => warn!(%err, %topic, "malformed bus envelope dropped"),
            }
        }

        thread::sleep(RECONNECT_DELAY);
    }
}
