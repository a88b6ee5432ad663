//! In-process broker
//!
//! Implements `BusClient` without any network transport. Used by unit and
//! e2e tests, and by mock-mode runs where producer and consumer share a
//! process. Clones share one broker, so a cloned handle publishes to
//! subscribers registered through any other clone.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use contracts::BusError;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::client::BusClient;

/// Default per-subscription channel capacity
const DEFAULT_CAPACITY: usize = 100;

struct Broker {
    /// topic -> subscriber senders (exact-match routing, no wildcards)
    subscribers: Mutex<HashMap<String, Vec<mpsc::Sender<Bytes>>>>,
    connected: AtomicBool,
    capacity: usize,
}

/// In-process bus client
#[derive(Clone)]
pub struct MemoryBus {
    broker: Arc<Broker>,
}

impl MemoryBus {
    /// Create a broker with the default subscription capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a broker with an explicit subscription capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            broker: Arc::new(Broker {
                subscribers: Mutex::new(HashMap::new()),
                connected: AtomicBool::new(false),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Number of live subscriptions on a topic
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.broker
            .subscribers
            .lock()
            .expect("broker lock poisoned")
            .get(topic)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    fn ensure_connected(&self) -> Result<(), BusError> {
        if self.broker.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BusError::NotConnected)
        }
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BusClient for MemoryBus {
    async fn connect(&mut self, host: &str, port: u16) -> Result<(), BusError> {
        debug!(host = %host, port = port, "memory bus connected (in-process, address ignored)");
        self.broker.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str) -> Result<mpsc::Receiver<Bytes>, BusError> {
        self.ensure_connected()
            .map_err(|_| BusError::subscribe(topic, "not connected"))?;

        let (tx, rx) = mpsc::channel(self.broker.capacity);
        self.broker
            .subscribers
            .lock()
            .expect("broker lock poisoned")
            .entry(topic.to_string())
            .or_default()
            .push(tx);

        debug!(topic = %topic, "memory bus subscription registered");
        Ok(rx)
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), BusError> {
        self.ensure_connected()
            .map_err(|_| BusError::publish(topic, "not connected"))?;

        // Snapshot senders outside the lock, pruning closed ones
        let senders: Vec<mpsc::Sender<Bytes>> = {
            let mut subscribers = self
                .broker
                .subscribers
                .lock()
                .expect("broker lock poisoned");
            if let Some(subs) = subscribers.get_mut(topic) {
                subs.retain(|tx| !tx.is_closed());
                subs.clone()
            } else {
                Vec::new()
            }
        };

        // Awaiting channel capacity here is the backpressure path: a stalled
        // consumer stalls the publisher
        for tx in senders {
            if tx.send(payload.clone()).await.is_err() {
                trace!(topic = %topic, "subscriber dropped mid-publish");
            }
        }

        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), BusError> {
        self.broker.connected.store(false, Ordering::SeqCst);
        self.broker
            .subscribers
            .lock()
            .expect("broker lock poisoned")
            .clear();
        debug!("memory bus disconnected");
        Ok(())
    }
}
