//! MQTT bus client
//!
//! rumqttc-backed implementation of `BusClient`. A background task drives
//! the rumqttc event loop and routes incoming publishes to per-topic
//! subscription channels (exact-match routing, no wildcard support).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use contracts::BusError;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::client::BusClient;

/// Event-loop request queue depth
const EVENT_QUEUE_CAPACITY: usize = 64;

type TopicRouter = Arc<Mutex<HashMap<String, mpsc::Sender<Bytes>>>>;

/// MQTT client
///
/// `connect` must be called before `subscribe`/`publish`. Dropping the bus
/// aborts the background event-loop task.
pub struct MqttBus {
    client_id: String,
    channel_capacity: usize,
    client: Option<AsyncClient>,
    router: TopicRouter,
    poll_task: Option<JoinHandle<()>>,
}

impl MqttBus {
    /// Create a disconnected client
    pub fn new(client_id: impl Into<String>, channel_capacity: usize) -> Self {
        Self {
            client_id: client_id.into(),
            channel_capacity: channel_capacity.max(1),
            client: None,
            router: Arc::new(Mutex::new(HashMap::new())),
            poll_task: None,
        }
    }

    fn client(&self) -> Result<&AsyncClient, BusError> {
        self.client.as_ref().ok_or(BusError::NotConnected)
    }
}

impl BusClient for MqttBus {
    async fn connect(&mut self, host: &str, port: u16) -> Result<(), BusError> {
        let mut options = MqttOptions::new(&self.client_id, host, port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut event_loop) = AsyncClient::new(options, EVENT_QUEUE_CAPACITY);

        // First poll confirms the connection before we accept traffic
        match event_loop.poll().await {
            Ok(event) => debug!(?event, "mqtt connection established"),
            Err(e) => return Err(BusError::connection(host, port, e.to_string())),
        }

        let router = Arc::clone(&self.router);
        let poll_task = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let sender = {
                            let routes = router.lock().await;
                            routes.get(&publish.topic).cloned()
                        };
                        match sender {
                            Some(tx) => {
                                // Awaiting capacity stalls the event loop: a
                                // slow consumer throttles broker intake
                                if tx.send(publish.payload).await.is_err() {
                                    warn!(topic = %publish.topic, "subscription receiver dropped");
                                    router.lock().await.remove(&publish.topic);
                                }
                            }
                            None => {
                                debug!(topic = %publish.topic, "publish for topic without subscription");
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, "mqtt event loop error, retrying");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        self.client = Some(client);
        self.poll_task = Some(poll_task);

        info!(host = %host, port = port, client_id = %self.client_id, "mqtt bus connected");
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str) -> Result<mpsc::Receiver<Bytes>, BusError> {
        let client = self
            .client()
            .map_err(|_| BusError::subscribe(topic, "not connected"))?;

        client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| BusError::subscribe(topic, e.to_string()))?;

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        self.router.lock().await.insert(topic.to_string(), tx);

        debug!(topic = %topic, "mqtt subscription registered");
        Ok(rx)
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), BusError> {
        let client = self
            .client()
            .map_err(|_| BusError::publish(topic, "not connected"))?;

        client
            .publish(topic, QoS::AtLeastOnce, false, payload.to_vec())
            .await
            .map_err(|e| BusError::publish(topic, e.to_string()))
    }

    async fn disconnect(&mut self) -> Result<(), BusError> {
        if let Some(client) = self.client.take() {
            if let Err(e) = client.disconnect().await {
                warn!(error = %e, "mqtt disconnect request failed");
            }
        }
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        self.router.lock().await.clear();
        info!(client_id = %self.client_id, "mqtt bus disconnected");
        Ok(())
    }
}

impl Drop for MqttBus {
    fn drop(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }
}
