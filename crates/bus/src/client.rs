//! Bus client abstraction
//!
//! Defines the trait for publish/subscribe transport, supporting a real MQTT
//! implementation and an in-process broker for tests.

use std::future::Future;

use bytes::Bytes;
use contracts::BusError;
use tokio::sync::mpsc;

/// Publish/subscribe transport trait
///
/// Abstracts the message bus so the pipeline can run against a real broker
/// or fully in-process. Delivery is at-least-once: subscribers may see
/// duplicates and must not assume ordering across messages.
pub trait BusClient: Send + Sync {
    /// Connect to the broker
    ///
    /// The only fatal failure at this layer: callers treat a connection
    /// error as unrecoverable.
    fn connect(&mut self, host: &str, port: u16) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Subscribe to a topic
    ///
    /// Returns a bounded receiver of raw payloads. The channel capacity is
    /// the backpressure depth: when the consumer stalls, delivery stalls
    /// with it instead of buffering unboundedly.
    fn subscribe(
        &mut self,
        topic: &str,
    ) -> impl Future<Output = Result<mpsc::Receiver<Bytes>, BusError>> + Send;

    /// Publish a payload to a topic
    fn publish(
        &self,
        topic: &str,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Disconnect from the broker, dropping all subscriptions
    fn disconnect(&mut self) -> impl Future<Output = Result<(), BusError>> + Send;
}
