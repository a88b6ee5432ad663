//! # Bus
//!
//! Message-bus client layer.
//!
//! Responsibilities:
//! - `BusClient` trait: the narrow transport interface the pipeline uses
//! - `MemoryBus`: in-process broker for tests and broker-less runs
//! - `MqttBus`: rumqttc-backed client (behind the `real-mqtt` feature)

mod client;
mod memory;
#[cfg(feature = "real-mqtt")]
mod mqtt;

pub use client::BusClient;
pub use contracts::BusError;
pub use memory::MemoryBus;
#[cfg(feature = "real-mqtt")]
pub use mqtt::MqttBus;
