//! TelemetryConfig - Config Loader output
//!
//! Describes the complete pipeline configuration: broker, consumer policy,
//! producer cadence, storage targets, optional shutdown archive.

use serde::{Deserialize, Serialize};

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Message broker settings
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Consumer buffering policy
    #[serde(default)]
    pub consumer: ConsumerConfig,

    /// Synthetic producer settings
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Persistence targets
    #[serde(default)]
    pub storage: StorageConfig,

    /// Shutdown archive target (optional)
    #[serde(default)]
    pub archive: Option<ArchiveConfig>,
}

/// Message broker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker host
    #[serde(default = "default_broker_host")]
    pub host: String,

    /// Broker port
    #[serde(default = "default_broker_port")]
    pub port: u16,

    /// Topic carrying joint readings
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Client identifier presented to the broker
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_broker_host(),
            port: default_broker_port(),
            topic: default_topic(),
            client_id: default_client_id(),
        }
    }
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    1883
}

fn default_topic() -> String {
    "arm/joint_angles".to_string()
}

fn default_client_id() -> String {
    "arm-telemetry".to_string()
}

/// Consumer buffering policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Flush triggers strictly when batch size exceeds this
    #[serde(default = "default_batch_threshold")]
    pub batch_threshold: usize,

    /// Bounded delivery channel capacity (backpressure depth)
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            batch_threshold: default_batch_threshold(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_batch_threshold() -> usize {
    10
}

fn default_channel_capacity() -> usize {
    100
}

/// Synthetic producer settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Publish interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Sinusoid amplitude in radians
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            amplitude: default_amplitude(),
        }
    }
}

fn default_interval_ms() -> u64 {
    100
}

fn default_amplitude() -> f64 {
    std::f64::consts::FRAC_PI_4
}

/// Persistence targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the append-only CSV artifact
    #[serde(default = "default_csv_path")]
    pub csv_path: String,

    /// Postgres connection URL; `DATABASE_URL` env wins when set.
    /// When absent entirely, the table sink is disabled.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Relational table name
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            database_url: None,
            table: default_table(),
        }
    }
}

fn default_csv_path() -> String {
    "arm_joint_angles.csv".to_string()
}

fn default_table() -> String {
    "arm_joint_angles".to_string()
}

/// Shutdown archive target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Object-storage bucket
    pub bucket: String,

    /// Fixed object key; an existing object is overwritten
    #[serde(default = "default_object_key")]
    pub object_key: String,
}

fn default_object_key() -> String {
    "arm_joint_angles.csv".to_string()
}

impl StorageConfig {
    /// Effective database URL: environment overrides configuration
    pub fn effective_database_url(&self) -> Option<String> {
        std::env::var("DATABASE_URL")
            .ok()
            .or_else(|| self.database_url.clone())
    }
}
