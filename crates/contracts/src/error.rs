//! Layered error definitions
//!
//! Categorized by source: config / decode / persist / archive / bus.
//! Every error here is recoverable at the consumer level except the initial
//! bus connection, which the orchestrator treats as fatal.

use thiserror::Error;

/// Configuration error (parse or semantic validation)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration parse error
    #[error("config parse error: {message}")]
    Parse { message: String },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    Validation { field: String, message: String },

    /// IO error reading the config file
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create a configuration parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a configuration validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Payload decode/validation error
///
/// A rejected payload is dropped and counted; it never reaches the batch.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not a well-formed mapping
    #[error("malformed payload: {message}")]
    Malformed { message: String },

    /// Required field absent
    #[error("missing field '{field}'")]
    MissingField { field: &'static str },

    /// Field present but not a number
    #[error("field '{field}' is not numeric")]
    NotNumeric { field: &'static str },

    /// Angle outside [-π, π] (or non-finite)
    #[error("field '{field}' out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    /// Timestamp missing or unparseable
    #[error("bad timestamp: {message}")]
    BadTimestamp { message: String },
}

impl DecodeError {
    /// Create a malformed-payload error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create a bad-timestamp error
    pub fn bad_timestamp(message: impl Into<String>) -> Self {
        Self::BadTimestamp {
            message: message.into(),
        }
    }
}

/// Which half of the dual write failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStage {
    /// Append-only file artifact
    File,
    /// Relational table
    Table,
}

impl std::fmt::Display for SinkStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Table => write!(f, "table"),
        }
    }
}

/// Persistence failure
///
/// The batch is retained by the caller for retry; this is never fatal to
/// the consumer process.
#[derive(Debug, Error)]
#[error("persist failed at {stage} stage for sink '{sink_name}': {message}")]
pub struct PersistError {
    /// Stage that failed
    pub stage: SinkStage,
    /// Sink name (for logging)
    pub sink_name: String,
    /// Underlying cause
    pub message: String,
}

impl PersistError {
    /// File-stage failure
    pub fn file(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: SinkStage::File,
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Table-stage failure
    pub fn table(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: SinkStage::Table,
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Re-stage an error from a wrapped sub-sink
    pub fn with_stage(mut self, stage: SinkStage) -> Self {
        self.stage = stage;
        self
    }
}

/// Object-storage upload failure (non-fatal, shutdown-only path)
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Local file artifact could not be read
    #[error("cannot read local artifact '{path}': {message}")]
    LocalRead { path: String, message: String },

    /// Upload to object storage failed
    #[error("upload to bucket '{bucket}' failed: {message}")]
    Upload { bucket: String, message: String },

    /// Object store client could not be built
    #[error("object store setup failed: {message}")]
    Setup { message: String },
}

/// Message-bus transport error
#[derive(Debug, Error)]
pub enum BusError {
    /// Initial connection failed (the only fatal condition at this layer)
    #[error("bus connection to {host}:{port} failed: {message}")]
    Connection {
        host: String,
        port: u16,
        message: String,
    },

    /// Subscribe request failed
    #[error("subscribe to '{topic}' failed: {message}")]
    Subscribe { topic: String, message: String },

    /// Publish request failed
    #[error("publish to '{topic}' failed: {message}")]
    Publish { topic: String, message: String },

    /// Client used before `connect`
    #[error("bus client not connected")]
    NotConnected,
}

impl BusError {
    /// Create a connection error
    pub fn connection(host: impl Into<String>, port: u16, message: impl Into<String>) -> Self {
        Self::Connection {
            host: host.into(),
            port,
            message: message.into(),
        }
    }

    /// Create a subscribe error
    pub fn subscribe(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscribe {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create a publish error
    pub fn publish(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            topic: topic.into(),
            message: message.into(),
        }
    }
}
