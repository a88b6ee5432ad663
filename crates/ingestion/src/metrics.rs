//! Ingestion metric names and recording helpers

use std::time::Duration;

use contracts::{DecodeError, PersistError};
use metrics::{counter, histogram};

pub const READINGS_RECEIVED: &str = "telemetry_readings_received_total";
pub const READINGS_REJECTED: &str = "telemetry_readings_rejected_total";
pub const READINGS_PERSISTED: &str = "telemetry_readings_persisted_total";
pub const FLUSHES: &str = "telemetry_flushes_total";
pub const FLUSH_FAILURES: &str = "telemetry_flush_failures_total";
pub const FLUSH_BATCH_SIZE: &str = "telemetry_flush_batch_size";
pub const FLUSH_DURATION_MS: &str = "telemetry_flush_duration_ms";

pub fn record_received() {
    counter!(READINGS_RECEIVED).increment(1);
}

pub fn record_rejected(error: &DecodeError) {
    let reason = match error {
        DecodeError::Malformed { .. } => "malformed",
        DecodeError::MissingField { .. } => "missing_field",
        DecodeError::NotNumeric { .. } => "not_numeric",
        DecodeError::OutOfRange { .. } => "out_of_range",
        DecodeError::BadTimestamp { .. } => "bad_timestamp",
    };
    counter!(READINGS_REJECTED, "reason" => reason).increment(1);
}

pub fn record_flush(batch_size: usize, duration: Duration) {
    counter!(FLUSHES).increment(1);
    counter!(READINGS_PERSISTED).increment(batch_size as u64);
    histogram!(FLUSH_BATCH_SIZE).record(batch_size as f64);
    histogram!(FLUSH_DURATION_MS).record(duration.as_secs_f64() * 1000.0);
}

pub fn record_flush_failure(error: &PersistError) {
    counter!(FLUSH_FAILURES, "stage" => error.stage.to_string()).increment(1);
}
