//! Configuration validation module
//!
//! Validation rules:
//! - broker host/topic/client_id non-empty, port > 0
//! - batch_threshold >= 1, channel_capacity >= 1
//! - generator interval_ms > 0, amplitude finite and within (0, π]
//! - csv_path non-empty, table a plain SQL identifier
//! - archive bucket/object_key non-empty when the section is present

use contracts::{ConfigError, TelemetryConfig};

/// Validate a TelemetryConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &TelemetryConfig) -> Result<(), ConfigError> {
    validate_broker(config)?;
    validate_consumer(config)?;
    validate_generator(config)?;
    validate_storage(config)?;
    validate_archive(config)?;
    Ok(())
}

fn validate_broker(config: &TelemetryConfig) -> Result<(), ConfigError> {
    let broker = &config.broker;
    if broker.host.is_empty() {
        return Err(ConfigError::validation(
            "broker.host",
            "host cannot be empty",
        ));
    }
    if broker.port == 0 {
        return Err(ConfigError::validation("broker.port", "port must be > 0"));
    }
    if broker.topic.is_empty() {
        return Err(ConfigError::validation(
            "broker.topic",
            "topic cannot be empty",
        ));
    }
    if broker.client_id.is_empty() {
        return Err(ConfigError::validation(
            "broker.client_id",
            "client_id cannot be empty",
        ));
    }
    Ok(())
}

fn validate_consumer(config: &TelemetryConfig) -> Result<(), ConfigError> {
    let consumer = &config.consumer;
    if consumer.batch_threshold == 0 {
        return Err(ConfigError::validation(
            "consumer.batch_threshold",
            "batch_threshold must be >= 1",
        ));
    }
    if consumer.channel_capacity == 0 {
        return Err(ConfigError::validation(
            "consumer.channel_capacity",
            "channel_capacity must be >= 1",
        ));
    }
    Ok(())
}

fn validate_generator(config: &TelemetryConfig) -> Result<(), ConfigError> {
    let generator = &config.generator;
    if generator.interval_ms == 0 {
        return Err(ConfigError::validation(
            "generator.interval_ms",
            "interval_ms must be > 0",
        ));
    }
    if !generator.amplitude.is_finite()
        || generator.amplitude <= 0.0
        || generator.amplitude > std::f64::consts::PI
    {
        return Err(ConfigError::validation(
            "generator.amplitude",
            format!(
                "amplitude must be finite and within (0, π], got {}",
                generator.amplitude
            ),
        ));
    }
    Ok(())
}

fn validate_storage(config: &TelemetryConfig) -> Result<(), ConfigError> {
    let storage = &config.storage;
    if storage.csv_path.is_empty() {
        return Err(ConfigError::validation(
            "storage.csv_path",
            "csv_path cannot be empty",
        ));
    }
    if storage.table.is_empty() {
        return Err(ConfigError::validation(
            "storage.table",
            "table cannot be empty",
        ));
    }
    // The table name is interpolated into DDL/DML, so it must be a plain
    // identifier
    if !is_sql_identifier(&storage.table) {
        return Err(ConfigError::validation(
            "storage.table",
            format!("'{}' is not a valid table identifier", storage.table),
        ));
    }
    Ok(())
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_archive(config: &TelemetryConfig) -> Result<(), ConfigError> {
    if let Some(archive) = &config.archive {
        if archive.bucket.is_empty() {
            return Err(ConfigError::validation(
                "archive.bucket",
                "bucket cannot be empty",
            ));
        }
        if archive.object_key.is_empty() {
            return Err(ConfigError::validation(
                "archive.object_key",
                "object_key cannot be empty",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ArchiveConfig;

    #[test]
    fn test_valid_default_config() {
        let config = TelemetryConfig::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_topic() {
        let mut config = TelemetryConfig::default();
        config.broker.topic = String::new();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("broker.topic"));
    }

    #[test]
    fn test_zero_threshold() {
        let mut config = TelemetryConfig::default();
        config.consumer.batch_threshold = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("batch_threshold"));
    }

    #[test]
    fn test_zero_interval() {
        let mut config = TelemetryConfig::default();
        config.generator.interval_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_amplitude() {
        let mut config = TelemetryConfig::default();
        config.generator.amplitude = f64::NAN;
        assert!(validate(&config).is_err());

        config.generator.amplitude = 4.0; // > π
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_table_must_be_identifier() {
        let mut config = TelemetryConfig::default();
        config.storage.table = "angles; drop table users".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("storage.table"));

        config.storage.table = "arm_joint_angles_v2".into();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_archive_bucket() {
        let mut config = TelemetryConfig::default();
        config.archive = Some(ArchiveConfig {
            bucket: String::new(),
            object_key: "angles.csv".into(),
        });
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("archive.bucket"));
    }
}
