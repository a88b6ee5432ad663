//! Configuration parsing module
//!
//! Supports TOML (primary) and JSON (optional) formats.

use contracts::{ConfigError, TelemetryConfig};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<TelemetryConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::parse(format!("TOML parse error: {e}")))
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<TelemetryConfig, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::parse(format!("JSON parse error: {e}")))
}

/// Parse configuration by format
pub fn parse(content: &str, format: ConfigFormat) -> Result<TelemetryConfig, ConfigError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}
