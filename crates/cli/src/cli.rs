//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Arm Telemetry - joint-angle ingestion and persistence pipeline
#[derive(Parser, Debug)]
#[command(
    name = "arm-telemetry",
    author,
    version,
    about = "Robot arm joint-angle telemetry pipeline",
    long_about = "Ingestion pipeline for six-joint arm telemetry.\n\n\
                  Subscribes to joint-angle readings on a message bus, batches \n\
                  them, and persists to a CSV artifact and a relational table, \n\
                  with an optional object-storage archive on shutdown."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ARM_TELEMETRY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "ARM_TELEMETRY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the consumer pipeline
    Run(RunArgs),

    /// Publish synthetic joint readings onto the bus
    Publish(PublishArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Create the readings table in the configured database
    InitDb(InitDbArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "ARM_TELEMETRY_CONFIG"
    )]
    pub config: PathBuf,

    /// Override broker host from configuration
    #[arg(long, env = "MQTT_HOST")]
    pub host: Option<String>,

    /// Override broker port from configuration
    #[arg(long, env = "MQTT_PORT")]
    pub port: Option<u16>,

    /// Override subscription topic from configuration
    #[arg(long, env = "MQTT_TOPIC")]
    pub topic: Option<String>,

    /// Maximum number of readings to consume (0 = unlimited)
    #[arg(long, default_value = "0", env = "ARM_TELEMETRY_MAX_READINGS")]
    pub max_readings: u64,

    /// Pipeline timeout in seconds, drains on expiry (0 = no timeout)
    #[arg(long, default_value = "0", env = "ARM_TELEMETRY_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "ARM_TELEMETRY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `publish` command
#[derive(Parser, Debug, Clone)]
pub struct PublishArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "ARM_TELEMETRY_CONFIG"
    )]
    pub config: PathBuf,

    /// Override broker host from configuration
    #[arg(long, env = "MQTT_HOST")]
    pub host: Option<String>,

    /// Override broker port from configuration
    #[arg(long, env = "MQTT_PORT")]
    pub port: Option<u16>,

    /// Override publish topic from configuration
    #[arg(long, env = "MQTT_TOPIC")]
    pub topic: Option<String>,

    /// Override publish interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `init-db` command
#[derive(Parser, Debug)]
pub struct InitDbArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Print the DDL without connecting
    #[arg(long)]
    pub show_sql: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_broker_overrides_parse() {
        let cli = Cli::parse_from([
            "arm-telemetry",
            "run",
            "--host",
            "broker.local",
            "--port",
            "1884",
            "--topic",
            "arm/joint_angles_alt",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.host.as_deref(), Some("broker.local"));
        assert_eq!(args.port, Some(1884));
        assert_eq!(args.topic.as_deref(), Some("arm/joint_angles_alt"));
    }
}
