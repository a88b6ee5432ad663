//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    broker: String,
    topic: String,
    batch_threshold: usize,
    csv_path: String,
    table_sink: bool,
    archive: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    broker: format!("{}:{}", config.broker.host, config.broker.port),
                    topic: config.broker.topic.clone(),
                    batch_threshold: config.consumer.batch_threshold,
                    csv_path: config.storage.csv_path.clone(),
                    table_sink: config.storage.effective_database_url().is_some(),
                    archive: config.archive.is_some(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &contracts::TelemetryConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.storage.effective_database_url().is_none() {
        warnings.push(
            "No database URL configured - readings will only reach the CSV artifact".to_string(),
        );
    }

    if let Some(archive) = &config.archive {
        let missing: Vec<&str> = ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"]
            .into_iter()
            .filter(|var| std::env::var(var).is_err())
            .collect();
        if !missing.is_empty() {
            warnings.push(format!(
                "Archive bucket '{}' configured but {} not set - upload will be skipped",
                archive.bucket,
                missing.join(", ")
            ));
        }
    }

    if config.generator.interval_ms < 10 {
        warnings.push(format!(
            "generator.interval_ms = {} is very aggressive for a synthetic source",
            config.generator.interval_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Broker: {}", summary.broker);
            println!("  Topic: {}", summary.topic);
            println!("  Batch threshold: {}", summary.batch_threshold);
            println!("  CSV artifact: {}", summary.csv_path);
            println!("  Table sink: {}", if summary.table_sink { "enabled" } else { "disabled" });
            println!("  Archive: {}", if summary.archive { "configured" } else { "disabled" });
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
