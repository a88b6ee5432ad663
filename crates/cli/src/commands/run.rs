//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding broker host from CLI");
        config.broker.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding broker port from CLI");
        config.broker.port = port;
    }
    if let Some(ref topic) = args.topic {
        info!(topic = %topic, "Overriding subscription topic from CLI");
        config.broker.topic = topic.clone();
    }

    info!(
        broker = format!("{}:{}", config.broker.host, config.broker.port),
        topic = %config.broker.topic,
        batch_threshold = config.consumer.batch_threshold,
        csv_path = %config.storage.csv_path,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        config,
        max_readings: if args.max_readings == 0 {
            None
        } else {
            Some(args.max_readings)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let pipeline = Pipeline::new(pipeline_config);

    // Signal handling feeds the same shutdown path the pipeline drains on,
    // so Ctrl+C still flushes the partial batch
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        warn!("Received shutdown signal, draining pipeline...");
        shutdown_tx.send(true).ok();
    });

    info!("Starting pipeline...");

    let stats = pipeline
        .run(shutdown_rx)
        .await
        .context("Pipeline execution failed")?;

    info!(
        persisted = stats.consumer.persisted,
        rejected = stats.consumer.rejected,
        duration_secs = stats.duration.as_secs_f64(),
        throughput = format!("{:.2}", stats.throughput()),
        "Pipeline completed"
    );

    stats.print_summary();

    info!("Arm Telemetry finished");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
pub(crate) async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::TelemetryConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Broker:");
    println!("  Address: {}:{}", config.broker.host, config.broker.port);
    println!("  Topic: {}", config.broker.topic);
    println!("  Client ID: {}", config.broker.client_id);

    println!("\nConsumer:");
    println!("  Batch threshold: {}", config.consumer.batch_threshold);
    println!("  Channel capacity: {}", config.consumer.channel_capacity);

    println!("\nStorage:");
    println!("  CSV artifact: {}", config.storage.csv_path);
    match config.storage.effective_database_url() {
        Some(_) => println!("  Table: {}", config.storage.table),
        None => println!("  Table: disabled (no database URL)"),
    }

    match &config.archive {
        Some(archive) => println!(
            "\nArchive: s3://{}/{}",
            archive.bucket, archive.object_key
        ),
        None => println!("\nArchive: disabled"),
    }

    println!();
}
