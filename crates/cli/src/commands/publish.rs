//! `publish` command implementation.
//!
//! Standalone producer process: connects to the broker and emits synthetic
//! readings until interrupted. Requires the `real-mqtt` feature; in mock
//! builds the `run` command already embeds the publisher.

use anyhow::Result;

use crate::cli::PublishArgs;

#[cfg(feature = "real-mqtt")]
pub async fn run_publish(args: &PublishArgs) -> Result<()> {
    use anyhow::Context;
    use bus::{BusClient, MqttBus};
    use tokio::sync::watch;
    use tracing::{info, warn};

    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(
            crate::error::CliError::config_not_found(args.config.display().to_string()).into(),
        );
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(ref host) = args.host {
        config.broker.host = host.clone();
    }
    if let Some(port) = args.port {
        config.broker.port = port;
    }
    if let Some(ref topic) = args.topic {
        config.broker.topic = topic.clone();
    }
    if let Some(interval_ms) = args.interval_ms {
        config.generator.interval_ms = interval_ms;
    }

    let client_id = format!("{}-publisher", config.broker.client_id);
    let mut bus = MqttBus::new(&client_id, config.consumer.channel_capacity);
    bus.connect(&config.broker.host, config.broker.port)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to broker at {}:{}",
                config.broker.host, config.broker.port
            )
        })?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        super::run::wait_for_shutdown_signal().await;
        warn!("Received shutdown signal, stopping publisher...");
        shutdown_tx.send(true).ok();
    });

    let published = generator::run_publisher(
        &bus,
        &config.broker.topic,
        config.generator,
        shutdown_rx,
    )
    .await?;

    if let Err(e) = bus.disconnect().await {
        warn!(error = %e, "Broker disconnect failed");
    }

    info!(published, "Publisher finished");
    Ok(())
}

#[cfg(not(feature = "real-mqtt"))]
pub async fn run_publish(_args: &PublishArgs) -> Result<()> {
    anyhow::bail!(
        "The publish command requires the 'real-mqtt' feature; \
         mock builds embed the publisher in 'run'"
    )
}
