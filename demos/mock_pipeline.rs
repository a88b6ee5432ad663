//! Mock Pipeline Example
//!
//! Runs the full telemetry path in one process without a broker or a
//! database: synthetic generator -> memory bus -> consumer -> CSV.
//!
//! Run with: cargo run --bin mock_pipeline

use bus::{BusClient, MemoryBus};
use config_loader::ConfigLoader;
use contracts::TelemetryConfig;
use ingestion::Consumer;
use persistence::CsvSink;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Pipeline Demo");

    // ==== Stage 1: Use default config or load from file ====
    let config = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading configuration");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        TelemetryConfig::default()
    };

    // ==== Stage 2: In-process bus ====
    let mut bus = MemoryBus::with_capacity(config.consumer.channel_capacity);
    bus.connect(&config.broker.host, config.broker.port).await?;
    let payloads = bus.subscribe(&config.broker.topic).await?;

    // ==== Stage 3: Synthetic publisher ====
    let (publisher_stop_tx, publisher_stop_rx) = watch::channel(false);
    let publisher = {
        let bus = bus.clone();
        let topic = config.broker.topic.clone();
        let generator_config = config.generator;
        tokio::spawn(async move {
            generator::run_publisher(&bus, &topic, generator_config, publisher_stop_rx).await
        })
    };

    // ==== Stage 4: Consumer to CSV ====
    let sink = CsvSink::create(&config.storage.csv_path)?;
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let (stats, sink) = Consumer::new(sink, config.consumer.batch_threshold)
        .with_max_readings(50)
        .run(payloads, shutdown_rx)
        .await;

    publisher_stop_tx.send(true).ok();
    let published = publisher.await??;

    tracing::info!(
        published,
        persisted = stats.persisted,
        flushes = stats.flushes,
        artifact = %sink.path().display(),
        "Demo complete"
    );

    Ok(())
}
