//! Pipeline orchestrator - coordinates bus, consumer, sinks, and archive.
//!
//! Supports a real MQTT broker and an in-process mock mode via feature
//! flags. When the `real-mqtt` feature is disabled, the pipeline runs the
//! synthetic publisher and the consumer in one process over a memory bus.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bus::BusClient;
use bytes::Bytes;
use contracts::{ArchiveError, TelemetryConfig};
use ingestion::Consumer;
use persistence::{Archiver, CsvSink, DualSink, PostgresSink};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The telemetry configuration
    pub config: TelemetryConfig,

    /// Maximum number of readings to consume (None = unlimited)
    pub max_readings: Option<u64>,

    /// Pipeline timeout; expiry drains like a shutdown signal (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline until shutdown or completion
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<PipelineStats> {
        #[cfg(feature = "real-mqtt")]
        return self.run_real(shutdown).await;

        #[cfg(not(feature = "real-mqtt"))]
        return self.run_mock(shutdown).await;
    }

    /// Run against a real MQTT broker (consumer only; see `publish` for the producer)
    #[cfg(feature = "real-mqtt")]
    async fn run_real(self, shutdown: watch::Receiver<bool>) -> Result<PipelineStats> {
        use bus::MqttBus;

        let start_time = Instant::now();
        let config = &self.config.config;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
        }

        info!(
            host = %config.broker.host,
            port = config.broker.port,
            "Connecting to MQTT broker..."
        );

        let mut bus = MqttBus::new(&config.broker.client_id, config.consumer.channel_capacity);
        bus.connect(&config.broker.host, config.broker.port)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to broker at {}:{}",
                    config.broker.host, config.broker.port
                )
            })?;

        let payloads = bus
            .subscribe(&config.broker.topic)
            .await
            .context("Failed to subscribe to topic")?;

        info!(topic = %config.broker.topic, "Subscribed, pipeline running (MQTT mode)");

        let stats = self.run_consumer(payloads, shutdown, start_time).await?;

        if let Err(e) = bus.disconnect().await {
            warn!(error = %e, "Broker disconnect failed");
        }

        Ok(stats)
    }

    /// Run fully in-process: embedded publisher over a memory bus
    #[cfg(not(feature = "real-mqtt"))]
    async fn run_mock(self, shutdown: watch::Receiver<bool>) -> Result<PipelineStats> {
        use bus::MemoryBus;

        let start_time = Instant::now();
        let config = &self.config.config;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
        }

        info!("Running in MOCK mode (no broker required)");

        let mut bus = MemoryBus::with_capacity(config.consumer.channel_capacity);
        bus.connect(&config.broker.host, config.broker.port)
            .await
            .context("Failed to initialize memory bus")?;

        let payloads = bus
            .subscribe(&config.broker.topic)
            .await
            .context("Failed to subscribe to topic")?;

        // Embedded publisher with its own stop signal, released once the
        // consumer has finished
        let (publisher_stop_tx, publisher_stop_rx) = watch::channel(false);
        let publisher = {
            let bus = bus.clone();
            let topic = config.broker.topic.clone();
            let generator_config = config.generator;
            tokio::spawn(async move {
                generator::run_publisher(&bus, &topic, generator_config, publisher_stop_rx).await
            })
        };

        info!(topic = %config.broker.topic, "Pipeline running (MOCK mode)");

        let stats = self.run_consumer(payloads, shutdown, start_time).await;

        publisher_stop_tx.send(true).ok();
        match publisher.await {
            Ok(Ok(published)) => info!(published, "Embedded publisher stopped"),
            Ok(Err(e)) => warn!(error = %e, "Embedded publisher failed"),
            Err(e) => warn!(error = %e, "Embedded publisher panicked"),
        }

        stats
    }

    /// Consumer side shared between broker and mock modes
    async fn run_consumer(
        &self,
        payloads: mpsc::Receiver<Bytes>,
        shutdown: watch::Receiver<bool>,
        start_time: Instant,
    ) -> Result<PipelineStats> {
        let config = &self.config.config;

        // File sink first: a run that cannot create its artifact should not
        // consume anything
        let csv = CsvSink::create(&config.storage.csv_path)
            .with_context(|| format!("Failed to create CSV artifact '{}'", config.storage.csv_path))?;
        let csv_path = csv.path().to_path_buf();

        let table = match config.storage.effective_database_url() {
            Some(url) => {
                let sink = PostgresSink::connect(&url, &config.storage.table)
                    .await
                    .context("Failed to connect to database")?;
                Some(sink)
            }
            None => {
                warn!("No database URL configured, table sink disabled");
                None
            }
        };

        info!(
            csv_path = %csv_path.display(),
            table_sink = table.is_some(),
            batch_threshold = config.consumer.batch_threshold,
            "Persistence configured"
        );

        let sink = DualSink::new(csv, table);
        let mut consumer = Consumer::new(sink, config.consumer.batch_threshold);
        if let Some(max) = self.config.max_readings {
            consumer = consumer.with_max_readings(max);
        }

        let shutdown = with_timeout(shutdown, self.config.timeout);
        let (consumer_stats, _sink) = consumer.run(payloads, shutdown).await;

        // Only a fully drained run produces a complete artifact worth uploading
        let archived = if consumer_stats.drain_ok {
            self.archive_artifact(&csv_path).await
        } else {
            warn!("Final drain failed, archive skipped");
            false
        };

        Ok(PipelineStats {
            consumer: consumer_stats,
            duration: start_time.elapsed(),
            archived,
        })
    }

    /// Upload the finished artifact if an archive target is configured
    ///
    /// Never fails the run: missing credentials or an unreachable store
    /// downgrade to warnings, local persistence already succeeded.
    async fn archive_artifact(&self, csv_path: &std::path::Path) -> bool {
        let Some(archive_config) = &self.config.config.archive else {
            return false;
        };

        let archiver = match Archiver::from_env(archive_config) {
            Ok(archiver) => archiver,
            Err(ArchiveError::Setup { message }) => {
                warn!(reason = %message, "Archive skipped");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Archive skipped");
                return false;
            }
        };

        match archiver.archive(csv_path).await {
            Ok(()) => {
                info!(bucket = %archive_config.bucket, "Artifact archived");
                true
            }
            Err(e) => {
                warn!(error = %e, "Archive upload failed");
                false
            }
        }
    }
}

/// Derive a shutdown receiver that also fires after `timeout`
fn with_timeout(
    mut external: watch::Receiver<bool>,
    timeout: Option<Duration>,
) -> watch::Receiver<bool> {
    let Some(timeout) = timeout else {
        return external;
    };

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::select! {
            _ = external.changed() => {}
            _ = tokio::time::sleep(timeout) => {
                warn!(timeout_secs = timeout.as_secs(), "Pipeline timeout reached, draining");
            }
        }
        tx.send(true).ok();
    });
    rx
}
