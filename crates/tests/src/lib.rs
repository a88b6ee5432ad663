//! # Integration Tests
//!
//! End-to-end tests over the in-process bus: publisher to consumer to
//! sinks, with no broker or database required.

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use bus::{BusClient, MemoryBus};
    use bytes::Bytes;
    use contracts::GeneratorConfig;
    use ingestion::Consumer;
    use object_store::ObjectStore;
    use persistence::{Archiver, CsvSink, DualSink, PostgresSink};
    use tempfile::tempdir;
    use tokio::sync::watch;

    const TOPIC: &str = "arm/joint_angles";

    fn fast_generator() -> GeneratorConfig {
        GeneratorConfig {
            interval_ms: 1,
            ..Default::default()
        }
    }

    /// Full mock pipeline: generator -> memory bus -> consumer -> CSV.
    #[tokio::test]
    async fn test_e2e_generator_to_csv() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("angles.csv");

        let mut bus = MemoryBus::new();
        bus.connect("localhost", 1883).await.unwrap();
        let payloads = bus.subscribe(TOPIC).await.unwrap();

        let (publisher_stop_tx, publisher_stop_rx) = watch::channel(false);
        let publisher = {
            let bus = bus.clone();
            tokio::spawn(async move {
                generator::run_publisher(&bus, TOPIC, fast_generator(), publisher_stop_rx).await
            })
        };

        let sink = CsvSink::create(&csv_path).unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (stats, sink) = Consumer::new(sink, 10)
            .with_max_readings(25)
            .run(payloads, shutdown_rx)
            .await;

        publisher_stop_tx.send(true).unwrap();
        publisher.await.unwrap().unwrap();

        // Threshold 10 flushes at 11 and 22; the drain carries the last 3
        assert_eq!(stats.decoded, 25);
        assert_eq!(stats.persisted, 25);
        assert_eq!(stats.flushes, 3);
        assert_eq!(sink.rows_written(), 25);

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 26);
        assert_eq!(
            lines[0],
            "shoulder_pan,shoulder_lift,elbow,wrist_1,wrist_2,wrist_3,timestamp"
        );
    }

    /// Shutdown before the threshold: the partial batch must still land.
    #[tokio::test]
    async fn test_e2e_shutdown_drains_partial_batch() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("angles.csv");

        let mut bus = MemoryBus::new();
        bus.connect("localhost", 1883).await.unwrap();
        let payloads = bus.subscribe(TOPIC).await.unwrap();

        let mut gen = generator::AngleGenerator::new(&GeneratorConfig::default());
        for _ in 0..7 {
            bus.publish(TOPIC, generator::encode_reading(&gen.next_reading()))
                .await
                .unwrap();
        }

        let sink = CsvSink::create(&csv_path).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let consumer = tokio::spawn(Consumer::new(sink, 10).run(payloads, shutdown_rx));

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        let (stats, sink) = consumer.await.unwrap();

        assert_eq!(stats.received, 7);
        assert_eq!(stats.persisted, 7);
        assert_eq!(stats.flushes, 1);
        assert_eq!(sink.rows_written(), 7);
    }

    /// Malformed payloads on the topic are dropped without stopping the run.
    #[tokio::test]
    async fn test_e2e_bad_payloads_do_not_stop_pipeline() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("angles.csv");

        let mut bus = MemoryBus::new();
        bus.connect("localhost", 1883).await.unwrap();
        let payloads = bus.subscribe(TOPIC).await.unwrap();

        let mut gen = generator::AngleGenerator::new(&GeneratorConfig::default());
        bus.publish(TOPIC, generator::encode_reading(&gen.next_reading()))
            .await
            .unwrap();
        bus.publish(TOPIC, Bytes::from_static(b"garbage")).await.unwrap();
        bus.publish(TOPIC, Bytes::from_static(b"{\"shoulder_pan\": 9.9}"))
            .await
            .unwrap();
        bus.publish(TOPIC, generator::encode_reading(&gen.next_reading()))
            .await
            .unwrap();
        drop(bus); // closes the channel once delivered payloads are consumed

        let sink = CsvSink::create(&csv_path).unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (stats, sink) = Consumer::new(sink, 10)
            .with_max_readings(2)
            .run(payloads, shutdown_rx)
            .await;

        assert_eq!(stats.received, 4);
        assert_eq!(stats.decoded, 2);
        assert_eq!(stats.rejected, 2);
        assert_eq!(sink.rows_written(), 2);
    }

    /// File-only dual sink (no database configured) behaves as the CSV sink.
    #[tokio::test]
    async fn test_e2e_dual_sink_file_only() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("angles.csv");

        let mut bus = MemoryBus::new();
        bus.connect("localhost", 1883).await.unwrap();
        let payloads = bus.subscribe(TOPIC).await.unwrap();

        let mut gen = generator::AngleGenerator::new(&GeneratorConfig::default());
        for _ in 0..12 {
            bus.publish(TOPIC, generator::encode_reading(&gen.next_reading()))
                .await
                .unwrap();
        }

        let dual: DualSink<CsvSink, PostgresSink> =
            DualSink::new(CsvSink::create(&csv_path).unwrap(), None);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (stats, sink) = Consumer::new(dual, 10)
            .with_max_readings(12)
            .run(payloads, shutdown_rx)
            .await;

        assert!(!sink.has_table());
        assert_eq!(stats.persisted, 12);
        assert_eq!(sink.file().rows_written(), 12);
    }

    /// After a run, the artifact can be archived to object storage.
    #[tokio::test]
    async fn test_e2e_archive_after_run() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("angles.csv");

        let mut bus = MemoryBus::new();
        bus.connect("localhost", 1883).await.unwrap();
        let payloads = bus.subscribe(TOPIC).await.unwrap();

        let mut gen = generator::AngleGenerator::new(&GeneratorConfig::default());
        for _ in 0..3 {
            bus.publish(TOPIC, generator::encode_reading(&gen.next_reading()))
                .await
                .unwrap();
        }

        let sink = CsvSink::create(&csv_path).unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (_stats, _sink) = Consumer::new(sink, 10)
            .with_max_readings(3)
            .run(payloads, shutdown_rx)
            .await;

        let store = Arc::new(object_store::memory::InMemory::new());
        let archiver = Archiver::new(store.clone(), "telemetry", "angles.csv");
        archiver.archive(&csv_path).await.unwrap();

        let local = std::fs::read(&csv_path).unwrap();
        let stored = store
            .get(&object_store::path::Path::from("angles.csv"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(&stored[..], &local[..]);
    }
}

#[cfg(test)]
mod config_tests {
    use tempfile::tempdir;

    /// Config file on disk to a validated runtime configuration.
    #[test]
    fn test_config_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[broker]
host = "broker.lab"
topic = "arm/joint_angles"

[consumer]
batch_threshold = 5

[storage]
csv_path = "/tmp/run.csv"

[archive]
bucket = "lab-telemetry"
"#,
        )
        .unwrap();

        let config = config_loader::ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.broker.host, "broker.lab");
        assert_eq!(config.broker.port, 1883); // default survives partial files
        assert_eq!(config.consumer.batch_threshold, 5);
        assert_eq!(config.archive.unwrap().bucket, "lab-telemetry");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[consumer]\nbatch_threshold = 0\n").unwrap();

        assert!(config_loader::ConfigLoader::load_from_path(&path).is_err());
    }
}
