//! # Generator
//!
//! Synthetic producer: emits one joint reading per tick onto the bus.
//! Each joint follows a sinusoid over a strictly increasing phase, offset
//! by the joint index so the six traces are out of step with each other.

use std::time::Duration;

use bytes::Bytes;
use bus::BusClient;
use chrono::Utc;
use contracts::{BusError, GeneratorConfig, JointReading};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Phase advance per published reading
const PHASE_STEP: f64 = 0.1;

/// Synthetic joint-angle source
///
/// Pure state machine: each call to `next_reading` advances the phase and
/// stamps the reading with the current wall clock.
pub struct AngleGenerator {
    amplitude: f64,
    phase: f64,
}

impl AngleGenerator {
    /// Create a generator from configuration
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            amplitude: config.amplitude,
            phase: 0.0,
        }
    }

    /// Produce the next reading and advance the phase
    pub fn next_reading(&mut self) -> JointReading {
        let t = self.phase;
        self.phase += PHASE_STEP;

        let angle = |i: usize| (t + i as f64).sin() * self.amplitude;

        JointReading {
            shoulder_pan: angle(0),
            shoulder_lift: angle(1),
            elbow: angle(2),
            wrist_1: angle(3),
            wrist_2: angle(4),
            wrist_3: angle(5),
            timestamp: Utc::now().naive_utc(),
        }
    }

    /// Current phase value
    pub fn phase(&self) -> f64 {
        self.phase
    }
}

/// Encode a reading as its wire payload (JSON mapping of seven fields)
pub fn encode_reading(reading: &JointReading) -> Bytes {
    // Serialization of a plain struct with string/number fields cannot fail
    Bytes::from(serde_json::to_vec(reading).unwrap_or_default())
}

/// Run the publish loop until shutdown
///
/// Publishes one encoded reading per `interval_ms` tick. Publish failures
/// are logged and skipped; the loop only stops on the shutdown signal.
/// Returns the number of readings published.
pub async fn run_publisher<B: BusClient>(
    bus: &B,
    topic: &str,
    config: GeneratorConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<u64, BusError> {
    let mut generator = AngleGenerator::new(&config);
    let mut interval = tokio::time::interval(Duration::from_millis(config.interval_ms));
    let mut published: u64 = 0;

    info!(
        topic = %topic,
        interval_ms = config.interval_ms,
        "generator publish loop started"
    );

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                break;
            }
            _ = interval.tick() => {
                let reading = generator.next_reading();
                let payload = encode_reading(&reading);

                match bus.publish(topic, payload).await {
                    Ok(()) => {
                        published += 1;
                        if published.is_multiple_of(100) {
                            debug!(published, "generator progress");
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "publish failed, reading skipped");
                    }
                }
            }
        }
    }

    info!(published, "generator publish loop stopped");
    Ok(published)
}
