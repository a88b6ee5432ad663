//! Consumer loop
//!
//! Single task that drains the subscription channel, decodes payloads, and
//! feeds the batch buffer. Exclusive ownership of the buffer is the
//! concurrency story: no other task can observe or mutate it mid-flush.

use bytes::Bytes;
use contracts::ReadingSink;
use observability::RunningStats;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::batch::BatchBuffer;
use crate::codec;
use crate::metrics;

/// Counters accumulated over one consumer run
#[derive(Debug, Clone, Default)]
pub struct ConsumerStats {
    /// Raw payloads pulled off the subscription channel
    pub received: u64,
    /// Payloads that decoded into valid readings
    pub decoded: u64,
    /// Payloads dropped by decode validation
    pub rejected: u64,
    /// Successful flushes (threshold-triggered and final drain)
    pub flushes: u64,
    /// Flush attempts that failed (batch retained each time)
    pub flush_failures: u64,
    /// Readings acknowledged by the sink
    pub persisted: u64,
    /// Whether the final drain flush succeeded (true for an empty buffer)
    pub drain_ok: bool,
    /// Per-flush batch size distribution
    pub batch_sizes: RunningStats,
}

/// Payload consumer driving a batch buffer
pub struct Consumer<S: ReadingSink> {
    buffer: BatchBuffer<S>,
    max_readings: Option<u64>,
}

impl<S: ReadingSink> Consumer<S> {
    /// Create a consumer flushing through `sink` past `batch_threshold`
    pub fn new(sink: S, batch_threshold: usize) -> Self {
        Self {
            buffer: BatchBuffer::new(sink, batch_threshold),
            max_readings: None,
        }
    }

    /// Stop after decoding this many readings (bounded runs, tests)
    pub fn with_max_readings(mut self, max: u64) -> Self {
        self.max_readings = Some(max);
        self
    }

    /// Run until shutdown, channel closure, or the reading limit
    ///
    /// Always ends with one final drain: buffered readings below the
    /// threshold are flushed on the way out, then the sink is closed.
    /// Returns the run counters and the closed sink.
    pub async fn run(
        mut self,
        mut payloads: mpsc::Receiver<Bytes>,
        mut shutdown: watch::Receiver<bool>,
    ) -> (ConsumerStats, S) {
        let mut stats = ConsumerStats::default();
        info!("consumer started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("shutdown signal received, draining");
                    break;
                }
                payload = payloads.recv() => {
                    let Some(payload) = payload else {
                        info!("subscription channel closed, draining");
                        break;
                    };
                    self.handle_payload(&payload, &mut stats).await;

                    if let Some(max) = self.max_readings {
                        if stats.decoded >= max {
                            info!(decoded = stats.decoded, "reading limit reached, draining");
                            break;
                        }
                    }
                }
            }
        }

        let (final_flush, sink) = self.buffer.drain().await;
        match final_flush {
            Ok(outcome) => {
                stats.drain_ok = true;
                if outcome.persisted > 0 {
                    stats.flushes += 1;
                    stats.persisted += outcome.persisted as u64;
                    stats.batch_sizes.push(outcome.persisted as f64);
                }
            }
            Err(e) => {
                stats.flush_failures += 1;
                warn!(error = %e, "final drain flush failed, buffered readings lost");
            }
        }

        info!(
            received = stats.received,
            decoded = stats.decoded,
            rejected = stats.rejected,
            persisted = stats.persisted,
            flushes = stats.flushes,
            flush_failures = stats.flush_failures,
            "consumer stopped"
        );
        (stats, sink)
    }

    async fn handle_payload(&mut self, payload: &[u8], stats: &mut ConsumerStats) {
        stats.received += 1;
        metrics::record_received();

        let reading = match codec::decode_reading(payload) {
            Ok(reading) => reading,
            Err(e) => {
                stats.rejected += 1;
                metrics::record_rejected(&e);
                warn!(error = %e, "payload rejected");
                return;
            }
        };

        stats.decoded += 1;
        debug!(
            timestamp = %reading.wire_timestamp(),
            buffered = self.buffer.len() + 1,
            "reading buffered"
        );

        match self.buffer.append(reading).await {
            Ok(Some(outcome)) => {
                stats.flushes += 1;
                stats.persisted += outcome.persisted as u64;
                stats.batch_sizes.push(outcome.persisted as f64);
            }
            Ok(None) => {}
            Err(_) => {
                // Already logged by the buffer; the batch is retained and the
                // next threshold crossing retries it
                stats.flush_failures += 1;
            }
        }
    }
}
