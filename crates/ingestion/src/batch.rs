//! Threshold-driven batch buffer
//!
//! Accumulates decoded readings and flushes them to the sink in arrival
//! order once the batch size strictly exceeds the threshold. On a failed
//! flush the batch is retained and retried by the next trigger, so a
//! transient sink outage delays persistence instead of losing data.

use contracts::{JointReading, PersistError, ReadingSink};
use tracing::{debug, instrument, warn};

use crate::metrics;

/// Buffer lifecycle state
///
/// Guards against re-entrant flushing: appends are rejected only by
/// construction (the owning task never appends mid-flush), and the state
/// makes that invariant checkable in debug builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Accepting appends
    Accepting,
    /// A flush is in progress
    Flushing,
}

/// Result of one flush attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushOutcome {
    /// Readings handed to the sink and acknowledged
    pub persisted: usize,
}

/// Order-preserving batch accumulator over a persistence sink
pub struct BatchBuffer<S: ReadingSink> {
    readings: Vec<JointReading>,
    threshold: usize,
    state: BufferState,
    sink: S,
}

impl<S: ReadingSink> BatchBuffer<S> {
    /// Create a buffer flushing through `sink` when size exceeds `threshold`
    pub fn new(sink: S, threshold: usize) -> Self {
        Self {
            readings: Vec::with_capacity(threshold + 1),
            threshold,
            state: BufferState::Accepting,
            sink,
        }
    }

    /// Buffered reading count
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Current lifecycle state
    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Append one reading, flushing inline when the threshold is exceeded
    ///
    /// The threshold check is strict: a batch of exactly `threshold`
    /// readings stays buffered until one more arrives.
    pub async fn append(&mut self, reading: JointReading) -> Result<Option<FlushOutcome>, PersistError> {
        debug_assert_eq!(self.state, BufferState::Accepting);
        self.readings.push(reading);

        if self.readings.len() > self.threshold {
            return self.flush().await.map(Some);
        }
        Ok(None)
    }

    /// Flush whatever is buffered, regardless of threshold
    ///
    /// A failed flush retains the batch intact for the next attempt.
    #[instrument(skip(self), fields(batch_size = self.readings.len()))]
    pub async fn flush(&mut self) -> Result<FlushOutcome, PersistError> {
        if self.readings.is_empty() {
            return Ok(FlushOutcome { persisted: 0 });
        }

        self.state = BufferState::Flushing;
        let started = std::time::Instant::now();
        let result = self.sink.persist(&self.readings).await;
        self.state = BufferState::Accepting;

        match result {
            Ok(()) => {
                let persisted = self.readings.len();
                self.readings.clear();
                metrics::record_flush(persisted, started.elapsed());
                debug!(persisted, "batch flushed");
                Ok(FlushOutcome { persisted })
            }
            Err(e) => {
                metrics::record_flush_failure(&e);
                warn!(
                    retained = self.readings.len(),
                    error = %e,
                    "flush failed, batch retained for retry"
                );
                Err(e)
            }
        }
    }

    /// Final drain: flush the remainder and close the sink
    ///
    /// Consumes the buffer. The sink is closed even when the last flush
    /// fails, and the flush error wins over a close error.
    pub async fn drain(mut self) -> (Result<FlushOutcome, PersistError>, S) {
        let flushed = self.flush().await;
        if let Err(e) = self.sink.close().await {
            warn!(error = %e, "sink close failed during drain");
        }
        (flushed, self.sink)
    }

    /// Access the underlying sink
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn reading(i: u32) -> JointReading {
        JointReading {
            shoulder_pan: f64::from(i),
            shoulder_lift: 0.0,
            elbow: 0.0,
            wrist_1: 0.0,
            wrist_2: 0.0,
            wrist_3: 0.0,
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_micro_opt(0, 0, i, 0)
                .unwrap(),
        }
    }

    /// Records every batch it receives; fails the first `fail_next` calls.
    struct RecordingSink {
        batches: Vec<Vec<JointReading>>,
        fail_next: Arc<AtomicUsize>,
        closed: bool,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                batches: Vec::new(),
                fail_next: Arc::new(AtomicUsize::new(0)),
                closed: false,
            }
        }

        fn failing(times: usize) -> Self {
            let sink = Self::new();
            sink.fail_next.store(times, Ordering::SeqCst);
            sink
        }
    }

    impl ReadingSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn persist(&mut self, batch: &[JointReading]) -> Result<(), PersistError> {
            if self.fail_next.load(Ordering::SeqCst) > 0 {
                self.fail_next.fetch_sub(1, Ordering::SeqCst);
                return Err(PersistError::file("recording", "injected failure"));
            }
            self.batches.push(batch.to_vec());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), PersistError> {
            self.closed = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_no_flush_at_threshold() {
        let mut buffer = BatchBuffer::new(RecordingSink::new(), 3);
        for i in 0..3 {
            assert!(buffer.append(reading(i)).await.unwrap().is_none());
        }
        assert_eq!(buffer.len(), 3);
        assert!(buffer.sink().batches.is_empty());
    }

    #[tokio::test]
    async fn test_flush_when_threshold_exceeded() {
        let mut buffer = BatchBuffer::new(RecordingSink::new(), 3);
        for i in 0..3 {
            buffer.append(reading(i)).await.unwrap();
        }

        let outcome = buffer.append(reading(3)).await.unwrap().unwrap();
        assert_eq!(outcome.persisted, 4);
        assert!(buffer.is_empty());
        assert_eq!(buffer.sink().batches.len(), 1);
        assert_eq!(buffer.sink().batches[0].len(), 4);
    }

    #[tokio::test]
    async fn test_flush_preserves_arrival_order() {
        let mut buffer = BatchBuffer::new(RecordingSink::new(), 2);
        for i in 0..3 {
            buffer.append(reading(i)).await.unwrap();
        }

        let batch = &buffer.sink().batches[0];
        let angles: Vec<f64> = batch.iter().map(|r| r.shoulder_pan).collect();
        assert_eq!(angles, vec![0.0, 1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_failed_flush_retains_batch() {
        let mut buffer = BatchBuffer::new(RecordingSink::failing(1), 1);
        buffer.append(reading(0)).await.unwrap();

        let err = buffer.append(reading(1)).await.unwrap_err();
        assert_eq!(err.sink_name, "recording");
        assert_eq!(buffer.len(), 2);

        // Next trigger succeeds and carries the retained readings
        let outcome = buffer.append(reading(2)).await.unwrap().unwrap();
        assert_eq!(outcome.persisted, 3);
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_drain_flushes_remainder_and_closes() {
        let mut buffer = BatchBuffer::new(RecordingSink::new(), 10);
        for i in 0..4 {
            buffer.append(reading(i)).await.unwrap();
        }

        let (flushed, sink) = buffer.drain().await;
        assert_eq!(flushed.unwrap().persisted, 4);
        assert!(sink.closed);
        assert_eq!(sink.batches.len(), 1);
    }

    #[tokio::test]
    async fn test_drain_empty_buffer() {
        let buffer = BatchBuffer::new(RecordingSink::new(), 10);
        let (flushed, sink) = buffer.drain().await;
        assert_eq!(flushed.unwrap().persisted, 0);
        assert!(sink.closed);
        assert!(sink.batches.is_empty());
    }
}
