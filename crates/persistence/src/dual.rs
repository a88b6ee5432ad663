//! Dual persistence
//!
//! Composes the file sink and an optional table sink with fixed ordering:
//! file first, then table. The pair is not transactional. A file failure
//! stops the attempt before the table is touched, so a retained batch can
//! be retried without table duplicates; a table failure after a file
//! success leaves the file ahead, and the retry re-appends those rows.

use contracts::{JointReading, PersistError, ReadingSink, SinkStage};
use tracing::warn;

/// File-then-table composite sink
///
/// With no table sink configured this degrades to the file sink alone.
pub struct DualSink<F: ReadingSink, T: ReadingSink> {
    file: F,
    table: Option<T>,
}

impl<F: ReadingSink, T: ReadingSink> DualSink<F, T> {
    /// Compose a file sink with an optional table sink
    pub fn new(file: F, table: Option<T>) -> Self {
        Self { file, table }
    }

    /// The file half
    pub fn file(&self) -> &F {
        &self.file
    }

    /// True when a table sink is configured
    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }
}

impl<F: ReadingSink, T: ReadingSink> ReadingSink for DualSink<F, T> {
    fn name(&self) -> &str {
        "dual"
    }

    async fn persist(&mut self, batch: &[JointReading]) -> Result<(), PersistError> {
        self.file
            .persist(batch)
            .await
            .map_err(|e| e.with_stage(SinkStage::File))?;

        if let Some(table) = &mut self.table {
            table
                .persist(batch)
                .await
                .map_err(|e| e.with_stage(SinkStage::Table))?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PersistError> {
        // Close both halves even when the first close fails
        let file_result = self.file.close().await;
        if let Some(table) = &mut self.table {
            if let Err(e) = table.close().await {
                warn!(error = %e, "table sink close failed");
                file_result?;
                return Err(e);
            }
        }
        file_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading() -> JointReading {
        JointReading {
            shoulder_pan: 0.1,
            shoulder_lift: 0.2,
            elbow: 0.3,
            wrist_1: 0.4,
            wrist_2: 0.5,
            wrist_3: 0.6,
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    struct StubSink {
        name: &'static str,
        calls: Vec<usize>,
        fail: bool,
    }

    impl StubSink {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                calls: Vec::new(),
                fail: false,
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                fail: true,
                ..Self::new(name)
            }
        }
    }

    impl ReadingSink for StubSink {
        fn name(&self) -> &str {
            self.name
        }

        async fn persist(&mut self, batch: &[JointReading]) -> Result<(), PersistError> {
            if self.fail {
                return Err(PersistError::file(self.name, "stub failure"));
            }
            self.calls.push(batch.len());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), PersistError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_writes_file_then_table() {
        let mut sink = DualSink::new(StubSink::new("file"), Some(StubSink::new("table")));
        sink.persist(&[reading(), reading()]).await.unwrap();

        assert_eq!(sink.file.calls, vec![2]);
        assert_eq!(sink.table.as_ref().unwrap().calls, vec![2]);
    }

    #[tokio::test]
    async fn test_file_failure_skips_table() {
        let mut sink = DualSink::new(StubSink::failing("file"), Some(StubSink::new("table")));
        let err = sink.persist(&[reading()]).await.unwrap_err();

        assert_eq!(err.stage, SinkStage::File);
        assert!(sink.table.as_ref().unwrap().calls.is_empty());
    }

    #[tokio::test]
    async fn test_table_failure_is_table_staged() {
        let mut sink = DualSink::new(StubSink::new("file"), Some(StubSink::failing("table")));
        let err = sink.persist(&[reading()]).await.unwrap_err();

        assert_eq!(err.stage, SinkStage::Table);
        // The file half already wrote: the non-transactional seam
        assert_eq!(sink.file.calls, vec![1]);
    }

    #[tokio::test]
    async fn test_file_only_mode() {
        let mut sink: DualSink<StubSink, StubSink> = DualSink::new(StubSink::new("file"), None);
        assert!(!sink.has_table());
        sink.persist(&[reading()]).await.unwrap();
        assert_eq!(sink.file.calls, vec![1]);
    }
}
