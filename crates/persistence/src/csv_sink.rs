//! CSV file sink
//!
//! One file per run: created (truncated) up front with a header row, then
//! appended to on every flush. The writer is flushed after each batch so
//! the on-disk artifact always ends on a row boundary.

use std::fs::File;
use std::path::{Path, PathBuf};

use contracts::{JointReading, PersistError, ReadingSink, JOINT_FIELDS};
use csv::Writer;
use tracing::{debug, info, instrument};

const SINK_NAME: &str = "csv";

/// Append-only CSV artifact of this run's readings
pub struct CsvSink {
    path: PathBuf,
    writer: Writer<File>,
    rows_written: u64,
}

impl CsvSink {
    /// Create the file, truncating any previous artifact, and write the header
    pub fn create(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .map_err(|e| PersistError::file(SINK_NAME, format!("create '{}': {e}", path.display())))?;

        let mut writer = Writer::from_writer(file);
        let header: Vec<&str> = JOINT_FIELDS.iter().copied().chain(["timestamp"]).collect();
        writer
            .write_record(&header)
            .and_then(|()| writer.flush().map_err(Into::into))
            .map_err(|e| PersistError::file(SINK_NAME, format!("write header: {e}")))?;

        info!(path = %path.display(), "csv artifact created");
        Ok(Self {
            path,
            writer,
            rows_written: 0,
        })
    }

    /// Path of the artifact
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written so far (header excluded)
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn write_row(&mut self, reading: &JointReading) -> Result<(), csv::Error> {
        let mut row: Vec<String> = reading.angles().iter().map(f64::to_string).collect();
        row.push(reading.wire_timestamp());
        self.writer.write_record(&row)
    }
}

impl ReadingSink for CsvSink {
    fn name(&self) -> &str {
        SINK_NAME
    }

    #[instrument(skip_all, fields(batch_size = batch.len()))]
    async fn persist(&mut self, batch: &[JointReading]) -> Result<(), PersistError> {
        for reading in batch {
            self.write_row(reading)
                .map_err(|e| PersistError::file(SINK_NAME, format!("write row: {e}")))?;
        }
        self.writer
            .flush()
            .map_err(|e| PersistError::file(SINK_NAME, format!("flush: {e}")))?;

        self.rows_written += batch.len() as u64;
        debug!(rows = self.rows_written, "csv batch appended");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PersistError> {
        self.writer
            .flush()
            .map_err(|e| PersistError::file(SINK_NAME, format!("final flush: {e}")))
    }
}
