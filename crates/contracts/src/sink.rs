//! ReadingSink trait - persistence output interface
//!
//! Defines the abstract interface for persistence sinks.

use crate::{JointReading, PersistError};

/// Persistence output trait
///
/// All sink implementations must implement this trait. A sink owns no batch
/// state between calls: `persist` is a whole-batch write, and the caller
/// keeps ownership of the batch until the call succeeds.
#[trait_variant::make(ReadingSink: Send)]
pub trait LocalReadingSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist one batch, in arrival order
    ///
    /// # Errors
    /// Returns a stage-attributed error; the caller retains the batch and
    /// retries on the next flush opportunity.
    async fn persist(&mut self, batch: &[JointReading]) -> Result<(), PersistError>;

    /// Close sink, releasing file handles / connections
    async fn close(&mut self) -> Result<(), PersistError>;
}
