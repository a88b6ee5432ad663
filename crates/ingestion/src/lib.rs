//! # Ingestion
//!
//! Consumer side of the pipeline: decodes raw bus payloads into
//! [`contracts::JointReading`]s, accumulates them in a threshold-driven
//! batch buffer, and drives the persistence sink.
//!
//! The consumer task owns the buffer exclusively, so appends and flushes
//! are serialized by construction; there is no locking in this crate.

pub mod batch;
pub mod codec;
pub mod consumer;

mod metrics;

pub use batch::{BatchBuffer, BufferState, FlushOutcome};
pub use codec::decode_reading;
pub use consumer::{Consumer, ConsumerStats};
