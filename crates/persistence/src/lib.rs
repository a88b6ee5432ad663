//! # Persistence
//!
//! Sink implementations behind [`contracts::ReadingSink`]: a CSV file
//! artifact, a Postgres table, and the dual sink composing both with
//! file-before-table ordering. Also holds the shutdown-time object-storage
//! archiver, which is not a sink: it runs once, after the last drain.

pub mod archive;
pub mod csv_sink;
pub mod dual;
pub mod postgres;

pub use archive::Archiver;
pub use csv_sink::CsvSink;
pub use dual::DualSink;
pub use postgres::PostgresSink;
