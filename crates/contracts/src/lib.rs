//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-crate data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Readings carry a wall-clock timestamp (`NaiveDateTime`, microsecond precision)
//! - Delivery is asynchronous: arrival order is authoritative, timestamp order is not

mod config;
mod error;
mod reading;
mod sink;

pub use config::*;
pub use error::*;
pub use reading::*;
pub use sink::*;
