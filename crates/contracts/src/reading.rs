//! JointReading - Decoder output, Batch Buffer content
//!
//! One timestamped set of joint angles for a six-joint arm.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Joint field names, in wire and column order
pub const JOINT_FIELDS: [&str; 6] = [
    "shoulder_pan",
    "shoulder_lift",
    "elbow",
    "wrist_1",
    "wrist_2",
    "wrist_3",
];

/// Wire/file timestamp format (microsecond precision)
pub const WIRE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One timestamped sample of the six joint angles
///
/// Each angle is in radians, bounded to [-π, π]. Readings have no identity
/// key; duplicates are possible and are not deduplicated downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointReading {
    /// Shoulder pan angle (radians)
    pub shoulder_pan: f64,

    /// Shoulder lift angle (radians)
    pub shoulder_lift: f64,

    /// Elbow angle (radians)
    pub elbow: f64,

    /// Wrist 1 angle (radians)
    pub wrist_1: f64,

    /// Wrist 2 angle (radians)
    pub wrist_2: f64,

    /// Wrist 3 angle (radians)
    pub wrist_3: f64,

    /// Sample timestamp (wall clock, microsecond precision)
    #[serde(with = "wire_timestamp")]
    pub timestamp: NaiveDateTime,
}

impl JointReading {
    /// Angles in `JOINT_FIELDS` order
    pub fn angles(&self) -> [f64; 6] {
        [
            self.shoulder_pan,
            self.shoulder_lift,
            self.elbow,
            self.wrist_1,
            self.wrist_2,
            self.wrist_3,
        ]
    }

    /// Timestamp rendered in the wire format
    pub fn wire_timestamp(&self) -> String {
        self.timestamp.format(WIRE_TIMESTAMP_FORMAT).to_string()
    }
}

/// Serde adapter for the `%Y-%m-%d %H:%M:%S%.6f` wire format
pub mod wire_timestamp {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    use super::WIRE_TIMESTAMP_FORMAT;

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(WIRE_TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, WIRE_TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
