//! Wire payload decoding
//!
//! Payloads are JSON mappings of six joint fields plus a timestamp string.
//! Decoding is strict: a payload is accepted whole or rejected whole, and
//! rejection reasons are specific enough to log usefully.

use chrono::NaiveDateTime;
use contracts::{DecodeError, JointReading, JOINT_FIELDS, WIRE_TIMESTAMP_FORMAT};
use serde_json::Value;

/// Decode one raw payload into a validated reading
///
/// Validation per joint field: present, numeric, finite, within [-π, π].
/// The timestamp must parse in the wire format exactly.
pub fn decode_reading(payload: &[u8]) -> Result<JointReading, DecodeError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| DecodeError::malformed(e.to_string()))?;

    let map = value
        .as_object()
        .ok_or_else(|| DecodeError::malformed("payload is not a JSON object"))?;

    let mut angles = [0.0f64; 6];
    for (i, &field) in JOINT_FIELDS.iter().enumerate() {
        let raw = map
            .get(field)
            .ok_or(DecodeError::MissingField { field })?;
        let angle = raw
            .as_f64()
            .ok_or(DecodeError::NotNumeric { field })?;
        if !angle.is_finite() || angle.abs() > std::f64::consts::PI {
            return Err(DecodeError::OutOfRange {
                field,
                value: angle,
            });
        }
        angles[i] = angle;
    }

    let timestamp = parse_timestamp(map.get("timestamp"))?;

    Ok(JointReading {
        shoulder_pan: angles[0],
        shoulder_lift: angles[1],
        elbow: angles[2],
        wrist_1: angles[3],
        wrist_2: angles[4],
        wrist_3: angles[5],
        timestamp,
    })
}

fn parse_timestamp(raw: Option<&Value>) -> Result<NaiveDateTime, DecodeError> {
    let text = raw
        .ok_or_else(|| DecodeError::bad_timestamp("field missing"))?
        .as_str()
        .ok_or_else(|| DecodeError::bad_timestamp("not a string"))?;

    NaiveDateTime::parse_from_str(text, WIRE_TIMESTAMP_FORMAT)
        .map_err(|e| DecodeError::bad_timestamp(format!("'{text}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn valid_payload() -> serde_json::Value {
        serde_json::json!({
            "shoulder_pan": 0.1,
            "shoulder_lift": -0.2,
            "elbow": 0.3,
            "wrist_1": -0.4,
            "wrist_2": 0.5,
            "wrist_3": -0.6,
            "timestamp": "2024-03-01 12:30:45.123456",
        })
    }

    fn decode(value: &serde_json::Value) -> Result<JointReading, DecodeError> {
        decode_reading(serde_json::to_vec(value).unwrap().as_slice())
    }

    #[test]
    fn test_decodes_valid_payload() {
        let reading = decode(&valid_payload()).unwrap();
        assert_eq!(reading.shoulder_pan, 0.1);
        assert_eq!(reading.wrist_3, -0.6);
        assert_eq!(reading.wire_timestamp(), "2024-03-01 12:30:45.123456");
    }

    #[test]
    fn test_rejects_non_json() {
        let result = decode_reading(b"not json at all");
        assert!(matches!(result, Err(DecodeError::Malformed { .. })));
    }

    #[test]
    fn test_rejects_non_object() {
        let result = decode_reading(b"[1, 2, 3]");
        assert!(matches!(result, Err(DecodeError::Malformed { .. })));
    }

    #[test]
    fn test_rejects_missing_field() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("wrist_2");
        assert!(matches!(
            decode(&payload),
            Err(DecodeError::MissingField { field: "wrist_2" })
        ));
    }

    #[test]
    fn test_rejects_non_numeric_field() {
        let mut payload = valid_payload();
        payload["wrist_1"] = serde_json::json!("fast");
        assert!(matches!(
            decode(&payload),
            Err(DecodeError::NotNumeric { field: "wrist_1" })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_angle() {
        let mut payload = valid_payload();
        payload["shoulder_pan"] = serde_json::json!(PI + 0.01);
        assert!(matches!(
            decode(&payload),
            Err(DecodeError::OutOfRange {
                field: "shoulder_pan",
                ..
            })
        ));
    }

    #[test]
    fn test_boundary_angle_accepted() {
        let mut payload = valid_payload();
        payload["shoulder_pan"] = serde_json::json!(PI);
        payload["shoulder_lift"] = serde_json::json!(-PI);
        assert!(decode(&payload).is_ok());
    }

    #[test]
    fn test_rejects_bad_timestamp() {
        let mut payload = valid_payload();
        payload["timestamp"] = serde_json::json!("2024-03-01T12:30:45Z");
        assert!(matches!(
            decode(&payload),
            Err(DecodeError::BadTimestamp { .. })
        ));
    }

    #[test]
    fn test_rejects_missing_timestamp() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("timestamp");
        assert!(matches!(
            decode(&payload),
            Err(DecodeError::BadTimestamp { .. })
        ));
    }

    #[test]
    fn test_generator_payload_decodes() {
        let mut gen = generator::AngleGenerator::new(&contracts::GeneratorConfig::default());
        let payload = generator::encode_reading(&gen.next_reading());
        assert!(decode_reading(&payload).is_ok());
    }
}
