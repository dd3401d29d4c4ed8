//! Canonical value encoding.
//!
//! Every supported value kind has exactly one byte encoding, and logically
//! equal values always encode to identical bytes. The blind index hashes
//! these bytes directly, so any non-determinism here would silently break
//! equality lookups.
//!
//! Layout: a single tag byte identifying the kind, followed by a
//! fixed-shape payload (big-endian for numeric kinds, raw bytes otherwise).

use crate::error::Error;
use chrono::{DateTime, Utc};

/// Kinds of values the codec accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// UTF-8 text
    Text,
    /// 64-bit signed integer
    Integer,
    /// 64-bit IEEE 754 float
    Float,
    /// Boolean
    Boolean,
    /// UTC timestamp, microsecond precision
    DateTime,
    /// Raw bytes
    Bytes,
}

impl ValueKind {
    const fn tag(self) -> u8 {
        match self {
            Self::Text => 0x01,
            Self::Integer => 0x02,
            Self::Float => 0x03,
            Self::Boolean => 0x04,
            Self::DateTime => 0x05,
            Self::Bytes => 0x06,
        }
    }

    /// Human-readable name, used in decode error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Bytes => "bytes",
        }
    }
}

/// A typed field value.
///
/// Datetimes are truncated to microsecond precision on encoding; callers
/// storing sub-microsecond timestamps will read back the truncated value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 text
    Text(String),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit IEEE 754 float
    Float(f64),
    /// Boolean
    Boolean(bool),
    /// UTC timestamp
    DateTime(DateTime<Utc>),
    /// Raw bytes
    Bytes(Vec<u8>),
}

/// Canonical bit pattern for NaN, so all NaN inputs encode identically.
const CANONICAL_NAN_BITS: u64 = 0x7ff8_0000_0000_0000;

impl Value {
    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::DateTime(_) => ValueKind::DateTime,
            Self::Bytes(_) => ValueKind::Bytes,
        }
    }

    /// Encodes this value to its canonical byte form.
    ///
    /// Deterministic: no hidden state (current time, randomness) influences
    /// the output. Negative zero is normalized to positive zero and NaN to
    /// a single canonical bit pattern so that logically equal floats encode
    /// identically.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![self.kind().tag()];
        match self {
            Self::Text(s) => bytes.extend_from_slice(s.as_bytes()),
            Self::Integer(n) => bytes.extend_from_slice(&n.to_be_bytes()),
            Self::Float(f) => {
                let canonical = if f.is_nan() {
                    CANONICAL_NAN_BITS
                } else if *f == 0.0 {
                    0u64
                } else {
                    f.to_bits()
                };
                bytes.extend_from_slice(&canonical.to_be_bytes());
            }
            Self::Boolean(b) => bytes.push(u8::from(*b)),
            Self::DateTime(dt) => bytes.extend_from_slice(&dt.timestamp_micros().to_be_bytes()),
            Self::Bytes(b) => bytes.extend_from_slice(b),
        }
        bytes
    }

    /// Decodes canonical bytes back into a value of the expected kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the tag does not match `expected`, or
    /// if the payload is not a valid encoding of that kind (wrong length,
    /// invalid UTF-8, out-of-range timestamp). Decode failures are distinct
    /// from every cryptographic failure.
    pub fn decode(bytes: &[u8], expected: ValueKind) -> Result<Self, Error> {
        let (&tag, payload) = bytes
            .split_first()
            .ok_or_else(|| Error::Decode("empty input".to_string()))?;

        if tag != expected.tag() {
            return Err(Error::Decode(format!(
                "expected {} (tag {:#04x}), found tag {tag:#04x}",
                expected.name(),
                expected.tag()
            )));
        }

        match expected {
            ValueKind::Text => {
                let s = std::str::from_utf8(payload)
                    .map_err(|e| Error::Decode(format!("invalid UTF-8 in text value: {e}")))?;
                Ok(Self::Text(s.to_string()))
            }
            ValueKind::Integer => {
                let n = i64::from_be_bytes(fixed_payload(payload, "integer")?);
                Ok(Self::Integer(n))
            }
            ValueKind::Float => {
                let bits = u64::from_be_bytes(fixed_payload(payload, "float")?);
                Ok(Self::Float(f64::from_bits(bits)))
            }
            ValueKind::Boolean => match payload {
                [0] => Ok(Self::Boolean(false)),
                [1] => Ok(Self::Boolean(true)),
                [b] => Err(Error::Decode(format!("invalid boolean byte {b:#04x}"))),
                _ => Err(Error::Decode(format!(
                    "boolean payload must be 1 byte, got {}",
                    payload.len()
                ))),
            },
            ValueKind::DateTime => {
                let micros = i64::from_be_bytes(fixed_payload(payload, "datetime")?);
                let dt = DateTime::from_timestamp_micros(micros).ok_or_else(|| {
                    Error::Decode(format!("timestamp out of range: {micros} microseconds"))
                })?;
                Ok(Self::DateTime(dt))
            }
            ValueKind::Bytes => Ok(Self::Bytes(payload.to_vec())),
        }
    }
}

fn fixed_payload<const N: usize>(payload: &[u8], kind: &str) -> Result<[u8; N], Error> {
    payload.try_into().map_err(|_| {
        Error::Decode(format!("{kind} payload must be {N} bytes, got {}", payload.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_text_round_trip() {
        let value = Value::Text("alice@example.com".to_string());
        let bytes = value.encode();
        let decoded = Value::decode(&bytes, ValueKind::Text).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn test_integer_round_trip() {
        for n in [0i64, 1, -1, i64::MIN, i64::MAX] {
            let value = Value::Integer(n);
            let decoded = Value::decode(&value.encode(), ValueKind::Integer).unwrap();
            assert_eq!(value, decoded);
        }
    }

    #[test]
    fn test_float_round_trip() {
        for f in [0.0f64, -1.5, 1.0e308, f64::MIN_POSITIVE] {
            let value = Value::Float(f);
            let decoded = Value::decode(&value.encode(), ValueKind::Float).unwrap();
            assert_eq!(value, decoded);
        }
    }

    #[test]
    fn test_negative_zero_normalized() {
        let pos = Value::Float(0.0).encode();
        let neg = Value::Float(-0.0).encode();
        assert_eq!(pos, neg);
    }

    #[test]
    fn test_nan_canonicalized() {
        let a = Value::Float(f64::NAN).encode();
        let b = Value::Float(-f64::NAN).encode();
        assert_eq!(a, b);
    }

    #[test]
    fn test_boolean_round_trip() {
        for b in [true, false] {
            let value = Value::Boolean(b);
            let decoded = Value::decode(&value.encode(), ValueKind::Boolean).unwrap();
            assert_eq!(value, decoded);
        }
    }

    #[test]
    fn test_boolean_rejects_other_bytes() {
        let result = Value::decode(&[ValueKind::Boolean.tag(), 2], ValueKind::Boolean);
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_datetime_round_trip() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();
        let value = Value::DateTime(dt);
        let decoded = Value::decode(&value.encode(), ValueKind::DateTime).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn test_bytes_round_trip() {
        let value = Value::Bytes(vec![0, 1, 2, 255]);
        let decoded = Value::decode(&value.encode(), ValueKind::Bytes).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn test_empty_text_and_bytes() {
        let text = Value::Text(String::new());
        assert_eq!(text, Value::decode(&text.encode(), ValueKind::Text).unwrap());

        let bytes = Value::Bytes(Vec::new());
        assert_eq!(bytes, Value::decode(&bytes.encode(), ValueKind::Bytes).unwrap());
    }

    #[test]
    fn test_kind_mismatch_fails() {
        let bytes = Value::Integer(42).encode();
        let result = Value::decode(&bytes, ValueKind::Text);
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_empty_input_fails() {
        let result = Value::decode(&[], ValueKind::Text);
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_truncated_integer_fails() {
        let mut bytes = Value::Integer(42).encode();
        bytes.truncate(4);
        let result = Value::decode(&bytes, ValueKind::Integer);
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let bytes = vec![ValueKind::Text.tag(), 0xFF, 0xFE];
        let result = Value::decode(&bytes, ValueKind::Text);
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_equal_values_encode_identically() {
        let a = Value::Text("user@example.com".to_string());
        let b = Value::Text("user@example.com".to_string());
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn test_cross_kind_encodings_differ() {
        // Integer 1 and boolean true must not collide in the blind index
        assert_ne!(Value::Integer(1).encode(), Value::Boolean(true).encode());
    }

    proptest! {
        #[test]
        fn prop_text_round_trip(s in ".*") {
            let value = Value::Text(s);
            let decoded = Value::decode(&value.encode(), ValueKind::Text).unwrap();
            prop_assert_eq!(value, decoded);
        }

        #[test]
        fn prop_integer_round_trip(n in any::<i64>()) {
            let value = Value::Integer(n);
            let decoded = Value::decode(&value.encode(), ValueKind::Integer).unwrap();
            prop_assert_eq!(value, decoded);
        }

        #[test]
        fn prop_bytes_round_trip(b in proptest::collection::vec(any::<u8>(), 0..512)) {
            let value = Value::Bytes(b);
            let decoded = Value::decode(&value.encode(), ValueKind::Bytes).unwrap();
            prop_assert_eq!(value, decoded);
        }
    }
}
