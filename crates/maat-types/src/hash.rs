use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::TypesError;

/// Decimal places kept when a float enters the canonical form.
const CANONICAL_FLOAT_DIGITS: usize = 15;

/// A BLAKE3 content hash (32 bytes).
///
/// Used as the unique key hash (UKH) of every ledger record and as the
/// source of content-derived record ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Compute the BLAKE3 hash of arbitrary data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Hash the canonical JSON form of a serializable value.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, TypesError> {
        let value = serde_json::to_value(value)?;
        Ok(Self::hash(canonical_json(&value).as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encode for display and persistence.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, TypesError> {
        if hex.len() != 64 {
            return Err(TypesError::InvalidHashLength(hex.len()));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = hex.get(i * 2..i * 2 + 2).ok_or(TypesError::InvalidHex)?;
            *byte = u8::from_str_radix(pair, 16).map_err(|_| TypesError::InvalidHex)?;
        }
        Ok(Self(bytes))
    }

    /// `prefix_` followed by the first 16 hex characters.
    pub fn short_id(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, &self.to_hex()[..16])
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        ContentHash::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// Render a JSON value in canonical form.
///
/// Object keys are sorted, separators are compact and floats are written
/// with fixed precision (trailing zeros stripped), so equal values always
/// produce identical bytes regardless of map insertion order.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            if n.is_f64() {
                match n.as_f64() {
                    Some(f) => out.push_str(&canonical_float(f)),
                    None => out.push_str("null"),
                }
            } else {
                out.push_str(&n.to_string());
            }
        }
        Value::String(s) => out.push_str(&quote(s)),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&quote(key));
                out.push(':');
                if let Some(v) = map.get(key) {
                    write_canonical(v, out);
                }
            }
            out.push('}');
        }
    }
}

fn canonical_float(f: f64) -> String {
    if !f.is_finite() {
        return "null".into();
    }
    let fixed = format!("{:.*}", CANONICAL_FLOAT_DIGITS, f);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" || trimmed.is_empty() {
        "0".into()
    } else {
        trimmed.to_string()
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s.escape_default()))
}
