use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::TypesError;
use crate::hash::ContentHash;

/// Content-derived observation identifier (`obs_<16 hex>`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObservationId(pub String);

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an observation came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationOrigin {
    /// Data from the outside world (inner loop).
    External,
    /// Synthesized from another loop's receipts (outer loop).
    Meta,
}

/// A single named field value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Series(Vec<f64>),
    Text(String),
}

/// An immutable observation: source, logical timestamp and named fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: ObservationId,
    pub source: String,
    pub origin: ObservationOrigin,
    pub timestamp: DateTime<Utc>,
    pub fields: BTreeMap<String, FieldValue>,
}

#[derive(Serialize)]
struct ObservationContent<'a> {
    source: &'a str,
    origin: ObservationOrigin,
    timestamp: &'a DateTime<Utc>,
    fields: &'a BTreeMap<String, FieldValue>,
}

impl Observation {
    /// Build an observation; its id is derived from its content.
    pub fn new(
        source: impl Into<String>,
        origin: ObservationOrigin,
        timestamp: DateTime<Utc>,
        fields: BTreeMap<String, FieldValue>,
    ) -> Result<Self, TypesError> {
        let source = source.into();
        let hash = ContentHash::of(&ObservationContent {
            source: &source,
            origin,
            timestamp: &timestamp,
            fields: &fields,
        })?;
        Ok(Self {
            id: ObservationId(hash.short_id("obs")),
            source,
            origin,
            timestamp,
            fields,
        })
    }

    /// Numeric samples of a field: a series as-is, a number as one sample.
    pub fn samples(&self, field: &str) -> Vec<f64> {
        match self.fields.get(field) {
            Some(FieldValue::Series(values)) => values.clone(),
            Some(FieldValue::Number(n)) => vec![*n],
            _ => Vec::new(),
        }
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        match self.fields.get(field) {
            Some(FieldValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(FieldValue::Text(t)) => Some(t),
            _ => None,
        }
    }

    pub fn is_external(&self) -> bool {
        self.origin == ObservationOrigin::External
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn fields() -> BTreeMap<String, FieldValue> {
        let mut f = BTreeMap::new();
        f.insert("x".into(), FieldValue::Series(vec![1.0, 2.0, 3.0]));
        f.insert("rate".into(), FieldValue::Number(0.25));
        f.insert("label".into(), FieldValue::Text("sensor".into()));
        f
    }

    #[test]
    fn id_is_content_derived() {
        let a = Observation::new("external:world", ObservationOrigin::External, ts(), fields())
            .unwrap();
        let b = Observation::new("external:world", ObservationOrigin::External, ts(), fields())
            .unwrap();
        assert_eq!(a.id, b.id);
        assert!(a.id.0.starts_with("obs_"));

        let c = Observation::new("external:other", ObservationOrigin::External, ts(), fields())
            .unwrap();
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn field_accessors() {
        let o = Observation::new("s", ObservationOrigin::Meta, ts(), fields()).unwrap();
        assert_eq!(o.samples("x"), vec![1.0, 2.0, 3.0]);
        assert_eq!(o.samples("rate"), vec![0.25]);
        assert!(o.samples("label").is_empty());
        assert_eq!(o.number("rate"), Some(0.25));
        assert_eq!(o.text("label"), Some("sensor"));
        assert!(!o.is_external());
    }

    #[test]
    fn serde_roundtrip_keeps_field_shapes() {
        let o = Observation::new("s", ObservationOrigin::External, ts(), fields()).unwrap();
        let json = serde_json::to_string(&o).unwrap();
        let back: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(o, back);
    }
}
