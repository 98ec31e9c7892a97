use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decision::{Decision, Evidence, Receipt};
use crate::error::TypesError;
use crate::hash::ContentHash;
use crate::hypothesis::Hypothesis;
use crate::observation::Observation;

/// Kind of a ledger record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Observation,
    Hypothesis,
    Evidence,
    Decision,
    Receipt,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordKind::Observation => "observation",
            RecordKind::Hypothesis => "hypothesis",
            RecordKind::Evidence => "evidence",
            RecordKind::Decision => "decision",
            RecordKind::Receipt => "receipt",
        };
        write!(f, "{}", s)
    }
}

/// Anything the decision core hands to a ledger sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum LedgerRecord {
    Observation(Observation),
    Hypothesis(Hypothesis),
    Evidence(Evidence),
    Decision(Decision),
    Receipt(Receipt),
}

impl LedgerRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            LedgerRecord::Observation(_) => RecordKind::Observation,
            LedgerRecord::Hypothesis(_) => RecordKind::Hypothesis,
            LedgerRecord::Evidence(_) => RecordKind::Evidence,
            LedgerRecord::Decision(_) => RecordKind::Decision,
            LedgerRecord::Receipt(_) => RecordKind::Receipt,
        }
    }

    /// Unique key hash over the canonical form.
    pub fn ukh(&self) -> Result<ContentHash, TypesError> {
        ContentHash::of(self)
    }

    /// Sorted-key, compact JSON with the `ukh` field attached.
    ///
    /// Floats keep their shortest round-trip form so a line reads back to
    /// the record that was written; the fixed-precision form is only the
    /// hash input.
    pub fn to_ledger_line(&self) -> Result<String, TypesError> {
        let ukh = self.ukh()?;
        let mut value = serde_json::to_value(self)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert("ukh".into(), serde_json::Value::String(ukh.to_hex()));
        }
        Ok(serde_json::to_string(&value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::TestStatistics;
    use crate::hypothesis::HypothesisId;

    fn evidence() -> LedgerRecord {
        LedgerRecord::Evidence(Evidence {
            hypothesis_id: HypothesisId("hyp_00000000000000aa".into()),
            statistics: TestStatistics::new(0.5, 2.0, 1.25),
            successes: 32,
            failures: 32,
            window_len: 64,
        })
    }

    #[test]
    fn record_is_tagged_with_schema() {
        let json = serde_json::to_string(&evidence()).unwrap();
        assert!(json.contains("\"schema\":\"evidence\""));
        let back: LedgerRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), RecordKind::Evidence);
    }

    #[test]
    fn canonical_line_carries_ukh() {
        let rec = evidence();
        let line = rec.to_ledger_line().unwrap();
        assert!(line.contains(&format!("\"ukh\":\"{}\"", rec.ukh().unwrap().to_hex())));
        assert!(!line.contains(' '));
        assert_eq!(line, rec.to_ledger_line().unwrap());
    }

    #[test]
    fn ledger_line_keeps_full_float_precision() {
        let rec = LedgerRecord::Evidence(Evidence {
            hypothesis_id: HypothesisId("hyp_00000000000000ab".into()),
            statistics: TestStatistics::new(0.46257015465625045, 0.5902502519301834, -1.0 / 3.0),
            successes: 1,
            failures: 2,
            window_len: 3,
        });
        let line = rec.to_ledger_line().unwrap();
        assert!(line.contains("0.46257015465625045"));
        let back: LedgerRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, rec);
        assert_eq!(back.ukh().unwrap(), rec.ukh().unwrap());
    }

    #[test]
    fn ledger_line_keys_are_sorted() {
        let line = evidence().to_ledger_line().unwrap();
        let schema = line.find("\"schema\"").unwrap();
        let statistics = line.find("\"statistics\"").unwrap();
        let ukh = line.find("\"ukh\"").unwrap();
        assert!(schema < statistics && statistics < ukh);
    }

    #[test]
    fn kind_display() {
        assert_eq!(RecordKind::Receipt.to_string(), "receipt");
    }
}
