use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;
use crate::hash::ContentHash;
use crate::hypothesis::{HemisphereKind, HypothesisId};
use crate::thresholds::GateThresholds;

/// The three scalars a hypothesis is judged on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestStatistics {
    /// Posterior-probability estimate in [0, 1].
    pub posterior_mean: f64,
    /// Periodicity/coherence ratio, >= 0.
    pub coherence_ratio: f64,
    /// Description-length delta in bits (signed).
    pub mdl_delta_bits: f64,
}

impl TestStatistics {
    pub fn new(posterior_mean: f64, coherence_ratio: f64, mdl_delta_bits: f64) -> Self {
        Self {
            posterior_mean,
            coherence_ratio,
            mdl_delta_bits,
        }
    }
}

/// Outcome of the triple gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accept,
    Defer,
    Reject,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accept => write!(f, "accept"),
            Verdict::Defer => write!(f, "defer"),
            Verdict::Reject => write!(f, "reject"),
        }
    }
}

/// Statistics gathered for one hypothesis over one observation window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub hypothesis_id: HypothesisId,
    pub statistics: TestStatistics,
    /// Samples above the window mean.
    pub successes: u64,
    pub failures: u64,
    pub window_len: usize,
}

impl Evidence {
    pub fn hash(&self) -> Result<ContentHash, TypesError> {
        ContentHash::of(self)
    }
}

/// One (hypothesis, hemisphere) evaluation.
///
/// `statistics` is `None` only when the estimators failed before producing
/// a value; such decisions are always rejections with a diagnostic reason.
///
/// `attention_floor` is set when the semantic filter was active: the verdict
/// is then the gate verdict, forced to Reject if `attention` fell below it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub cycle: u64,
    pub hypothesis_id: HypothesisId,
    pub hemisphere: HemisphereKind,
    pub statistics: Option<TestStatistics>,
    pub thresholds: GateThresholds,
    pub verdict: Verdict,
    pub attention: f64,
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attention_floor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<ContentHash>,
}

impl Decision {
    pub fn hash(&self) -> Result<ContentHash, TypesError> {
        ContentHash::of(self)
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict == Verdict::Accept
    }

    /// True when the recorded floor alone explains a rejection.
    pub fn below_floor(&self) -> bool {
        self.attention_floor.is_some_and(|floor| self.attention < floor)
    }
}

/// Terminal receipt status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Accepted,
    Deferred,
    Rejected,
}

impl From<Verdict> for ReceiptStatus {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Accept => ReceiptStatus::Accepted,
            Verdict::Defer => ReceiptStatus::Deferred,
            Verdict::Reject => ReceiptStatus::Rejected,
        }
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiptStatus::Accepted => write!(f, "accepted"),
            ReceiptStatus::Deferred => write!(f, "deferred"),
            ReceiptStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Audit summary of one Decision for a named evaluation slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub cycle: u64,
    pub slot: String,
    pub hemisphere: HemisphereKind,
    pub status: ReceiptStatus,
    pub hypothesis_id: HypothesisId,
    pub decision_hash: ContentHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_hash: Option<ContentHash>,
    pub note: String,
}

impl Receipt {
    /// Summarize a decision.
    pub fn for_decision(decision: &Decision) -> Result<Self, TypesError> {
        Ok(Self {
            cycle: decision.cycle,
            slot: decision.hemisphere.slot().to_string(),
            hemisphere: decision.hemisphere,
            status: decision.verdict.into(),
            hypothesis_id: decision.hypothesis_id.clone(),
            decision_hash: decision.hash()?,
            evidence_hash: decision.evidence,
            note: format!("hemi={}", decision.hemisphere.tag()),
        })
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ReceiptStatus::Accepted
    }
}
