use maat_types::{HemisphereKind, Verdict};
use serde::{Deserialize, Serialize};

/// Verdict tallies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub accept: u64,
    pub defer: u64,
    pub reject: u64,
}

impl VerdictCounts {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Accept => self.accept += 1,
            Verdict::Defer => self.defer += 1,
            Verdict::Reject => self.reject += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.accept + self.defer + self.reject
    }

    /// Accepted share of all verdicts, 0 when there are none.
    pub fn accept_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => self.accept as f64 / n as f64,
        }
    }

    pub fn merge(&mut self, other: &VerdictCounts) {
        self.accept += other.accept;
        self.defer += other.defer;
        self.reject += other.reject;
    }
}

/// Cumulative counters for one hemisphere pair.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub cycles: u64,
    pub hypotheses: u64,
    pub blocked: u64,
    pub estimator_failures: u64,
    pub source_failures: u64,
    pub callosum_transfers: u64,
    pub threshold_updates: u64,
    pub exploratory: VerdictCounts,
    pub conservative: VerdictCounts,
}

impl EngineStats {
    pub fn counts(&self, hemisphere: HemisphereKind) -> &VerdictCounts {
        match hemisphere {
            HemisphereKind::Exploratory => &self.exploratory,
            HemisphereKind::Conservative => &self.conservative,
        }
    }

    pub(crate) fn record(&mut self, hemisphere: HemisphereKind, verdict: Verdict) {
        match hemisphere {
            HemisphereKind::Exploratory => self.exploratory.record(verdict),
            HemisphereKind::Conservative => self.conservative.record(verdict),
        }
    }
}
