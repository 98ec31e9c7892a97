use std::collections::HashSet;

use maat_types::{ContentHash, HemisphereKind, HypothesisId, LedgerRecord, RecordKind};
use tracing::debug;

use crate::error::LedgerError;
use crate::sink::LedgerSink;

/// A stored record with its position and key.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerEntry {
    pub sequence: u64,
    pub ukh: ContentHash,
    pub record: LedgerRecord,
}

impl LedgerEntry {
    fn cycle(&self) -> Option<u64> {
        match &self.record {
            LedgerRecord::Decision(d) => Some(d.cycle),
            LedgerRecord::Receipt(r) => Some(r.cycle),
            _ => None,
        }
    }

    fn hemisphere(&self) -> Option<HemisphereKind> {
        match &self.record {
            LedgerRecord::Hypothesis(h) => Some(h.hemisphere),
            LedgerRecord::Decision(d) => Some(d.hemisphere),
            LedgerRecord::Receipt(r) => Some(r.hemisphere),
            _ => None,
        }
    }

    fn hypothesis_id(&self) -> Option<&HypothesisId> {
        match &self.record {
            LedgerRecord::Hypothesis(h) => Some(&h.id),
            LedgerRecord::Evidence(e) => Some(&e.hypothesis_id),
            LedgerRecord::Decision(d) => Some(&d.hypothesis_id),
            LedgerRecord::Receipt(r) => Some(&r.hypothesis_id),
            LedgerRecord::Observation(_) => None,
        }
    }
}

/// Filter for querying the ledger.
#[derive(Clone, Debug, Default)]
pub struct LedgerFilter {
    pub kind: Option<RecordKind>,
    pub cycle: Option<u64>,
    pub hemisphere: Option<HemisphereKind>,
    pub hypothesis: Option<HypothesisId>,
}

impl LedgerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    pub fn with_hemisphere(mut self, hemisphere: HemisphereKind) -> Self {
        self.hemisphere = Some(hemisphere);
        self
    }

    pub fn with_hypothesis(mut self, id: HypothesisId) -> Self {
        self.hypothesis = Some(id);
        self
    }

    /// Check if an entry matches this filter.
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        if let Some(kind) = self.kind {
            if entry.record.kind() != kind {
                return false;
            }
        }
        if let Some(cycle) = self.cycle {
            if entry.cycle() != Some(cycle) {
                return false;
            }
        }
        if let Some(hemisphere) = self.hemisphere {
            if entry.hemisphere() != Some(hemisphere) {
                return false;
            }
        }
        if let Some(ref id) = self.hypothesis {
            if entry.hypothesis_id() != Some(id) {
                return false;
            }
        }
        true
    }
}

/// In-memory, append-only ledger. No delete or modify operations exist.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Vec<LedgerEntry>,
    keys: HashSet<ContentHash>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query entries matching a filter, in append order.
    pub fn query(&self, filter: &LedgerFilter) -> Vec<&LedgerEntry> {
        self.entries.iter().filter(|e| filter.matches(e)).collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &LedgerRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LedgerSink for MemoryLedger {
    fn append(&mut self, record: &LedgerRecord) -> Result<ContentHash, LedgerError> {
        let ukh = record.ukh()?;
        if !self.keys.insert(ukh) {
            return Err(LedgerError::DuplicateEntry(ukh));
        }
        let sequence = self.entries.len() as u64;
        debug!(sequence, kind = %record.kind(), "Ledger append");
        self.entries.push(LedgerEntry {
            sequence,
            ukh,
            record: record.clone(),
        });
        Ok(ukh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maat_types::{
        Decision, GateThresholds, Receipt, TestStatistics, Verdict,
    };

    fn decision(cycle: u64, hemisphere: HemisphereKind, verdict: Verdict) -> Decision {
        Decision {
            cycle,
            hypothesis_id: HypothesisId(format!("hyp_{:016x}", cycle)),
            hemisphere,
            statistics: Some(TestStatistics::new(0.9, 9.0, -20.0)),
            thresholds: GateThresholds::exploratory(),
            verdict,
            attention: 0.5,
            reasons: vec![],
            attention_floor: None,
            evidence: None,
        }
    }

    #[test]
    fn append_preserves_order() {
        let mut ledger = MemoryLedger::new();
        for cycle in 0..3 {
            let d = decision(cycle, HemisphereKind::Exploratory, Verdict::Defer);
            ledger.append(&LedgerRecord::Decision(d)).unwrap();
        }
        let seqs: Vec<u64> = ledger.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn duplicate_records_are_refused() {
        let mut ledger = MemoryLedger::new();
        let rec = LedgerRecord::Decision(decision(1, HemisphereKind::Exploratory, Verdict::Accept));
        ledger.append(&rec).unwrap();
        assert!(matches!(ledger.append(&rec), Err(LedgerError::DuplicateEntry(_))));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn filters_combine() {
        let mut ledger = MemoryLedger::new();
        let d1 = decision(1, HemisphereKind::Exploratory, Verdict::Accept);
        let d2 = decision(1, HemisphereKind::Conservative, Verdict::Defer);
        let r1 = Receipt::for_decision(&d1).unwrap();
        for rec in [
            LedgerRecord::Decision(d1.clone()),
            LedgerRecord::Receipt(r1),
            LedgerRecord::Decision(d2),
        ] {
            ledger.append(&rec).unwrap();
        }

        let decisions = ledger.query(&LedgerFilter::new().with_kind(RecordKind::Decision));
        assert_eq!(decisions.len(), 2);

        let conservative = ledger.query(
            &LedgerFilter::new()
                .with_kind(RecordKind::Decision)
                .with_hemisphere(HemisphereKind::Conservative),
        );
        assert_eq!(conservative.len(), 1);

        let by_hyp = ledger.query(&LedgerFilter::new().with_hypothesis(d1.hypothesis_id.clone()));
        assert_eq!(by_hyp.len(), 3);

        assert!(ledger.query(&LedgerFilter::new().with_cycle(2)).is_empty());
    }
}
