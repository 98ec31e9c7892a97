//! Shared fixtures for the cross-crate tests.
//!
//! Hypotheses here carry their statistics in the claim text ("p,c,m"), so
//! a test can pick exact gate outcomes without tuning a series.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use maat_engine::{HemispherePair, HypothesisSource, SourceError};
use maat_estimators::{Estimator, EstimatorError, EstimatorSuite};
use maat_ledger::{LedgerError, LedgerSink, MemoryLedger};
use maat_types::{
    CausalLink, ContentHash, FieldValue, HemisphereKind, Hypothesis, LedgerRecord, Observation,
    ObservationOrigin,
};

/// Reads statistic `index` from a "p,c,m" claim.
pub struct ClaimStatistic(pub usize);

impl Estimator for ClaimStatistic {
    fn name(&self) -> &'static str {
        "claim_statistic"
    }

    fn estimate(&self, _window: &[f64], hypothesis: &Hypothesis) -> Result<f64, EstimatorError> {
        hypothesis
            .claim
            .split(',')
            .nth(self.0)
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| EstimatorError::Failed {
                estimator: "claim_statistic",
                message: format!("unparsable claim {:?}", hypothesis.claim),
            })
    }
}

pub fn claim_suite() -> EstimatorSuite {
    EstimatorSuite::new(
        Arc::new(ClaimStatistic(0)),
        Arc::new(ClaimStatistic(1)),
        Arc::new(ClaimStatistic(2)),
    )
}

/// Serves the same claims every cycle; claim `i` is linked `in{i} -> x`.
pub struct ClaimSource {
    claims: Vec<String>,
}

impl ClaimSource {
    pub fn new(claims: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            claims: claims.into_iter().map(Into::into).collect(),
        }
    }
}

impl HypothesisSource for ClaimSource {
    fn name(&self) -> &str {
        "claims"
    }

    fn generate(
        &mut self,
        observation: &Observation,
        max_count: usize,
    ) -> Result<Vec<Hypothesis>, SourceError> {
        self.claims
            .iter()
            .take(max_count)
            .enumerate()
            .map(|(i, claim)| {
                Hypothesis::new(
                    claim.as_str(),
                    HemisphereKind::Exploratory,
                    vec![observation.id.clone()],
                    i as u32,
                    Some(CausalLink::new([format!("in{i}")], "x")),
                )
                .map_err(SourceError::from)
            })
            .collect()
    }
}

/// Always fails.
pub struct OfflineSource;

impl HypothesisSource for OfflineSource {
    fn name(&self) -> &str {
        "offline"
    }

    fn generate(&mut self, _: &Observation, _: usize) -> Result<Vec<Hypothesis>, SourceError> {
        Err(SourceError::Unavailable("offline".into()))
    }
}

/// A [`MemoryLedger`] the test keeps a handle to after boxing it into a pair.
#[derive(Clone, Default)]
pub struct SharedLedger(Arc<Mutex<MemoryLedger>>);

impl SharedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LedgerRecord> {
        self.0
            .lock()
            .map(|l| l.records().cloned().collect())
            .unwrap_or_default()
    }
}

impl LedgerSink for SharedLedger {
    fn append(&mut self, record: &LedgerRecord) -> Result<ContentHash, LedgerError> {
        match self.0.lock() {
            Ok(mut ledger) => ledger.append(record),
            Err(poisoned) => poisoned.into_inner().append(record),
        }
    }
}

/// External observation of `series` in field `x`, `t` seconds past a fixed epoch.
pub fn observation(t: i64, series: Vec<f64>) -> Observation {
    let mut fields = BTreeMap::new();
    fields.insert("x".to_string(), FieldValue::Series(series));
    let timestamp = Utc
        .timestamp_opt(1_700_000_000 + t, 0)
        .single()
        .unwrap_or_default();
    Observation::new("test:feed", ObservationOrigin::External, timestamp, fields)
        .unwrap_or_else(|e| panic!("fixture observation: {e}"))
}

/// A pair fed by [`ClaimSource`] and measured by [`claim_suite`].
pub fn claim_pair(claims: &[&str], ledger: Box<dyn LedgerSink>) -> HemispherePair {
    HemispherePair::new("fixture", Box::new(ClaimSource::new(claims.iter().copied())), ledger)
        .with_estimators(claim_suite())
}
