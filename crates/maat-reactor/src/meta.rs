use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use maat_engine::VerdictCounts;
use maat_types::{FieldValue, Observation, ObservationOrigin, ReceiptStatus, TypesError};

/// Receipts the meta series looks back over.
pub const META_WINDOW: usize = 32;

/// Smoothed acceptance signal over the most recent receipt statuses:
/// `s <- 0.7 s + 0.3 a` with `a` 1 for accepted and 0 otherwise. Four
/// zeros when there are no receipts yet.
pub fn meta_series(statuses: &[ReceiptStatus]) -> Vec<f64> {
    let recent = &statuses[statuses.len().saturating_sub(META_WINDOW)..];
    if recent.is_empty() {
        return vec![0.0; 4];
    }
    let mut s = 0.0;
    recent
        .iter()
        .map(|status| {
            let a = if *status == ReceiptStatus::Accepted { 1.0 } else { 0.0 };
            s = 0.7 * s + 0.3 * a;
            s
        })
        .collect()
}

/// Observation the outer pair judges: the inner pair's smoothed
/// acceptance series plus this cycle's verdict counts.
///
/// Pure in its arguments, so identical runs yield identical ids.
pub fn meta_observation(
    statuses: &[ReceiptStatus],
    cycle_counts: &VerdictCounts,
    cycle: u64,
    timestamp: DateTime<Utc>,
) -> Result<Observation, TypesError> {
    let mut fields = BTreeMap::new();
    fields.insert("x".to_string(), FieldValue::Series(meta_series(statuses)));
    fields.insert("cycle".to_string(), FieldValue::Number(cycle as f64));
    fields.insert("accepted".to_string(), FieldValue::Number(cycle_counts.accept as f64));
    fields.insert("deferred".to_string(), FieldValue::Number(cycle_counts.defer as f64));
    fields.insert("rejected".to_string(), FieldValue::Number(cycle_counts.reject as f64));
    fields.insert("accept_rate".to_string(), FieldValue::Number(cycle_counts.accept_rate()));
    Observation::new("internal:inner_receipts", ObservationOrigin::Meta, timestamp, fields)
}
