//! End-to-end test: collaborator failures never abort a cycle.

use maat_engine::{CycleControls, HemispherePair};
use maat_ledger::NullLedger;
use maat_tests::{claim_pair, claim_suite, observation, OfflineSource, SharedLedger};
use maat_types::{LedgerRecord, ReceiptStatus, Verdict};

#[test]
fn estimator_failure_rejects_one_hypothesis_and_keeps_going() {
    let ledger = SharedLedger::new();
    let mut pair = claim_pair(&["not numbers", "0.99,9.0,-20.0"], Box::new(ledger.clone()));
    let out = pair
        .run_cycle(&observation(0, vec![1.0, 2.0]), &CycleControls::default())
        .unwrap();

    let failed = &out.decisions[0];
    assert_eq!(failed.verdict, Verdict::Reject);
    assert!(failed.statistics.is_none());
    assert!(failed.evidence.is_none());
    assert_eq!(failed.attention, 0.0);
    assert!(failed.reasons[0].starts_with("estimator failure:"));
    assert_eq!(out.receipts[0].status, ReceiptStatus::Rejected);

    assert_eq!(out.decisions[1].verdict, Verdict::Accept);
    assert_eq!(pair.stats().estimator_failures, 1);

    let evidence = ledger
        .records()
        .iter()
        .filter(|r| matches!(r, LedgerRecord::Evidence(_)))
        .count();
    assert_eq!(evidence, 1);
}

#[test]
fn source_failure_yields_an_empty_cycle() {
    let mut pair = HemispherePair::new("offline", Box::new(OfflineSource), Box::new(NullLedger))
        .with_estimators(claim_suite());
    for t in 0..3 {
        let out = pair
            .run_cycle(&observation(t, vec![0.0; 4]), &CycleControls::default())
            .unwrap();
        assert!(out.hypotheses.is_empty());
        assert!(out.decisions.is_empty());
    }
    assert_eq!(pair.stats().source_failures, 3);
    assert_eq!(pair.stats().cycles, 3);
}

#[test]
fn semantic_floor_rejects_over_passing_gates() {
    let mut pair = claim_pair(&["0.99,9.0,-20.0"], Box::new(NullLedger));
    let controls = CycleControls::default().with_min_attention(0.99);
    let out = pair
        .run_cycle(&observation(0, vec![0.0; 4]), &controls)
        .unwrap();
    assert_eq!(out.decisions.len(), 1);
    assert_eq!(out.decisions[0].verdict, Verdict::Reject);
    let d = &out.decisions[0];
    assert_eq!(d.reasons.len(), 4);
    assert!(d.reasons[3].starts_with("semantic filter: attention="));
    assert!(d.below_floor());
    assert_eq!(out.evidence.len(), 1);
}
