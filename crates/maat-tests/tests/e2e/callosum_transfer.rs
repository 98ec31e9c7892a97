//! End-to-end test: exploratory accepts are re-judged by the conservative
//! hemisphere against the same evidence, and the ledger records it in order.

use maat_engine::CycleControls;
use maat_ledger::{read_jsonl, JsonlLedger};
use maat_tests::{claim_pair, observation, SharedLedger};
use maat_types::{HemisphereKind, LedgerRecord, RecordKind, ReceiptStatus, Verdict};

const STRONG: &str = "0.99,9.0,-20.0";
const EXPLORATORY_ONLY: &str = "0.85,8.0,-9.0";
const WEAK: &str = "0.50,2.0,0.0";

fn kinds(records: &[LedgerRecord]) -> Vec<RecordKind> {
    records.iter().map(LedgerRecord::kind).collect()
}

#[test]
fn accepted_hypothesis_is_judged_twice_on_one_evidence() {
    let ledger = SharedLedger::new();
    let mut pair = claim_pair(&[STRONG], Box::new(ledger.clone()));
    let out = pair
        .run_cycle(&observation(0, vec![0.1, 0.2, 0.3]), &CycleControls::default())
        .unwrap();

    let records = ledger.records();
    assert_eq!(
        kinds(&records),
        vec![
            RecordKind::Observation,
            RecordKind::Hypothesis,
            RecordKind::Evidence,
            RecordKind::Decision,
            RecordKind::Receipt,
            RecordKind::Decision,
            RecordKind::Receipt,
        ]
    );

    let evidence_key = records[2].ukh().unwrap();
    let decisions: Vec<_> = records
        .iter()
        .filter_map(|r| match r {
            LedgerRecord::Decision(d) => Some(d),
            _ => None,
        })
        .collect();
    assert_eq!(decisions[0].hemisphere, HemisphereKind::Exploratory);
    assert_eq!(decisions[1].hemisphere, HemisphereKind::Conservative);
    assert_eq!(decisions[0].evidence, Some(evidence_key));
    assert_eq!(decisions[1].evidence, Some(evidence_key));
    assert_eq!(decisions[0].statistics, decisions[1].statistics);

    assert!(out.receipts.iter().all(|r| r.status == ReceiptStatus::Accepted));
    assert_eq!(out.receipts[0].slot, "slot_R");
    assert_eq!(out.receipts[1].slot, "slot_L");
}

#[test]
fn only_accepts_cross_the_callosum() {
    let ledger = SharedLedger::new();
    let mut pair = claim_pair(&[EXPLORATORY_ONLY, WEAK], Box::new(ledger.clone()));
    let out = pair
        .run_cycle(&observation(0, vec![0.5; 8]), &CycleControls::default())
        .unwrap();

    let exploratory: Vec<_> = out
        .decisions_for(HemisphereKind::Exploratory)
        .map(|d| d.verdict)
        .collect();
    assert_eq!(exploratory, vec![Verdict::Accept, Verdict::Reject]);

    let conservative: Vec<_> = out.decisions_for(HemisphereKind::Conservative).collect();
    assert_eq!(conservative.len(), 1);
    assert_eq!(conservative[0].hypothesis_id, out.hypotheses[0].id);
    assert_eq!(conservative[0].verdict, Verdict::Reject);
    assert_eq!(pair.stats().callosum_transfers, 1);
    assert_eq!(pair.stats().conservative.reject, 1);
}

#[test]
fn jsonl_ledger_replays_the_same_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pair.jsonl");
    let shared = SharedLedger::new();

    let mut to_file = claim_pair(
        &[STRONG, EXPLORATORY_ONLY, WEAK],
        Box::new(JsonlLedger::open(&path).unwrap()),
    );
    let mut to_memory = claim_pair(&[STRONG, EXPLORATORY_ONLY, WEAK], Box::new(shared.clone()));
    for t in 0..3 {
        let obs = observation(t, vec![0.1, 0.7, 0.3, 0.9]);
        to_file.run_cycle(&obs, &CycleControls::default()).unwrap();
        to_memory.run_cycle(&obs, &CycleControls::default()).unwrap();
    }
    drop(to_file);

    assert_eq!(read_jsonl(&path).unwrap(), shared.records());
}
