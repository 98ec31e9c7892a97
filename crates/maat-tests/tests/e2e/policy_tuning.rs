//! End-to-end test: a learning threshold policy tightens an over-accepting
//! exploratory hemisphere but never past the conservative one.

use maat_engine::{CycleControls, LearnedGatesConfig, LearnedGatesPolicy, ThresholdSchedule};
use maat_ledger::NullLedger;
use maat_tests::{claim_pair, observation};
use maat_types::{check_strictness, GateThresholds, HemisphereKind};

#[test]
fn tightening_stops_at_the_conservative_bound() {
    let schedule = ThresholdSchedule::new(Box::new(LearnedGatesPolicy::new(
        LearnedGatesConfig::default(),
    )))
    .with_cooldown(1);
    let mut pair = claim_pair(&["0.99,9.0,-20.0"], Box::new(NullLedger)).with_schedule(schedule);

    let mut updates = Vec::new();
    for t in 0..8 {
        let out = pair
            .run_cycle(&observation(t, vec![0.2; 4]), &CycleControls::default())
            .unwrap();
        check_strictness(
            pair.thresholds(HemisphereKind::Exploratory),
            pair.thresholds(HemisphereKind::Conservative),
        )
        .unwrap();
        updates.extend(out.threshold_updates);
    }

    assert!(updates.iter().any(|u| u.applied));
    let refused: Vec<_> = updates.iter().filter(|u| !u.applied).collect();
    assert!(!refused.is_empty());
    assert!(refused
        .iter()
        .all(|u| u.reason.as_deref().is_some_and(|r| r.starts_with("proposal rejected"))));

    let exploratory = pair.thresholds(HemisphereKind::Exploratory);
    assert!(exploratory.bayes > GateThresholds::exploratory().bayes);
    assert_eq!(
        *pair.thresholds(HemisphereKind::Conservative),
        GateThresholds::conservative()
    );
}

#[test]
fn cooldown_spaces_out_policy_runs() {
    let schedule = ThresholdSchedule::new(Box::new(LearnedGatesPolicy::new(
        LearnedGatesConfig::default(),
    )))
    .with_cooldown(3);
    let mut pair = claim_pair(&["0.99,9.0,-20.0"], Box::new(NullLedger)).with_schedule(schedule);

    let mut update_cycles = Vec::new();
    for t in 0..9 {
        let out = pair
            .run_cycle(&observation(t, vec![0.2; 4]), &CycleControls::default())
            .unwrap();
        if !out.threshold_updates.is_empty() {
            update_cycles.push(out.cycle);
        }
    }
    assert_eq!(update_cycles, vec![3, 6, 9]);
}
