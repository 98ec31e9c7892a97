//! End-to-end test: SCRAM halts the recursive loop for good.

use maat_ledger::NullLedger;
use maat_reactor::{
    CycleStatus, DamperKind, ReactorConfig, RecursiveLoop, ScramLimits, ScramReason,
};
use maat_tests::{claim_pair, observation};

const ACCEPTED: &str = "0.99,9.0,-20.0";
const REJECTED: &str = "0.1,0.5,5.0";

fn reactor(config: ReactorConfig) -> RecursiveLoop {
    RecursiveLoop::new(config, Box::new(NullLedger), Box::new(NullLedger)).unwrap()
}

/// A loop whose inner and outer pairs serve fixed claims.
fn claim_loop(config: ReactorConfig, inner: &[&str], outer: &[&str]) -> RecursiveLoop {
    RecursiveLoop::from_pairs(
        config,
        claim_pair(inner, Box::new(NullLedger)),
        claim_pair(outer, Box::new(NullLedger)),
    )
    .unwrap()
}

#[test]
fn stress_preset_trips_and_stays_halted() {
    let mut r = reactor(ReactorConfig::stress());
    let report = r.run(100).unwrap();

    let reason = report.scram.unwrap();
    let tripped_at = report.totals.scram_cycle.unwrap();
    assert!(tripped_at <= 10, "tripped at {tripped_at}: {reason}");
    assert_eq!(report.cycles.len() as u64, tripped_at);
    for kind in DamperKind::ALL {
        assert_eq!(report.dampers.depth(kind), 1.0, "{kind}");
    }

    let before = r.totals().clone();
    for t in 0..3 {
        let halted = r.run_cycle_with(&observation(t, vec![0.5; 64])).unwrap();
        assert_eq!(halted.status, CycleStatus::Halted);
        assert_eq!(halted.scram, Some(reason));
        assert!(halted.telemetry.is_none());
        assert!(halted.adjustments.is_empty());
    }
    assert_eq!(r.cycle(), tripped_at);
    assert_eq!(r.totals(), &before);
    assert!(r.governor().is_latched());
}

#[test]
fn temperature_ceiling_trips_at_the_horizon() {
    let mut config = ReactorConfig::default();
    config.telemetry.horizon = 4;
    config.scram = ScramLimits {
        criticality_ceiling: f64::INFINITY,
        reality_floor: f64::NEG_INFINITY,
        ..ScramLimits::default()
    };
    let mut r = reactor(config);
    let report = r.run(20).unwrap();

    assert_eq!(report.totals.scram_cycle, Some(4));
    assert!(matches!(report.scram, Some(ScramReason::Temperature { .. })));
    let statuses: Vec<_> = report.cycles.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![
            CycleStatus::Running,
            CycleStatus::Running,
            CycleStatus::Running,
            CycleStatus::Scrammed
        ]
    );
}

#[test]
fn disabled_scram_never_halts() {
    let mut config = ReactorConfig::stress();
    config.scram.enabled = false;
    let mut r = reactor(config);
    let report = r.run(15).unwrap();
    assert_eq!(report.cycles.len(), 15);
    assert!(report.scram.is_none());
    assert!(!r.is_halted());
}

#[test]
fn dampers_shrink_what_the_pairs_are_asked_for() {
    let mut config = ReactorConfig::default();
    config.telemetry.horizon = 2;
    config.scram.enabled = false;
    let mut r = reactor(config.clone());
    r.run(6).unwrap();

    let controls = r.governor().controls(&config.engine);
    assert!(controls.max_hypotheses < config.engine.hypotheses_per_cycle);
    assert!(controls.window_len.unwrap_or(usize::MAX) < config.engine.window_len);
}

#[test]
fn runaway_outer_acceptance_trips_criticality() {
    let mut r = claim_loop(
        ReactorConfig::default(),
        &[REJECTED, REJECTED, REJECTED],
        &[ACCEPTED, ACCEPTED, ACCEPTED],
    );
    let report = r.run_cycle_with(&observation(0, vec![0.5; 64])).unwrap();

    assert_eq!(report.status, CycleStatus::Scrammed);
    assert_eq!(
        report.scram,
        Some(ScramReason::Criticality {
            value: 4.0,
            ceiling: 1.8
        })
    );
    assert_eq!(report.telemetry.unwrap().criticality, 4.0);
    assert!(report.dampers.all_fully_inserted());

    let halted = r.run_cycle_with(&observation(1, vec![0.5; 64])).unwrap();
    assert_eq!(halted.status, CycleStatus::Halted);
    assert_eq!(r.cycle(), 1);
}

#[test]
fn external_series_far_from_meta_trips_reality() {
    let mut r = claim_loop(ReactorConfig::default(), &[ACCEPTED], &[ACCEPTED]);
    let report = r.run_cycle_with(&observation(0, vec![50.0; 64])).unwrap();

    let telemetry = report.telemetry.unwrap();
    assert_eq!(telemetry.criticality, 1.0);
    assert_eq!(telemetry.reality, 0.0);
    assert_eq!(report.status, CycleStatus::Scrammed);
    assert_eq!(
        report.scram,
        Some(ScramReason::RealityCorrelation {
            value: 0.0,
            floor: 0.05
        })
    );
    assert!(r.is_halted());
}

#[test]
fn reality_anchor_blocks_meta_derived_hypotheses() {
    let mut config = ReactorConfig::default();
    config.scram.enabled = false;
    let mut r = claim_loop(config, &[ACCEPTED], &[ACCEPTED]);

    let reports: Vec<_> = (0..4)
        .map(|t| r.run_cycle_with(&observation(t, vec![50.0; 64])).unwrap())
        .collect();

    let depths: Vec<f64> = reports
        .iter()
        .map(|c| c.dampers.depth(DamperKind::RealityAnchor))
        .collect();
    assert!(depths.windows(2).all(|w| w[1] >= w[0]), "{depths:?}");
    assert!(depths[2] >= 0.5);

    // the first cycle ran unanchored
    let first = reports[0].outer.as_ref().unwrap();
    assert!(first.blocked.is_empty());
    assert!(!first.decisions.is_empty());

    // from the fourth cycle meta observations are no longer grounds
    let last = &reports[3];
    let outer = last.outer.as_ref().unwrap();
    assert!(!outer.blocked.is_empty());
    for blocked in &outer.blocked {
        assert!(blocked.reason.starts_with("reality anchor: observation"));
        assert!(blocked.reason.ends_with("is not external"));
    }
    assert!(outer.decisions.is_empty());

    let inner = last.inner.as_ref().unwrap();
    assert!(inner.blocked.is_empty());
    assert!(!inner.decisions.is_empty());
}
