//! Property tests: no sequence of threshold proposals can leave the
//! conservative hemisphere looser than the exploratory one.

use maat_engine::{PolicyHistory, ThresholdPolicy, ThresholdSchedule};
use maat_types::{check_strictness, GateThresholds, HemisphereKind};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// Replays a fixed list of proposals, one per call.
struct Replay(Vec<GateThresholds>);

impl ThresholdPolicy for Replay {
    fn name(&self) -> &str {
        "replay"
    }

    fn propose_thresholds(
        &mut self,
        _hemisphere: HemisphereKind,
        _current: &GateThresholds,
        _history: &PolicyHistory,
    ) -> Option<GateThresholds> {
        self.0.pop()
    }
}

fn arb_thresholds() -> impl Strategy<Value = GateThresholds> {
    (0.0f64..1.0, 0.0f64..20.0, -30.0f64..10.0)
        .prop_map(|(b, c, m)| GateThresholds::new(b, c, m))
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn schedule_preserves_strictness(
        proposals in prop::collection::vec(arb_thresholds(), 0..40),
    ) {
        let mut schedule = ThresholdSchedule::new(Box::new(Replay(proposals))).with_cooldown(1);
        let mut exploratory = GateThresholds::exploratory();
        let mut conservative = GateThresholds::conservative();
        let history = PolicyHistory::default();

        for cycle in 1..=20 {
            let before = (exploratory, conservative);
            let updates = schedule.step(cycle, &mut exploratory, &mut conservative, &history);
            prop_assert!(check_strictness(&exploratory, &conservative).is_ok());

            for u in &updates {
                let other = match u.hemisphere {
                    HemisphereKind::Exploratory => before.1,
                    HemisphereKind::Conservative => exploratory,
                };
                let guarded = ThresholdSchedule::guard(u.hemisphere, &u.proposed, &other);
                prop_assert_eq!(u.applied, guarded.is_ok());
                prop_assert_eq!(u.reason.is_some(), !u.applied);
            }
        }
    }

    #[test]
    fn guard_agrees_with_strictness_check(
        exploratory in arb_thresholds(),
        conservative in arb_thresholds(),
    ) {
        let expected = check_strictness(&exploratory, &conservative).is_ok();
        let exp =
            ThresholdSchedule::guard(HemisphereKind::Exploratory, &exploratory, &conservative);
        prop_assert_eq!(exp.is_ok(), expected);
        let cons =
            ThresholdSchedule::guard(HemisphereKind::Conservative, &conservative, &exploratory);
        prop_assert_eq!(cons.is_ok(), expected);
    }

    /// A schedule with cooldown `k` runs at most once in any `k` consecutive cycles.
    #[test]
    fn cooldown_bounds_invocations(cooldown in 1u64..8, cycles in 1u64..60) {
        let proposals = vec![GateThresholds::exploratory(); 200];
        let mut schedule =
            ThresholdSchedule::new(Box::new(Replay(proposals))).with_cooldown(cooldown);
        let mut exploratory = GateThresholds::exploratory();
        let mut conservative = GateThresholds::conservative();
        let history = PolicyHistory::default();

        let mut invoked = Vec::new();
        for cycle in 1..=cycles {
            if !schedule.step(cycle, &mut exploratory, &mut conservative, &history).is_empty() {
                invoked.push(cycle);
            }
        }
        prop_assert_eq!(invoked.len() as u64, cycles / cooldown);
        for pair in invoked.windows(2) {
            prop_assert!(pair[1] - pair[0] >= cooldown);
        }
    }
}
