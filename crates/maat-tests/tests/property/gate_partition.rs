//! Property tests: the triple gate is a pure, total partition of the
//! statistics space.

use maat_gate::{GateEvaluator, GatePasses};
use maat_types::{GateThresholds, TestStatistics, Verdict};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_statistics() -> impl Strategy<Value = TestStatistics> {
    (0.0f64..=1.0, 0.0f64..30.0, -60.0f64..60.0)
        .prop_map(|(p, c, m)| TestStatistics::new(p, c, m))
}

fn arb_thresholds() -> impl Strategy<Value = GateThresholds> {
    prop_oneof![
        Just(GateThresholds::exploratory()),
        Just(GateThresholds::conservative()),
        (0.5f64..0.99, 2.0f64..15.0, -30.0f64..0.0)
            .prop_map(|(b, c, m)| GateThresholds::new(b, c, m)),
    ]
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Accept iff all three gates pass; Reject iff both evidence gates fail.
    #[test]
    fn verdict_matches_gate_outcomes(stats in arb_statistics(), t in arb_thresholds()) {
        let report = GateEvaluator::default().evaluate(&stats, &t);
        let bayes = stats.posterior_mean >= t.bayes;
        let coherence = stats.coherence_ratio >= t.coherence;
        let mdl = stats.mdl_delta_bits <= t.mdl;

        prop_assert_eq!(report.passes, GatePasses { bayes, coherence, mdl });
        prop_assert_eq!(report.verdict == Verdict::Accept, bayes && coherence && mdl);
        prop_assert_eq!(report.verdict == Verdict::Reject, !bayes && !coherence);
        prop_assert_eq!(report.reasons.len(), 3);
    }

    /// Same inputs, same report.
    #[test]
    fn evaluation_is_pure(stats in arb_statistics(), t in arb_thresholds()) {
        let evaluator = GateEvaluator::default();
        prop_assert_eq!(evaluator.evaluate(&stats, &t), evaluator.evaluate(&stats, &t));
    }

    #[test]
    fn attention_is_a_probability(stats in arb_statistics()) {
        let attention = GateEvaluator::default().attention(&stats);
        prop_assert!(attention > 0.0 && attention < 1.0);
    }

    /// Whatever the conservative set accepts, the exploratory set accepts too.
    #[test]
    fn conservative_accepts_imply_exploratory_accepts(stats in arb_statistics()) {
        let evaluator = GateEvaluator::default();
        let conservative = evaluator.evaluate(&stats, &GateThresholds::conservative());
        let exploratory = evaluator.evaluate(&stats, &GateThresholds::exploratory());
        if conservative.verdict == Verdict::Accept {
            prop_assert_eq!(exploratory.verdict, Verdict::Accept);
        }
        if exploratory.verdict == Verdict::Reject {
            prop_assert_eq!(conservative.verdict, Verdict::Reject);
        }
    }
}
