use std::sync::Arc;

use maat_types::{GateThresholds, TestStatistics, Verdict};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attention::{AttentionScorer, WeightedAttention};

/// Which gates a set of statistics passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePasses {
    pub bayes: bool,
    pub coherence: bool,
    pub mdl: bool,
}

impl GatePasses {
    pub fn check(stats: &TestStatistics, thresholds: &GateThresholds) -> Self {
        Self {
            bayes: stats.posterior_mean >= thresholds.bayes,
            coherence: stats.coherence_ratio >= thresholds.coherence,
            mdl: stats.mdl_delta_bits <= thresholds.mdl,
        }
    }

    /// Accept on three of three; Reject when both evidence gates fail.
    pub fn verdict(&self) -> Verdict {
        if self.bayes && self.coherence && self.mdl {
            Verdict::Accept
        } else if !self.bayes && !self.coherence {
            Verdict::Reject
        } else {
            Verdict::Defer
        }
    }

    pub fn count(&self) -> usize {
        [self.bayes, self.coherence, self.mdl]
            .iter()
            .filter(|p| **p)
            .count()
    }
}

/// Output of one gate evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateReport {
    pub verdict: Verdict,
    pub passes: GatePasses,
    pub attention: f64,
    /// One line per gate, in bayes/coherence/mdl order.
    pub reasons: Vec<String>,
}

/// Stateless triple-gate evaluator.
#[derive(Clone)]
pub struct GateEvaluator {
    scorer: Arc<dyn AttentionScorer>,
}

impl Default for GateEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(WeightedAttention::default()))
    }
}

impl std::fmt::Debug for GateEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateEvaluator").finish_non_exhaustive()
    }
}

impl GateEvaluator {
    pub fn new(scorer: Arc<dyn AttentionScorer>) -> Self {
        Self { scorer }
    }

    /// Attention for a set of statistics, without judging them.
    pub fn attention(&self, stats: &TestStatistics) -> f64 {
        self.scorer.score(stats)
    }

    /// Judge statistics against one hemisphere's thresholds.
    pub fn evaluate(&self, stats: &TestStatistics, thresholds: &GateThresholds) -> GateReport {
        let passes = GatePasses::check(stats, thresholds);
        let verdict = passes.verdict();
        let attention = self.attention(stats);
        debug!(
            %verdict,
            gates_passed = passes.count(),
            attention,
            "Gate evaluated"
        );
        GateReport {
            verdict,
            passes,
            attention,
            reasons: reasons(stats, thresholds, &passes),
        }
    }
}

/// Reason lines stating each comparison and its outcome.
///
/// Both sides print in shortest round-trip form so the line never shows a
/// comparison that reads the wrong way after rounding.
pub fn reasons(
    stats: &TestStatistics,
    thresholds: &GateThresholds,
    passes: &GatePasses,
) -> Vec<String> {
    vec![
        format!(
            "bayes {}: posterior_mean={} {} {}",
            outcome(passes.bayes),
            stats.posterior_mean,
            if passes.bayes { ">=" } else { "<" },
            thresholds.bayes
        ),
        format!(
            "coherence {}: coherence={} {} {}",
            outcome(passes.coherence),
            stats.coherence_ratio,
            if passes.coherence { ">=" } else { "<" },
            thresholds.coherence
        ),
        format!(
            "mdl {}: mdl_bits={} {} {}",
            outcome(passes.mdl),
            stats.mdl_delta_bits,
            if passes.mdl { "<=" } else { ">" },
            thresholds.mdl
        ),
    ]
}

fn outcome(pass: bool) -> &'static str {
    if pass {
        "pass"
    } else {
        "fail"
    }
}
