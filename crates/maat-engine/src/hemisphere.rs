use maat_gate::GateEvaluator;
use maat_types::{
    ContentHash, Decision, GateThresholds, HemisphereKind, Hypothesis, TestStatistics, Verdict,
};

/// One evaluation stage: a kind, its thresholds and the gate that applies
/// them.
#[derive(Clone, Debug)]
pub struct Hemisphere {
    kind: HemisphereKind,
    thresholds: GateThresholds,
    evaluator: GateEvaluator,
}

impl Hemisphere {
    pub fn new(kind: HemisphereKind, thresholds: GateThresholds) -> Self {
        Self {
            kind,
            thresholds,
            evaluator: GateEvaluator::default(),
        }
    }

    /// Exploratory stage with the default loose thresholds.
    pub fn exploratory() -> Self {
        Self::new(HemisphereKind::Exploratory, GateThresholds::exploratory())
    }

    /// Conservative stage with the default strict thresholds.
    pub fn conservative() -> Self {
        Self::new(HemisphereKind::Conservative, GateThresholds::conservative())
    }

    pub fn with_evaluator(mut self, evaluator: GateEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn kind(&self) -> HemisphereKind {
        self.kind
    }

    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }

    pub(crate) fn thresholds_mut(&mut self) -> &mut GateThresholds {
        &mut self.thresholds
    }

    pub fn attention(&self, stats: &TestStatistics) -> f64 {
        self.evaluator.attention(stats)
    }

    /// Gate a measured hypothesis with this hemisphere's thresholds.
    pub fn judge(
        &self,
        cycle: u64,
        hypothesis: &Hypothesis,
        stats: &TestStatistics,
        evidence: ContentHash,
    ) -> Decision {
        let report = self.evaluator.evaluate(stats, &self.thresholds);
        Decision {
            cycle,
            hypothesis_id: hypothesis.id.clone(),
            hemisphere: self.kind,
            statistics: Some(*stats),
            thresholds: self.thresholds,
            verdict: report.verdict,
            attention: report.attention,
            reasons: report.reasons,
            attention_floor: None,
            evidence: Some(evidence),
        }
    }

    /// Gate, then apply the semantic floor on top of the gate verdict.
    ///
    /// The floor is recorded whenever it is positive, and a rejection by
    /// the floor keeps the three gate reasons ahead of the floor line.
    pub fn judge_with_floor(
        &self,
        cycle: u64,
        hypothesis: &Hypothesis,
        stats: &TestStatistics,
        evidence: ContentHash,
        floor: f64,
    ) -> Decision {
        let mut decision = self.judge(cycle, hypothesis, stats, evidence);
        if floor > 0.0 {
            decision.attention_floor = Some(floor);
        }
        if decision.below_floor() {
            decision.verdict = Verdict::Reject;
            decision.reasons.push(format!(
                "semantic filter: attention={} < floor {}",
                decision.attention, floor
            ));
        }
        decision
    }

    /// Reject without gating, e.g. after an estimator failure.
    pub fn reject(
        &self,
        cycle: u64,
        hypothesis: &Hypothesis,
        statistics: Option<TestStatistics>,
        attention: f64,
        reason: String,
        evidence: Option<ContentHash>,
    ) -> Decision {
        Decision {
            cycle,
            hypothesis_id: hypothesis.id.clone(),
            hemisphere: self.kind,
            statistics,
            thresholds: self.thresholds,
            verdict: Verdict::Reject,
            attention,
            reasons: vec![reason],
            attention_floor: None,
            evidence,
        }
    }
}
