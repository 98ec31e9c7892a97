use maat_estimators::EstimatorSuite;
use maat_gate::GateEvaluator;
use maat_ledger::LedgerSink;
use maat_types::{
    check_strictness, Decision, Evidence, GateThresholds, HemisphereKind, Hypothesis,
    HypothesisId, LedgerRecord, Observation, ObservationId, Receipt, Verdict,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::causal::{CausalFilter, CausalGraph};
use crate::controls::{CycleControls, Grounding};
use crate::decidability::DecidabilityGate;
use crate::error::EngineError;
use crate::hemisphere::Hemisphere;
use crate::policy::{
    DecisionSummary, LearnedGatesPolicy, PolicyHistory, ThresholdSchedule, ThresholdUpdate,
};
use crate::source::HypothesisSource;
use crate::stats::{EngineStats, VerdictCounts};

/// A hypothesis refused before measurement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockedHypothesis {
    pub hypothesis_id: HypothesisId,
    pub claim: String,
    pub reason: String,
}

/// Everything one pair cycle produced, in production order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleOutput {
    pub cycle: u64,
    pub observation_id: ObservationId,
    pub hypotheses: Vec<Hypothesis>,
    pub evidence: Vec<Evidence>,
    pub decisions: Vec<Decision>,
    pub receipts: Vec<Receipt>,
    pub blocked: Vec<BlockedHypothesis>,
    pub threshold_updates: Vec<ThresholdUpdate>,
}

impl CycleOutput {
    fn new(cycle: u64, observation_id: ObservationId) -> Self {
        Self {
            cycle,
            observation_id,
            hypotheses: Vec::new(),
            evidence: Vec::new(),
            decisions: Vec::new(),
            receipts: Vec::new(),
            blocked: Vec::new(),
            threshold_updates: Vec::new(),
        }
    }

    pub fn decisions_for(&self, hemisphere: HemisphereKind) -> impl Iterator<Item = &Decision> {
        self.decisions.iter().filter(move |d| d.hemisphere == hemisphere)
    }

    pub fn receipts_for(&self, hemisphere: HemisphereKind) -> impl Iterator<Item = &Receipt> {
        self.receipts.iter().filter(move |r| r.hemisphere == hemisphere)
    }

    pub fn counts(&self, hemisphere: HemisphereKind) -> VerdictCounts {
        let mut counts = VerdictCounts::default();
        for d in self.decisions_for(hemisphere) {
            counts.record(d.verdict);
        }
        counts
    }
}

/// An exploratory and a conservative hemisphere sharing one hypothesis
/// source, one estimator suite and one ledger.
///
/// Every exploratory Accept is re-judged by the conservative hemisphere in
/// the same cycle with the same evidence. A conservative verdict is
/// terminal.
pub struct HemispherePair {
    name: String,
    exploratory: Hemisphere,
    conservative: Hemisphere,
    source: Box<dyn HypothesisSource>,
    estimators: EstimatorSuite,
    decidability: Option<DecidabilityGate>,
    causal: Option<Box<dyn CausalFilter>>,
    schedule: Option<ThresholdSchedule>,
    history: PolicyHistory,
    ledger: Box<dyn LedgerSink>,
    series_field: String,
    cycle: u64,
    stats: EngineStats,
}

impl std::fmt::Debug for HemispherePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HemispherePair")
            .field("name", &self.name)
            .field("exploratory", self.exploratory.thresholds())
            .field("conservative", self.conservative.thresholds())
            .field("source", &self.source.name())
            .field("cycle", &self.cycle)
            .finish_non_exhaustive()
    }
}

impl HemispherePair {
    pub fn new(
        name: impl Into<String>,
        source: Box<dyn HypothesisSource>,
        ledger: Box<dyn LedgerSink>,
    ) -> Self {
        Self {
            name: name.into(),
            exploratory: Hemisphere::exploratory(),
            conservative: Hemisphere::conservative(),
            source,
            estimators: EstimatorSuite::default(),
            decidability: None,
            causal: None,
            schedule: None,
            history: PolicyHistory::default(),
            ledger,
            series_field: "x".into(),
            cycle: 0,
            stats: EngineStats::default(),
        }
    }

    /// Set both hemispheres' thresholds; the conservative set must be at
    /// least as strict as the exploratory one.
    pub fn with_thresholds(
        mut self,
        exploratory: GateThresholds,
        conservative: GateThresholds,
    ) -> Result<Self, EngineError> {
        check_strictness(&exploratory, &conservative).map_err(EngineError::InvalidThresholds)?;
        *self.exploratory.thresholds_mut() = exploratory;
        *self.conservative.thresholds_mut() = conservative;
        Ok(self)
    }

    pub fn with_evaluator(mut self, evaluator: GateEvaluator) -> Self {
        self.exploratory = self.exploratory.with_evaluator(evaluator.clone());
        self.conservative = self.conservative.with_evaluator(evaluator);
        self
    }

    pub fn with_estimators(mut self, estimators: EstimatorSuite) -> Self {
        self.estimators = estimators;
        self
    }

    /// Refuse claims the decidability screen classes as undecidable.
    pub fn with_decidability_gate(mut self, gate: DecidabilityGate) -> Self {
        self.decidability = Some(gate);
        self
    }

    pub fn with_causal_filter(mut self, filter: Box<dyn CausalFilter>) -> Self {
        self.causal = Some(filter);
        self
    }

    /// The causal graph behind the filter, when the filter is one.
    pub fn causal_graph(&self) -> Option<&CausalGraph> {
        self.causal.as_deref().and_then(|f| f.graph())
    }

    /// The learned-gates policy behind the schedule, when there is one.
    pub fn learned_policy(&self) -> Option<&LearnedGatesPolicy> {
        self.schedule.as_ref().and_then(|s| s.policy().learned())
    }

    pub fn with_schedule(mut self, schedule: ThresholdSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = PolicyHistory::with_capacity(capacity);
        self
    }

    /// Observation field holding the numeric series.
    pub fn with_series_field(mut self, field: impl Into<String>) -> Self {
        self.series_field = field.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn history(&self) -> &PolicyHistory {
        &self.history
    }

    pub fn hemisphere(&self, kind: HemisphereKind) -> &Hemisphere {
        match kind {
            HemisphereKind::Exploratory => &self.exploratory,
            HemisphereKind::Conservative => &self.conservative,
        }
    }

    pub fn thresholds(&self, kind: HemisphereKind) -> &GateThresholds {
        self.hemisphere(kind).thresholds()
    }

    pub fn causal_filter(&self) -> Option<&dyn CausalFilter> {
        self.causal.as_deref()
    }

    pub fn schedule(&self) -> Option<&ThresholdSchedule> {
        self.schedule.as_ref()
    }

    /// Run one cycle over `observation`.
    ///
    /// Only ledger and record-construction failures are returned as
    /// errors; a failing source yields no hypotheses and a failing
    /// estimator rejects only its hypothesis.
    pub fn run_cycle(
        &mut self,
        observation: &Observation,
        controls: &CycleControls,
    ) -> Result<CycleOutput, EngineError> {
        self.cycle += 1;
        let cycle = self.cycle;
        debug!(pair = %self.name, cycle, observation = %observation.id, "Cycle start");

        let mut out = CycleOutput::new(cycle, observation.id.clone());
        if let Some(schedule) = self.schedule.as_mut() {
            out.threshold_updates = schedule.step(
                cycle,
                self.exploratory.thresholds_mut(),
                self.conservative.thresholds_mut(),
                &self.history,
            );
            self.stats.threshold_updates +=
                out.threshold_updates.iter().filter(|u| u.applied).count() as u64;
        }

        self.ledger
            .append(&LedgerRecord::Observation(observation.clone()))?;

        let series = observation.samples(&self.series_field);
        let window = controls.window(&series);

        let mut hypotheses = match self.source.generate(observation, controls.max_hypotheses) {
            Ok(hypotheses) => hypotheses,
            Err(e) => {
                warn!(
                    pair = %self.name,
                    cycle,
                    source = self.source.name(),
                    error = %e,
                    "Hypothesis source failed"
                );
                self.stats.source_failures += 1;
                Vec::new()
            }
        };
        hypotheses.truncate(controls.max_hypotheses);

        for hypothesis in hypotheses {
            self.evaluate(cycle, observation, &hypothesis, window, controls, &mut out)?;
            out.hypotheses.push(hypothesis);
        }

        self.ledger.flush()?;
        self.stats.cycles += 1;
        let exploratory = out.counts(HemisphereKind::Exploratory);
        let conservative = out.counts(HemisphereKind::Conservative);
        info!(
            pair = %self.name,
            cycle,
            hypotheses = out.hypotheses.len(),
            blocked = out.blocked.len(),
            accepted_r = exploratory.accept,
            accepted_l = conservative.accept,
            rejected = exploratory.reject + conservative.reject,
            "Cycle complete"
        );
        Ok(out)
    }

    fn evaluate(
        &mut self,
        cycle: u64,
        observation: &Observation,
        hypothesis: &Hypothesis,
        window: &[f64],
        controls: &CycleControls,
        out: &mut CycleOutput,
    ) -> Result<(), EngineError> {
        self.stats.hypotheses += 1;
        self.ledger
            .append(&LedgerRecord::Hypothesis(hypothesis.clone()))?;

        if let Some(reason) = self.refusal(observation, hypothesis, controls.grounding) {
            debug!(
                pair = %self.name,
                cycle,
                hypothesis = %hypothesis.id,
                %reason,
                "Hypothesis blocked"
            );
            self.stats.blocked += 1;
            out.blocked.push(BlockedHypothesis {
                hypothesis_id: hypothesis.id.clone(),
                claim: hypothesis.claim.clone(),
                reason,
            });
            return Ok(());
        }

        let measurement = match self.estimators.measure(window, hypothesis) {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    pair = %self.name,
                    cycle,
                    hypothesis = %hypothesis.id,
                    error = %e,
                    "Estimator failed, rejecting hypothesis"
                );
                self.stats.estimator_failures += 1;
                let decision = self.exploratory.reject(
                    cycle,
                    hypothesis,
                    None,
                    0.0,
                    format!("estimator failure: {e}"),
                    None,
                );
                return self.emit(decision, out);
            }
        };

        let stats = measurement.statistics;
        let evidence = Evidence {
            hypothesis_id: hypothesis.id.clone(),
            statistics: stats,
            successes: measurement.successes,
            failures: measurement.failures,
            window_len: measurement.window_len,
        };
        let evidence_hash = self
            .ledger
            .append(&LedgerRecord::Evidence(evidence.clone()))?;
        out.evidence.push(evidence);

        let decision = self.exploratory.judge_with_floor(
            cycle,
            hypothesis,
            &stats,
            evidence_hash,
            controls.min_attention,
        );
        if decision.below_floor() {
            debug!(pair = %self.name, cycle, hypothesis = %hypothesis.id, "Below semantic floor");
            return self.emit(decision, out);
        }
        let mut terminal = decision.verdict;
        let transfer = decision.is_accepted();
        self.emit(decision, out)?;

        if transfer {
            self.stats.callosum_transfers += 1;
            info!(pair = %self.name, cycle, hypothesis = %hypothesis.id, "Callosum transfer");
            let decision = self
                .conservative
                .judge(cycle, hypothesis, &stats, evidence_hash);
            terminal = decision.verdict;
            self.emit(decision, out)?;
        }

        if let Some(filter) = self.causal.as_mut() {
            match terminal {
                Verdict::Accept => filter.record_outcome(hypothesis, true),
                Verdict::Reject => filter.record_outcome(hypothesis, false),
                Verdict::Defer => {}
            }
        }
        Ok(())
    }

    /// Why a hypothesis may not be measured, if it may not.
    fn refusal(
        &self,
        observation: &Observation,
        hypothesis: &Hypothesis,
        grounding: Grounding,
    ) -> Option<String> {
        match grounding {
            Grounding::RequireDerivation | Grounding::RequireExternal
                if !hypothesis.is_derived() =>
            {
                return Some("reality anchor: hypothesis cites no observation".into());
            }
            Grounding::RequireExternal if !observation.is_external() => {
                return Some(format!(
                    "reality anchor: observation {} is not external",
                    observation.id
                ));
            }
            _ => {}
        }

        if let Some(reason) = self.decidability.as_ref().and_then(|g| g.refuse(hypothesis)) {
            return Some(reason);
        }

        let filter = self.causal.as_ref()?;
        let link = hypothesis.causal.as_ref()?;
        if filter.allow(&link.inputs, &link.target) {
            None
        } else {
            Some(format!(
                "causal filter: {} -> {} refused",
                link.inputs.join(","),
                link.target
            ))
        }
    }

    fn emit(&mut self, decision: Decision, out: &mut CycleOutput) -> Result<(), EngineError> {
        let receipt = Receipt::for_decision(&decision)?;
        self.ledger
            .append(&LedgerRecord::Decision(decision.clone()))?;
        self.ledger
            .append(&LedgerRecord::Receipt(receipt.clone()))?;

        debug!(
            pair = %self.name,
            cycle = decision.cycle,
            hemisphere = %decision.hemisphere,
            hypothesis = %decision.hypothesis_id,
            verdict = %decision.verdict,
            "Decision recorded"
        );
        self.stats.record(decision.hemisphere, decision.verdict);
        self.history.push(DecisionSummary {
            cycle: decision.cycle,
            hemisphere: decision.hemisphere,
            hypothesis_id: decision.hypothesis_id.clone(),
            verdict: decision.verdict,
            statistics: decision.statistics,
        });
        out.decisions.push(decision);
        out.receipts.push(receipt);
        Ok(())
    }
}
