use std::path::Path;
use std::sync::Arc;

use maat_engine::{
    CausalGraph, CycleControls, CycleOutput, DecidabilityGate, HemispherePair, HypothesisSource,
    LearnedGatesPolicy, ProgrammaticSource, ThresholdSchedule, VerdictCounts,
};
use maat_gate::{GateEvaluator, WeightedAttention};
use maat_ledger::LedgerSink;
use maat_types::{HemisphereKind, Observation, ReceiptStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ReactorConfig;
use crate::error::ReactorError;
use crate::feed::SyntheticFeed;
use crate::governor::{DamperAdjustment, DamperSet, Governor, ScramReason};
use crate::health::{HealthMonitor, HealthReport};
use crate::meta::{meta_observation, META_WINDOW};
use crate::state::{save_causal, save_policy, LoopState, SavedState};
use crate::telemetry::{Telemetry, TelemetryTracker};

/// Outcome of a cycle request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// The cycle ran and no limit was breached.
    Running,
    /// The cycle ran and tripped SCRAM; the loop is now halted.
    Scrammed,
    /// The loop was already halted; nothing ran.
    Halted,
}

/// Everything one cycle request produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub status: CycleStatus,
    pub telemetry: Option<Telemetry>,
    /// Damper positions after adjustment and any SCRAM.
    pub dampers: DamperSet,
    pub adjustments: Vec<DamperAdjustment>,
    /// Controls both pairs ran under.
    pub controls: Option<CycleControls>,
    pub scram: Option<ScramReason>,
    pub inner: Option<CycleOutput>,
    pub outer: Option<CycleOutput>,
}

impl CycleReport {
    pub fn summary(&self) -> CycleSummary {
        let counts = |out: &Option<CycleOutput>, kind| {
            out.as_ref().map(|o| o.counts(kind)).unwrap_or_default()
        };
        CycleSummary {
            cycle: self.cycle,
            status: self.status,
            telemetry: self.telemetry,
            dampers: self.dampers,
            inner_exploratory: counts(&self.inner, HemisphereKind::Exploratory),
            inner_conservative: counts(&self.inner, HemisphereKind::Conservative),
            outer_exploratory: counts(&self.outer, HemisphereKind::Exploratory),
            outer_conservative: counts(&self.outer, HemisphereKind::Conservative),
            blocked: self
                .inner
                .iter()
                .chain(self.outer.iter())
                .map(|o| o.blocked.len())
                .sum(),
        }
    }
}

/// Compact per-cycle row of a [`RunReport`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub cycle: u64,
    pub status: CycleStatus,
    pub telemetry: Option<Telemetry>,
    pub dampers: DamperSet,
    pub inner_exploratory: VerdictCounts,
    pub inner_conservative: VerdictCounts,
    pub outer_exploratory: VerdictCounts,
    pub outer_conservative: VerdictCounts,
    pub blocked: usize,
}

/// Run-scoped counters owned by the loop.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    pub cycles: u64,
    pub inner_exploratory: VerdictCounts,
    pub inner_conservative: VerdictCounts,
    pub outer_exploratory: VerdictCounts,
    pub outer_conservative: VerdictCounts,
    pub blocked: u64,
    pub threshold_updates: u64,
    pub scram_cycle: Option<u64>,
}

impl RunTotals {
    fn absorb(&mut self, inner: &CycleOutput, outer: &CycleOutput) {
        self.cycles += 1;
        self.inner_exploratory.merge(&inner.counts(HemisphereKind::Exploratory));
        self.inner_conservative.merge(&inner.counts(HemisphereKind::Conservative));
        self.outer_exploratory.merge(&outer.counts(HemisphereKind::Exploratory));
        self.outer_conservative.merge(&outer.counts(HemisphereKind::Conservative));
        self.blocked += (inner.blocked.len() + outer.blocked.len()) as u64;
        self.threshold_updates += inner
            .threshold_updates
            .iter()
            .chain(&outer.threshold_updates)
            .filter(|u| u.applied)
            .count() as u64;
    }
}

/// Result of [`RecursiveLoop::run`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub cycles: Vec<CycleSummary>,
    pub totals: RunTotals,
    pub scram: Option<ScramReason>,
    pub dampers: DamperSet,
    pub health: HealthReport,
}

impl RunReport {
    pub fn scrammed(&self) -> bool {
        self.scram.is_some()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Inner and outer hemisphere pairs under one governor.
///
/// Cycles run strictly one after another. The outer pair only ever sees
/// observations derived from the inner pair's receipts; nothing flows
/// back into the inner pair except the damper settings.
pub struct RecursiveLoop {
    config: ReactorConfig,
    inner: HemispherePair,
    outer: HemispherePair,
    feed: SyntheticFeed,
    governor: Governor,
    telemetry: TelemetryTracker,
    inner_statuses: Vec<ReceiptStatus>,
    health: HealthMonitor,
    totals: RunTotals,
    cycle: u64,
}

impl std::fmt::Debug for RecursiveLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecursiveLoop")
            .field("cycle", &self.cycle)
            .field("halted", &self.is_halted())
            .field("inner", &self.inner)
            .field("outer", &self.outer)
            .field("dampers", self.governor.dampers())
            .finish_non_exhaustive()
    }
}

impl RecursiveLoop {
    /// Build a loop whose pairs use the programmatic source and the
    /// reference estimators.
    pub fn new(
        config: ReactorConfig,
        inner_ledger: Box<dyn LedgerSink>,
        outer_ledger: Box<dyn LedgerSink>,
    ) -> Result<Self, ReactorError> {
        Self::with_state(config, inner_ledger, outer_ledger, LoopState::default())
    }

    /// Like [`RecursiveLoop::new`], with the inner pair resuming from
    /// saved learned state.
    pub fn with_state(
        config: ReactorConfig,
        inner_ledger: Box<dyn LedgerSink>,
        outer_ledger: Box<dyn LedgerSink>,
        state: LoopState,
    ) -> Result<Self, ReactorError> {
        config.validate()?;
        let mut inner = Self::build_pair("inner", &config, inner_ledger)?;
        if let Some(graph) = state.causal {
            inner = inner.with_causal_filter(Box::new(graph));
        }
        if let Some(policy) = state.policy {
            inner = inner.with_schedule(
                ThresholdSchedule::new(Box::new(policy)).with_cooldown(config.policy.cooldown),
            );
        }
        let outer = Self::build_pair("outer", &config, outer_ledger)?;
        Self::from_pairs(config, inner, outer)
    }

    /// A hemisphere pair configured from `config`, fed by the programmatic
    /// source.
    pub fn build_pair(
        name: &str,
        config: &ReactorConfig,
        ledger: Box<dyn LedgerSink>,
    ) -> Result<HemispherePair, ReactorError> {
        let source = Box::new(ProgrammaticSource::default());
        Self::build_pair_with_source(name, config, source, ledger)
    }

    pub fn build_pair_with_source(
        name: &str,
        config: &ReactorConfig,
        source: Box<dyn HypothesisSource>,
        ledger: Box<dyn LedgerSink>,
    ) -> Result<HemispherePair, ReactorError> {
        let evaluator = GateEvaluator::new(Arc::new(WeightedAttention::new(
            config.engine.attention.clone(),
        )));
        let mut pair = HemispherePair::new(name, source, ledger)
            .with_evaluator(evaluator)
            .with_thresholds(config.engine.exploratory, config.engine.conservative)?;
        if config.engine.decidability {
            pair = pair.with_decidability_gate(DecidabilityGate::new()?);
        }
        if config.causal.enabled {
            let graph = CausalGraph::new()
                .with_learning_rates(config.causal.reinforce, config.causal.weaken);
            pair = pair.with_causal_filter(Box::new(graph));
        }
        if config.policy.enabled {
            let policy = LearnedGatesPolicy::new(config.policy.learned.clone());
            pair = pair.with_schedule(
                ThresholdSchedule::new(Box::new(policy)).with_cooldown(config.policy.cooldown),
            );
        }
        Ok(pair)
    }

    /// Save the inner pair's causal graph and policy, with a report for
    /// each, into `dir`. Parts the inner pair does not have are skipped.
    pub fn save_state(&self, dir: impl AsRef<Path>) -> Result<SavedState, ReactorError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let mut saved = SavedState::default();
        if let Some(graph) = self.inner.causal_graph() {
            saved.causal = Some(save_causal(
                graph,
                dir,
                self.config.causal.prune_below,
                self.config.causal.report_edges,
                &mut saved.files,
            )?);
        }
        if let Some(policy) = self.inner.learned_policy() {
            saved.policy = Some(save_policy(policy, dir, &mut saved.files)?);
        }
        Ok(saved)
    }

    /// Assemble a loop from pairs built elsewhere.
    pub fn from_pairs(
        config: ReactorConfig,
        inner: HemispherePair,
        outer: HemispherePair,
    ) -> Result<Self, ReactorError> {
        config.validate()?;
        Ok(Self {
            feed: SyntheticFeed::new(config.feed.clone()),
            governor: Governor::new(config.governor.clone(), config.scram.clone()),
            telemetry: TelemetryTracker::new(config.telemetry.clone()),
            config,
            inner,
            outer,
            inner_statuses: Vec::new(),
            health: HealthMonitor::new(),
            totals: RunTotals::default(),
            cycle: 0,
        })
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn is_halted(&self) -> bool {
        self.governor.is_latched()
    }

    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    pub fn inner(&self) -> &HemispherePair {
        &self.inner
    }

    pub fn outer(&self) -> &HemispherePair {
        &self.outer
    }

    pub fn feed(&self) -> &SyntheticFeed {
        &self.feed
    }

    pub fn totals(&self) -> &RunTotals {
        &self.totals
    }

    pub fn health(&self) -> HealthReport {
        self.health.report()
    }

    /// Run one cycle on the next batch from the synthetic feed.
    pub fn run_cycle(&mut self) -> Result<CycleReport, ReactorError> {
        if self.is_halted() {
            return Ok(self.halted());
        }
        let external = self.feed.next_observation()?;
        self.step(&external)
    }

    /// Run one cycle on a caller-supplied external observation.
    pub fn run_cycle_with(&mut self, external: &Observation) -> Result<CycleReport, ReactorError> {
        if self.is_halted() {
            return Ok(self.halted());
        }
        self.step(external)
    }

    /// Run up to `cycles` cycles, stopping at SCRAM.
    pub fn run(&mut self, cycles: u64) -> Result<RunReport, ReactorError> {
        let mut summaries = Vec::new();
        for _ in 0..cycles {
            if self.is_halted() {
                break;
            }
            let report = self.run_cycle()?;
            summaries.push(report.summary());
        }
        Ok(self.report(summaries))
    }

    /// Snapshot the run so far around the given per-cycle rows.
    pub fn report(&self, cycles: Vec<CycleSummary>) -> RunReport {
        RunReport {
            cycles,
            totals: self.totals.clone(),
            scram: self.governor.scram_reason(),
            dampers: *self.governor.dampers(),
            health: self.health.report(),
        }
    }

    fn halted(&self) -> CycleReport {
        warn!(cycle = self.cycle, "Cycle requested after SCRAM; loop is halted");
        CycleReport {
            cycle: self.cycle,
            status: CycleStatus::Halted,
            telemetry: None,
            dampers: *self.governor.dampers(),
            adjustments: Vec::new(),
            controls: None,
            scram: self.governor.scram_reason(),
            inner: None,
            outer: None,
        }
    }

    fn step(&mut self, external: &Observation) -> Result<CycleReport, ReactorError> {
        self.cycle += 1;
        let cycle = self.cycle;
        let controls = self.governor.controls(&self.config.engine);
        debug!(
            cycle,
            max_hypotheses = controls.max_hypotheses,
            window = ?controls.window_len,
            min_attention = controls.min_attention,
            grounding = ?controls.grounding,
            "Reactor cycle start"
        );

        let inner = self.inner.run_cycle(external, &controls)?;
        self.inner_statuses.extend(
            inner
                .receipts_for(HemisphereKind::Exploratory)
                .map(|r| r.status),
        );
        if self.inner_statuses.len() > META_WINDOW {
            let excess = self.inner_statuses.len() - META_WINDOW;
            self.inner_statuses.drain(..excess);
        }

        let meta = meta_observation(
            &self.inner_statuses,
            &inner.counts(HemisphereKind::Exploratory),
            cycle,
            external.timestamp,
        )?;
        let outer = self.outer.run_cycle(&meta, &controls)?;

        let telemetry = self.telemetry.observe(
            cycle,
            &inner,
            &outer,
            &external.samples("x"),
            &meta.samples("x"),
        );
        let adjustments = self.governor.adjust(&telemetry);
        let scram = self.governor.check_scram(&telemetry);
        let status = if scram.is_some() {
            CycleStatus::Scrammed
        } else {
            CycleStatus::Running
        };

        self.health.observe(
            inner
                .hypotheses
                .iter()
                .chain(&outer.hypotheses)
                .map(|h| h.claim.as_str()),
        );
        self.health
            .observe_receipts(inner.receipts.iter().chain(&outer.receipts))?;
        self.totals.absorb(&inner, &outer);
        if scram.is_some() {
            self.totals.scram_cycle = Some(cycle);
        }

        info!(
            cycle,
            status = ?status,
            criticality = telemetry.criticality,
            temperature = telemetry.temperature,
            pressure = telemetry.pressure,
            reality = telemetry.reality,
            "Reactor cycle complete"
        );

        Ok(CycleReport {
            cycle,
            status,
            telemetry: Some(telemetry),
            dampers: *self.governor.dampers(),
            adjustments,
            controls: Some(controls),
            scram,
            inner: Some(inner),
            outer: Some(outer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::ScramLimits;
    use maat_ledger::{read_jsonl, JsonlLedger, NullLedger};

    fn reactor(config: ReactorConfig) -> RecursiveLoop {
        RecursiveLoop::new(config, Box::new(NullLedger), Box::new(NullLedger)).unwrap()
    }

    #[test]
    fn stress_run_scrams_and_latches() {
        let mut r = reactor(ReactorConfig::stress());
        let report = r.run(50).unwrap();

        assert!(report.scrammed());
        let last = report.cycles.last().unwrap();
        assert_eq!(last.status, CycleStatus::Scrammed);
        assert!(last.cycle <= 10);
        assert!(report.dampers.all_fully_inserted());
        assert_eq!(report.totals.scram_cycle, Some(last.cycle));
        assert!(report.cycles[..report.cycles.len() - 1]
            .iter()
            .all(|c| c.status == CycleStatus::Running));

        let cycle = r.cycle();
        let clock = r.feed().clock();
        let halted = r.run_cycle().unwrap();
        assert_eq!(halted.status, CycleStatus::Halted);
        assert!(halted.inner.is_none() && halted.outer.is_none());
        assert_eq!(r.cycle(), cycle);
        assert_eq!(r.feed().clock(), clock);
        assert!(r.run(5).unwrap().cycles.is_empty());
    }

    #[test]
    fn identical_runs_are_identical() {
        let run = || {
            let mut r = reactor(ReactorConfig::default().with_seed(11));
            (0..4)
                .map(|_| {
                    let report = r.run_cycle().unwrap();
                    serde_json::to_string(&(report.inner, report.outer)).unwrap()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn temperature_inserts_resource_governor_without_scram() {
        let mut config = ReactorConfig::default();
        config.telemetry.horizon = 5;
        config.scram = ScramLimits {
            enabled: false,
            ..Default::default()
        };
        let mut r = reactor(config);
        let report = r.run(8).unwrap();
        assert_eq!(report.cycles.len(), 8);
        assert!(!report.scrammed());
        assert!(report.cycles.iter().all(|c| c.status == CycleStatus::Running));
        assert!(report.dampers.resource_governor.depth() > 0.0);
        assert_eq!(report.cycles[7].telemetry.unwrap().temperature, 1.0);
    }

    #[test]
    fn cycle_report_carries_both_pairs() {
        let mut r = reactor(ReactorConfig::default());
        let report = r.run_cycle().unwrap();
        assert_eq!(report.cycle, 1);
        let inner = report.inner.as_ref().unwrap();
        let outer = report.outer.as_ref().unwrap();
        assert_ne!(inner.observation_id, outer.observation_id);
        assert_eq!(inner.cycle, 1);
        assert_eq!(outer.cycle, 1);
        assert_eq!(report.controls.as_ref().unwrap().max_hypotheses, 3);
        assert_eq!(r.totals().cycles, 1);
    }

    #[test]
    fn ledgers_are_written_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let inner_path = dir.path().join("inner.jsonl");
        let outer_path = dir.path().join("outer.jsonl");
        {
            let mut r = RecursiveLoop::new(
                ReactorConfig::default(),
                Box::new(JsonlLedger::open(&inner_path).unwrap()),
                Box::new(JsonlLedger::open(&outer_path).unwrap()),
            )
            .unwrap();
            r.run(2).unwrap();
        }
        let inner = read_jsonl(&inner_path).unwrap();
        let outer = read_jsonl(&outer_path).unwrap();
        assert!(matches!(inner[0], maat_types::LedgerRecord::Observation(_)));
        assert!(matches!(outer[0], maat_types::LedgerRecord::Observation(_)));
        let observations = inner
            .iter()
            .filter(|r| matches!(r, maat_types::LedgerRecord::Observation(_)))
            .count();
        assert_eq!(observations, 2);
    }

    #[test]
    fn learned_state_survives_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ReactorConfig::default();
        config.causal.enabled = true;
        config.policy.enabled = true;
        config.policy.cooldown = 1;

        let mut first = reactor(config.clone());
        first.run(6).unwrap();
        assert!(first.outer().causal_graph().is_some());
        let saved = first.save_state(dir.path()).unwrap();
        assert_eq!(saved.files.len(), 4);
        assert!(saved.files.iter().all(|f| f.exists()));

        let state = LoopState::load(dir.path(), &config).unwrap();
        let second = RecursiveLoop::with_state(
            config,
            Box::new(NullLedger),
            Box::new(NullLedger),
            state,
        )
        .unwrap();
        assert_eq!(
            second.inner().causal_graph().unwrap().stats(),
            saved.causal.unwrap().stats
        );
        assert_eq!(
            second.inner().learned_policy().unwrap().proposals(),
            saved.policy.unwrap().proposals
        );
    }

    #[test]
    fn plain_loop_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let saved = reactor(ReactorConfig::default()).save_state(dir.path()).unwrap();
        assert!(saved.files.is_empty());
        assert!(saved.causal.is_none() && saved.policy.is_none());
    }

    #[test]
    fn invalid_config_is_refused() {
        let mut config = ReactorConfig::default();
        config.engine.conservative.bayes = 0.5;
        let err =
            RecursiveLoop::new(config, Box::new(NullLedger), Box::new(NullLedger)).unwrap_err();
        assert!(matches!(err, ReactorError::Thresholds(_)));
    }
}
