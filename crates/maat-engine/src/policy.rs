use std::collections::VecDeque;
use std::path::Path;

use maat_types::{
    check_strictness, GateThresholds, HemisphereKind, HypothesisId, TestStatistics, Verdict,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::PolicyError;

/// One decision as the policy sees it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionSummary {
    pub cycle: u64,
    pub hemisphere: HemisphereKind,
    pub hypothesis_id: HypothesisId,
    pub verdict: Verdict,
    pub statistics: Option<TestStatistics>,
}

/// Bounded window of recent decisions.
#[derive(Clone, Debug)]
pub struct PolicyHistory {
    entries: VecDeque<DecisionSummary>,
    capacity: usize,
}

impl Default for PolicyHistory {
    fn default() -> Self {
        Self::with_capacity(100)
    }
}

impl PolicyHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, summary: DecisionSummary) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(summary);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecisionSummary> {
        self.entries.iter()
    }

    pub fn for_hemisphere(
        &self,
        hemisphere: HemisphereKind,
    ) -> impl Iterator<Item = &DecisionSummary> {
        self.entries.iter().filter(move |d| d.hemisphere == hemisphere)
    }

    /// Fraction of a hemisphere's decisions that were accepted; `None`
    /// before it has decided anything.
    pub fn acceptance_rate(&self, hemisphere: HemisphereKind) -> Option<f64> {
        let (total, accepted) = self.for_hemisphere(hemisphere).fold((0usize, 0usize), |(t, a), d| {
            (t + 1, a + usize::from(d.verdict == Verdict::Accept))
        });
        (total > 0).then(|| accepted as f64 / total as f64)
    }

    /// Share of accepts whose description length got worse (MDL > 0).
    pub fn false_accept_regret(&self, hemisphere: HemisphereKind) -> f64 {
        self.regret(hemisphere, Verdict::Accept, |s| s.mdl_delta_bits > 0.0)
    }

    /// Share of rejects that still showed strong coherence (> 10).
    pub fn false_reject_regret(&self, hemisphere: HemisphereKind) -> f64 {
        self.regret(hemisphere, Verdict::Reject, |s| s.coherence_ratio > 10.0)
    }

    fn regret(
        &self,
        hemisphere: HemisphereKind,
        verdict: Verdict,
        regretted: impl Fn(&TestStatistics) -> bool,
    ) -> f64 {
        let mut total = 0usize;
        let mut bad = 0usize;
        for d in self.for_hemisphere(hemisphere).filter(|d| d.verdict == verdict) {
            total += 1;
            if d.statistics.as_ref().is_some_and(&regretted) {
                bad += 1;
            }
        }
        if total == 0 {
            0.0
        } else {
            bad as f64 / total as f64
        }
    }
}

/// Proposes new gate thresholds from recent history.
pub trait ThresholdPolicy: Send {
    fn name(&self) -> &str;

    /// A replacement for `current`, or `None` to leave it alone.
    fn propose_thresholds(
        &mut self,
        hemisphere: HemisphereKind,
        current: &GateThresholds,
        history: &PolicyHistory,
    ) -> Option<GateThresholds>;

    /// The learned-gates state, for policies that are one.
    fn learned(&self) -> Option<&LearnedGatesPolicy> {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnedGatesConfig {
    pub target_accept_min: f64,
    pub target_accept_max: f64,
    pub learning_rate: f64,
    /// Regret above this triggers a half-step correction.
    pub regret_limit: f64,
    /// Hemispheres the policy adjusts.
    pub hemispheres: Vec<HemisphereKind>,
}

impl Default for LearnedGatesConfig {
    fn default() -> Self {
        Self {
            target_accept_min: 0.20,
            target_accept_max: 0.35,
            learning_rate: 0.05,
            regret_limit: 0.3,
            hemispheres: vec![HemisphereKind::Exploratory],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct LearnedGatesState {
    config: LearnedGatesConfig,
    proposals: u64,
    exploratory: Option<GateThresholds>,
    conservative: Option<GateThresholds>,
}

/// Online threshold tuning toward a target acceptance band.
///
/// Loosens when acceptance is below the band and tightens above it; high
/// false-accept or false-reject regret adds a half step in the
/// corresponding direction. Every component stays inside fixed bounds.
#[derive(Clone, Debug, Default)]
pub struct LearnedGatesPolicy {
    state: LearnedGatesState,
}

impl LearnedGatesPolicy {
    const BAYES_BOUNDS: (f64, f64) = (0.5, 0.98);
    const COHERENCE_BOUNDS: (f64, f64) = (3.0, 15.0);
    const MDL_BOUNDS: (f64, f64) = (-20.0, -2.0);

    pub fn new(config: LearnedGatesConfig) -> Self {
        Self {
            state: LearnedGatesState {
                config,
                ..Default::default()
            },
        }
    }

    pub fn config(&self) -> &LearnedGatesConfig {
        &self.state.config
    }

    /// Proposals made over the policy's lifetime, including loaded state.
    pub fn proposals(&self) -> u64 {
        self.state.proposals
    }

    /// Last thresholds proposed for a hemisphere.
    pub fn thresholds_for(&self, hemisphere: HemisphereKind) -> Option<GateThresholds> {
        match hemisphere {
            HemisphereKind::Exploratory => self.state.exploratory,
            HemisphereKind::Conservative => self.state.conservative,
        }
    }

    fn loosen(t: &GateThresholds, delta: f64) -> GateThresholds {
        GateThresholds::new(
            (t.bayes - delta).max(Self::BAYES_BOUNDS.0),
            (t.coherence - delta * 5.0).max(Self::COHERENCE_BOUNDS.0),
            (t.mdl + delta * 10.0).min(Self::MDL_BOUNDS.1),
        )
    }

    fn tighten(t: &GateThresholds, delta: f64) -> GateThresholds {
        GateThresholds::new(
            (t.bayes + delta).min(Self::BAYES_BOUNDS.1),
            (t.coherence + delta * 5.0).min(Self::COHERENCE_BOUNDS.1),
            (t.mdl - delta * 10.0).max(Self::MDL_BOUNDS.0),
        )
    }

    pub fn to_json(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string_pretty(&self.state)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        Ok(Self {
            state: serde_json::from_str(json)?,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PolicyError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load saved state, or start fresh with `config` when no file exists.
    pub fn load_or_new(
        path: impl AsRef<Path>,
        config: LearnedGatesConfig,
    ) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new(config));
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

impl ThresholdPolicy for LearnedGatesPolicy {
    fn name(&self) -> &str {
        "learned_gates"
    }

    fn learned(&self) -> Option<&LearnedGatesPolicy> {
        Some(self)
    }

    fn propose_thresholds(
        &mut self,
        hemisphere: HemisphereKind,
        current: &GateThresholds,
        history: &PolicyHistory,
    ) -> Option<GateThresholds> {
        let config = &self.state.config;
        if !config.hemispheres.contains(&hemisphere) {
            return None;
        }
        let rate = history.acceptance_rate(hemisphere)?;
        let lr = config.learning_rate;

        let mut next = *current;
        if rate < config.target_accept_min {
            next = Self::loosen(&next, lr);
        } else if rate > config.target_accept_max {
            next = Self::tighten(&next, lr);
        }
        if history.false_accept_regret(hemisphere) > config.regret_limit {
            next = Self::tighten(&next, lr * 0.5);
        }
        if history.false_reject_regret(hemisphere) > config.regret_limit {
            next = Self::loosen(&next, lr * 0.5);
        }

        if next == *current {
            return None;
        }
        debug!(%hemisphere, rate, ?next, "Learned gates proposal");
        self.state.proposals += 1;
        match hemisphere {
            HemisphereKind::Exploratory => self.state.exploratory = Some(next),
            HemisphereKind::Conservative => self.state.conservative = Some(next),
        }
        Some(next)
    }
}

/// Outcome of one policy proposal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    pub cycle: u64,
    pub hemisphere: HemisphereKind,
    pub previous: GateThresholds,
    pub proposed: GateThresholds,
    pub applied: bool,
    pub reason: Option<String>,
}

/// Invokes a policy at most once per cooldown and guards its proposals.
pub struct ThresholdSchedule {
    policy: Box<dyn ThresholdPolicy>,
    cooldown: u64,
    last_invocation: Option<u64>,
}

impl std::fmt::Debug for ThresholdSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThresholdSchedule")
            .field("policy", &self.policy.name())
            .field("cooldown", &self.cooldown)
            .field("last_invocation", &self.last_invocation)
            .finish()
    }
}

impl ThresholdSchedule {
    pub const DEFAULT_COOLDOWN: u64 = 10;

    pub fn new(policy: Box<dyn ThresholdPolicy>) -> Self {
        Self {
            policy,
            cooldown: Self::DEFAULT_COOLDOWN,
            last_invocation: None,
        }
    }

    pub fn with_cooldown(mut self, cooldown: u64) -> Self {
        self.cooldown = cooldown.max(1);
        self
    }

    pub fn policy(&self) -> &dyn ThresholdPolicy {
        self.policy.as_ref()
    }

    pub fn cooldown(&self) -> u64 {
        self.cooldown
    }

    pub fn last_invocation(&self) -> Option<u64> {
        self.last_invocation
    }

    pub fn is_due(&self, cycle: u64) -> bool {
        cycle.saturating_sub(self.last_invocation.unwrap_or(0)) >= self.cooldown
    }

    /// Check a proposal for `hemisphere` against the other hemisphere's
    /// current thresholds.
    pub fn guard(
        hemisphere: HemisphereKind,
        proposed: &GateThresholds,
        other: &GateThresholds,
    ) -> Result<(), PolicyError> {
        let (exploratory, conservative) = match hemisphere {
            HemisphereKind::Exploratory => (proposed, other),
            HemisphereKind::Conservative => (other, proposed),
        };
        check_strictness(exploratory, conservative).map_err(PolicyError::StrictnessViolation)
    }

    /// Run the policy if it is due, applying proposals that keep the
    /// conservative hemisphere at least as strict as the exploratory one.
    pub fn step(
        &mut self,
        cycle: u64,
        exploratory: &mut GateThresholds,
        conservative: &mut GateThresholds,
        history: &PolicyHistory,
    ) -> Vec<ThresholdUpdate> {
        if !self.is_due(cycle) {
            return Vec::new();
        }
        self.last_invocation = Some(cycle);

        let mut updates = Vec::new();
        for hemisphere in [HemisphereKind::Exploratory, HemisphereKind::Conservative] {
            let (target, other) = match hemisphere {
                HemisphereKind::Exploratory => (&mut *exploratory, &*conservative),
                HemisphereKind::Conservative => (&mut *conservative, &*exploratory),
            };
            let Some(proposed) = self.policy.propose_thresholds(hemisphere, target, history) else {
                continue;
            };
            let previous = *target;
            let checked = proposed
                .validate()
                .map_err(PolicyError::StrictnessViolation)
                .and_then(|_| Self::guard(hemisphere, &proposed, other));
            let update = match checked {
                Ok(()) => {
                    *target = proposed;
                    info!(
                        cycle,
                        %hemisphere,
                        policy = self.policy.name(),
                        ?proposed,
                        "Thresholds updated"
                    );
                    ThresholdUpdate {
                        cycle,
                        hemisphere,
                        previous,
                        proposed,
                        applied: true,
                        reason: None,
                    }
                }
                Err(e) => {
                    warn!(
                        cycle,
                        %hemisphere,
                        policy = self.policy.name(),
                        error = %e,
                        "Threshold proposal rejected"
                    );
                    ThresholdUpdate {
                        cycle,
                        hemisphere,
                        previous,
                        proposed,
                        applied: false,
                        reason: Some(e.to_string()),
                    }
                }
            };
            updates.push(update);
        }
        updates
    }
}
