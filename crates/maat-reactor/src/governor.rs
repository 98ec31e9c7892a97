use std::fmt;

use maat_engine::{CycleControls, Grounding};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{EngineConfig, GovernorConfig};
use crate::telemetry::Telemetry;

/// The four throttling controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamperKind {
    /// Fewer hypotheses requested per cycle.
    RecursionDamper,
    /// Less work per cycle: fewer hypotheses and a shorter window.
    ResourceGovernor,
    /// Only observation-grounded hypotheses are measured.
    RealityAnchor,
    /// Higher attention floor before gating.
    SemanticFilter,
}

impl DamperKind {
    pub const ALL: [DamperKind; 4] = [
        DamperKind::RecursionDamper,
        DamperKind::ResourceGovernor,
        DamperKind::RealityAnchor,
        DamperKind::SemanticFilter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DamperKind::RecursionDamper => "recursion_damper",
            DamperKind::ResourceGovernor => "resource_governor",
            DamperKind::RealityAnchor => "reality_anchor",
            DamperKind::SemanticFilter => "semantic_filter",
        }
    }
}

impl fmt::Display for DamperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A graded damper: 0 fully withdrawn, 1 fully inserted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlRod {
    depth: f64,
}

impl ControlRod {
    pub fn depth(&self) -> f64 {
        self.depth
    }

    pub fn insert(&mut self, amount: f64) {
        self.depth = (self.depth + amount).min(1.0);
    }

    pub fn withdraw(&mut self, amount: f64) {
        self.depth = (self.depth - amount).max(0.0);
    }

    pub fn is_inserted(&self) -> bool {
        self.depth > 0.0
    }

    fn insert_fully(&mut self) {
        self.depth = 1.0;
    }
}

/// Current positions of the four dampers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DamperSet {
    pub recursion_damper: ControlRod,
    pub resource_governor: ControlRod,
    pub reality_anchor: ControlRod,
    pub semantic_filter: ControlRod,
}

impl DamperSet {
    pub fn rod(&self, kind: DamperKind) -> &ControlRod {
        match kind {
            DamperKind::RecursionDamper => &self.recursion_damper,
            DamperKind::ResourceGovernor => &self.resource_governor,
            DamperKind::RealityAnchor => &self.reality_anchor,
            DamperKind::SemanticFilter => &self.semantic_filter,
        }
    }

    fn rod_mut(&mut self, kind: DamperKind) -> &mut ControlRod {
        match kind {
            DamperKind::RecursionDamper => &mut self.recursion_damper,
            DamperKind::ResourceGovernor => &mut self.resource_governor,
            DamperKind::RealityAnchor => &mut self.reality_anchor,
            DamperKind::SemanticFilter => &mut self.semantic_filter,
        }
    }

    pub fn depth(&self, kind: DamperKind) -> f64 {
        self.rod(kind).depth()
    }

    pub fn all_fully_inserted(&self) -> bool {
        DamperKind::ALL.iter().all(|k| self.depth(*k) >= 1.0)
    }

    /// Hypotheses to request instead of `k`; never below one.
    pub fn moderate_generation(&self, k: usize) -> usize {
        let damp = 0.4 * self.recursion_damper.depth
            + 0.4 * self.resource_governor.depth
            + 0.2 * self.semantic_filter.depth;
        ((k as f64 * (1.0 - damp)).floor() as usize).max(1)
    }

    /// Estimator window under the resource governor.
    pub fn moderate_window(&self, window: usize, min_window: usize) -> usize {
        let len = (window as f64 * (1.0 - 0.5 * self.resource_governor.depth)).floor() as usize;
        len.max(min_window)
    }

    /// Grounding rule imposed by the reality anchor.
    pub fn grounding(&self, block_depth: f64) -> Grounding {
        let depth = self.reality_anchor.depth;
        if depth >= block_depth {
            Grounding::RequireExternal
        } else if depth > 0.0 {
            Grounding::RequireDerivation
        } else {
            Grounding::Off
        }
    }

    /// Attention floor imposed by the semantic filter.
    pub fn min_attention(&self, max_floor: f64) -> f64 {
        self.semantic_filter.depth * max_floor
    }
}

/// One damper movement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamperAdjustment {
    pub damper: DamperKind,
    pub from: f64,
    pub to: f64,
}

/// Why the loop was halted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum ScramReason {
    Criticality { value: f64, ceiling: f64 },
    Temperature { value: f64, ceiling: f64 },
    RealityCorrelation { value: f64, floor: f64 },
}

impl fmt::Display for ScramReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScramReason::Criticality { value, ceiling } => {
                write!(f, "criticality {value:.3} > {ceiling:.3}")
            }
            ScramReason::Temperature { value, ceiling } => {
                write!(f, "temperature {value:.3} > {ceiling:.3}")
            }
            ScramReason::RealityCorrelation { value, floor } => {
                write!(f, "reality correlation {value:.3} < {floor:.3}")
            }
        }
    }
}

/// Emergency shutdown limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScramLimits {
    pub enabled: bool,
    pub criticality_ceiling: f64,
    pub temperature_ceiling: f64,
    pub reality_floor: f64,
}

impl Default for ScramLimits {
    fn default() -> Self {
        Self {
            enabled: true,
            criticality_ceiling: 1.8,
            temperature_ceiling: 0.95,
            reality_floor: 0.05,
        }
    }
}

impl ScramLimits {
    /// First breached limit, checked in criticality, temperature, reality
    /// order.
    pub fn check(&self, t: &Telemetry) -> Option<ScramReason> {
        if !self.enabled {
            return None;
        }
        if t.criticality > self.criticality_ceiling {
            return Some(ScramReason::Criticality {
                value: t.criticality,
                ceiling: self.criticality_ceiling,
            });
        }
        if t.temperature > self.temperature_ceiling {
            return Some(ScramReason::Temperature {
                value: t.temperature,
                ceiling: self.temperature_ceiling,
            });
        }
        if t.reality < self.reality_floor {
            return Some(ScramReason::RealityCorrelation {
                value: t.reality,
                floor: self.reality_floor,
            });
        }
        None
    }
}

/// Owns the dampers and the one-way SCRAM latch.
#[derive(Clone, Debug)]
pub struct Governor {
    config: GovernorConfig,
    limits: ScramLimits,
    dampers: DamperSet,
    latch: Option<ScramReason>,
}

impl Governor {
    pub fn new(config: GovernorConfig, limits: ScramLimits) -> Self {
        Self {
            config,
            limits,
            dampers: DamperSet::default(),
            latch: None,
        }
    }

    pub fn dampers(&self) -> &DamperSet {
        &self.dampers
    }

    pub fn is_latched(&self) -> bool {
        self.latch.is_some()
    }

    pub fn scram_reason(&self) -> Option<ScramReason> {
        self.latch
    }

    /// Move dampers from this cycle's telemetry. Several may move at once.
    pub fn adjust(&mut self, t: &Telemetry) -> Vec<DamperAdjustment> {
        if self.is_latched() {
            return Vec::new();
        }
        let before = self.dampers;
        let c = &self.config;
        let d = &mut self.dampers;

        if t.temperature > c.temperature_high {
            d.resource_governor.insert(c.insert_step);
        }
        if t.pressure > c.pressure_high {
            d.recursion_damper.insert(c.insert_step);
        }
        if t.criticality > c.criticality_high {
            d.recursion_damper.insert(c.insert_step);
            d.semantic_filter.insert(c.semantic_step);
        }
        if t.criticality < c.criticality_low {
            d.recursion_damper.withdraw(c.recursion_withdraw);
            d.resource_governor.withdraw(c.resource_withdraw);
        }
        if t.reality < c.reality_low {
            d.reality_anchor.insert(c.insert_step);
        } else if t.reality > c.reality_release {
            d.reality_anchor.withdraw(c.anchor_withdraw);
        }

        DamperKind::ALL
            .iter()
            .filter_map(|&kind| {
                let (from, to) = (before.depth(kind), self.dampers.depth(kind));
                (from != to).then(|| {
                    debug!(damper = %kind, from, to, "Damper moved");
                    DamperAdjustment { damper: kind, from, to }
                })
            })
            .collect()
    }

    /// Check the SCRAM limits. On a breach every damper goes to full
    /// insertion and the latch is set for good.
    pub fn check_scram(&mut self, t: &Telemetry) -> Option<ScramReason> {
        if let Some(reason) = self.latch {
            return Some(reason);
        }
        let reason = self.limits.check(t)?;
        for kind in DamperKind::ALL {
            self.dampers.rod_mut(kind).insert_fully();
        }
        self.latch = Some(reason);
        warn!(%reason, "SCRAM: all dampers inserted, loop halted");
        Some(reason)
    }

    /// Per-cycle controls implied by the current damper positions.
    pub fn controls(&self, engine: &EngineConfig) -> CycleControls {
        let d = &self.dampers;
        CycleControls::default()
            .with_max_hypotheses(d.moderate_generation(engine.hypotheses_per_cycle))
            .with_window_len(d.moderate_window(engine.window_len, engine.min_window))
            .with_min_attention(d.min_attention(self.config.max_attention_floor))
            .with_grounding(d.grounding(self.config.anchor_block_depth))
    }
}
