use maat_engine::LearnedGatesConfig;
use maat_gate::AttentionWeights;
use maat_types::{check_strictness, GateThresholds};
use serde::{Deserialize, Serialize};

use crate::error::ReactorError;
use crate::governor::ScramLimits;
use crate::telemetry::RealityMetric;

/// Settings shared by the inner and outer hemisphere pairs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub exploratory: GateThresholds,
    pub conservative: GateThresholds,
    /// Hypotheses requested per cycle before damping.
    pub hypotheses_per_cycle: usize,
    /// Estimator window before the resource governor shrinks it.
    pub window_len: usize,
    /// The resource governor never shrinks the window below this.
    pub min_window: usize,
    pub attention: AttentionWeights,
    /// Refuse claims the decidability screen classes as undecidable.
    pub decidability: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exploratory: GateThresholds::exploratory(),
            conservative: GateThresholds::conservative(),
            hypotheses_per_cycle: 3,
            window_len: 64,
            min_window: 16,
            attention: AttentionWeights::default(),
            decidability: true,
        }
    }
}

/// Damper trigger levels and step sizes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    pub temperature_high: f64,
    pub pressure_high: f64,
    pub criticality_high: f64,
    pub criticality_low: f64,
    pub reality_low: f64,
    /// Reality above this withdraws the anchor.
    pub reality_release: f64,
    pub insert_step: f64,
    pub semantic_step: f64,
    pub recursion_withdraw: f64,
    pub resource_withdraw: f64,
    pub anchor_withdraw: f64,
    /// Anchor depth from which meta observations are no longer grounds.
    pub anchor_block_depth: f64,
    /// Attention floor at full semantic-filter insertion.
    pub max_attention_floor: f64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            temperature_high: 0.8,
            pressure_high: 0.7,
            criticality_high: 1.2,
            criticality_low: 0.8,
            reality_low: 0.3,
            reality_release: 0.6,
            insert_step: 0.2,
            semantic_step: 0.1,
            recursion_withdraw: 0.1,
            resource_withdraw: 0.05,
            anchor_withdraw: 0.1,
            anchor_block_depth: 0.5,
            max_attention_floor: 0.6,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Cycles at which temperature reaches 1.
    pub horizon: u64,
    /// Cycles over which criticality and pressure are measured.
    pub activity_window: usize,
    /// Decisions per cycle that count as full pressure.
    pub pressure_capacity: f64,
    pub reality_metric: RealityMetric,
    /// Samples of each series kept for the reality metric.
    pub reality_window: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            horizon: 200,
            activity_window: 3,
            pressure_capacity: 12.0,
            reality_metric: RealityMetric::MeanAgreement,
            reality_window: 64,
        }
    }
}

/// Synthetic external signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub seed: u64,
    pub samples: usize,
    /// Half-width of the uniform noise.
    pub noise: f64,
    /// Per-sample drift within an observation.
    pub drift: f64,
    pub source: String,
    /// Logical clock origin, seconds since the Unix epoch.
    pub epoch_secs: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            samples: 64,
            noise: 0.15,
            drift: 0.002,
            source: "external:world".into(),
            epoch_secs: 1_704_067_200,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub enabled: bool,
    pub cooldown: u64,
    pub learned: LearnedGatesConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cooldown: 10,
            learned: LearnedGatesConfig::default(),
        }
    }
}

/// Causal graph scaffolding on the inner pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CausalConfig {
    pub enabled: bool,
    /// Weight added to each edge of an accepted hypothesis.
    pub reinforce: f64,
    /// Weight taken from each edge of a rejected hypothesis.
    pub weaken: f64,
    /// Edges lighter than this are dropped when the graph is saved.
    pub prune_below: f64,
    /// Edges listed in the saved report.
    pub report_edges: usize,
}

impl Default for CausalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            reinforce: 0.1,
            weaken: 0.05,
            prune_below: 0.05,
            report_edges: 10,
        }
    }
}

/// Complete configuration of a recursive loop.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    pub engine: EngineConfig,
    pub governor: GovernorConfig,
    pub scram: ScramLimits,
    pub telemetry: TelemetryConfig,
    pub feed: FeedConfig,
    pub policy: PolicyConfig,
    pub causal: CausalConfig,
}

impl ReactorConfig {
    /// Short run with threshold learning switched on.
    pub fn demo() -> Self {
        Self {
            telemetry: TelemetryConfig {
                horizon: 60,
                ..Default::default()
            },
            policy: PolicyConfig {
                enabled: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Aggressive settings that drive the loop into SCRAM within a few
    /// cycles.
    pub fn stress() -> Self {
        Self {
            engine: EngineConfig {
                hypotheses_per_cycle: 6,
                ..Default::default()
            },
            telemetry: TelemetryConfig {
                horizon: 10,
                activity_window: 2,
                pressure_capacity: 6.0,
                ..Default::default()
            },
            feed: FeedConfig {
                noise: 0.4,
                drift: 0.01,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.feed.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ReactorError> {
        check_strictness(&self.engine.exploratory, &self.engine.conservative)
            .map_err(ReactorError::Thresholds)?;

        let invalid = |msg: &str| Err(ReactorError::InvalidConfig(msg.to_string()));
        if self.engine.hypotheses_per_cycle == 0 {
            return invalid("engine.hypotheses_per_cycle must be positive");
        }
        if self.engine.min_window == 0 || self.engine.window_len < self.engine.min_window {
            return invalid(
                "engine.window_len must be at least engine.min_window, which must be positive",
            );
        }
        if self.telemetry.horizon == 0 {
            return invalid("telemetry.horizon must be positive");
        }
        if self.telemetry.activity_window == 0 {
            return invalid("telemetry.activity_window must be positive");
        }
        if self.telemetry.pressure_capacity <= 0.0 {
            return invalid("telemetry.pressure_capacity must be positive");
        }
        if self.telemetry.reality_window == 0 {
            return invalid("telemetry.reality_window must be positive");
        }
        if self.feed.samples == 0 {
            return invalid("feed.samples must be positive");
        }
        if self.governor.criticality_low > self.governor.criticality_high {
            return invalid(
                "governor.criticality_low must not exceed governor.criticality_high",
            );
        }
        if self.policy.enabled && self.policy.cooldown == 0 {
            return invalid("policy.cooldown must be positive");
        }
        let unit = 0.0..=1.0;
        if ![self.causal.reinforce, self.causal.weaken, self.causal.prune_below]
            .iter()
            .all(|v| unit.contains(v))
        {
            return invalid(
                "causal.reinforce, causal.weaken and causal.prune_below must lie in [0, 1]",
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ReactorConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.scram.criticality_ceiling, 1.8);
        assert_eq!(c.scram.temperature_ceiling, 0.95);
        assert_eq!(c.scram.reality_floor, 0.05);
        assert_eq!(c.policy.cooldown, 10);
        assert!(!c.policy.enabled);
    }

    #[test]
    fn presets_validate() {
        let demo = ReactorConfig::demo();
        assert!(demo.validate().is_ok());
        assert!(demo.policy.enabled);

        let stress = ReactorConfig::stress();
        assert!(stress.validate().is_ok());
        assert!(stress.telemetry.horizon < ReactorConfig::default().telemetry.horizon);
    }

    #[test]
    fn loose_conservative_thresholds_rejected() {
        let mut c = ReactorConfig::default();
        c.engine.conservative.coherence = 5.0;
        assert!(matches!(c.validate(), Err(ReactorError::Thresholds(_))));
    }

    #[test]
    fn zero_horizon_rejected() {
        let mut c = ReactorConfig::default();
        c.telemetry.horizon = 0;
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("horizon"));
    }

    #[test]
    fn causal_rates_must_be_fractions() {
        let mut c = ReactorConfig::default();
        assert!(!c.causal.enabled);
        assert!(c.engine.decidability);
        c.causal.weaken = 1.5;
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("causal.weaken"));
    }

    #[test]
    fn config_serde() {
        let c = ReactorConfig::stress().with_seed(7);
        let json = serde_json::to_string(&c).unwrap();
        let restored: ReactorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.feed.seed, 7);
        assert_eq!(restored.engine.hypotheses_per_cycle, 6);
        assert_eq!(restored.telemetry.horizon, 10);

        let partial: ReactorConfig = serde_json::from_str(r#"{"feed":{"seed":9}}"#).unwrap();
        assert_eq!(partial.feed.seed, 9);
        assert_eq!(partial.feed.samples, 64);
    }
}
