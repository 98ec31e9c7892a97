use maat_types::TestStatistics;
use serde::{Deserialize, Serialize};

/// Scores how much attention a hypothesis deserves, in [0, 1].
///
/// Implementations must be deterministic and monotone: raising the
/// coherence ratio never lowers the score, raising risk never raises it.
pub trait AttentionScorer: Send + Sync {
    fn score(&self, statistics: &TestStatistics) -> f64;
}

/// Normalised signals feeding the default scorer, each in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttentionSignals {
    /// Structure the hypothesis explains beyond the null (compression gain).
    pub novelty: f64,
    /// Coherence ratio against its scale.
    pub coherence: f64,
    /// Probability mass against the claim.
    pub risk: f64,
    /// Posterior uncertainty; peaks at 0.5.
    pub volatility: f64,
}

/// Weights and scales of [`WeightedAttention`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttentionWeights {
    pub novelty: f64,
    pub coherence: f64,
    pub risk: f64,
    pub volatility: f64,
    /// Coherence ratio mapped to a full coherence signal.
    pub coherence_scale: f64,
    /// MDL gain (bits) mapped to a full novelty signal.
    pub mdl_scale: f64,
}

impl Default for AttentionWeights {
    fn default() -> Self {
        Self {
            novelty: 0.4,
            coherence: 0.3,
            risk: 0.2,
            volatility: 0.1,
            coherence_scale: 12.0,
            mdl_scale: 16.0,
        }
    }
}

/// Logistic blend of the four signals.
#[derive(Clone, Debug, Default)]
pub struct WeightedAttention {
    pub weights: AttentionWeights,
}

impl WeightedAttention {
    pub fn new(weights: AttentionWeights) -> Self {
        Self { weights }
    }

    pub fn signals(&self, stats: &TestStatistics) -> AttentionSignals {
        let w = &self.weights;
        let posterior = unit(stats.posterior_mean);
        AttentionSignals {
            novelty: unit(ratio((-stats.mdl_delta_bits).max(0.0), w.mdl_scale)),
            coherence: unit(ratio(stats.coherence_ratio, w.coherence_scale)),
            risk: 1.0 - posterior,
            volatility: 1.0 - (2.0 * posterior - 1.0).abs(),
        }
    }
}

impl AttentionScorer for WeightedAttention {
    fn score(&self, stats: &TestStatistics) -> f64 {
        let s = self.signals(stats);
        let w = &self.weights;
        let z = w.novelty * s.novelty + w.coherence * s.coherence
            - w.risk * s.risk
            - w.volatility * s.volatility;
        sigmoid(z)
    }
}

fn ratio(value: f64, scale: f64) -> f64 {
    if scale > 0.0 {
        value / scale
    } else {
        0.0
    }
}

/// Clamp to [0, 1]; NaN maps to 0.
fn unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
