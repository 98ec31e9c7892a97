use maat_types::Hypothesis;
use serde::{Deserialize, Serialize};

use crate::error::EstimatorError;
use crate::fit::mean;
use crate::suite::Estimator;

/// Beta posterior after a Bernoulli update.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BetaPosterior {
    pub successes: u64,
    pub failures: u64,
    pub alpha: f64,
    pub beta: f64,
}

impl BetaPosterior {
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }
}

/// Update `Beta(prior_a, prior_b)` with one trial per sample, counting a
/// success when the sample lies strictly above the window mean.
pub fn beta_bernoulli(values: &[f64], prior_a: f64, prior_b: f64) -> BetaPosterior {
    let mu = mean(values);
    let successes = values.iter().filter(|x| **x > mu).count() as u64;
    let failures = values.len() as u64 - successes;
    BetaPosterior {
        successes,
        failures,
        alpha: prior_a + successes as f64,
        beta: prior_b + failures as f64,
    }
}

/// Posterior-mean estimator with a configurable Beta prior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PosteriorEstimator {
    pub prior_a: f64,
    pub prior_b: f64,
}

impl Default for PosteriorEstimator {
    fn default() -> Self {
        Self {
            prior_a: 1.0,
            prior_b: 1.0,
        }
    }
}

impl Estimator for PosteriorEstimator {
    fn name(&self) -> &'static str {
        "posterior_mean"
    }

    fn estimate(&self, window: &[f64], _hypothesis: &Hypothesis) -> Result<f64, EstimatorError> {
        if self.prior_a <= 0.0 || self.prior_b <= 0.0 {
            return Err(EstimatorError::Failed {
                estimator: self.name(),
                message: format!(
                    "prior must be positive, got Beta({}, {})",
                    self.prior_a, self.prior_b
                ),
            });
        }
        Ok(beta_bernoulli(window, self.prior_a, self.prior_b).mean())
    }
}
