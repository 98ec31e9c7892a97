use std::sync::Arc;

use maat_types::{Hypothesis, TestStatistics};
use tracing::debug;

use crate::bayes::{beta_bernoulli, PosteriorEstimator};
use crate::coherence::CoherenceEstimator;
use crate::error::EstimatorError;
use crate::mdl::MdlEstimator;

/// Maps an observation window and a hypothesis to one scalar statistic.
///
/// Implementations must be pure and deterministic.
pub trait Estimator: Send + Sync {
    fn name(&self) -> &'static str;

    fn estimate(&self, window: &[f64], hypothesis: &Hypothesis) -> Result<f64, EstimatorError>;
}

/// Validated statistics plus the Bernoulli counts behind them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub statistics: TestStatistics,
    pub successes: u64,
    pub failures: u64,
    pub window_len: usize,
}

/// One estimator per statistic.
#[derive(Clone)]
pub struct EstimatorSuite {
    posterior: Arc<dyn Estimator>,
    coherence: Arc<dyn Estimator>,
    mdl: Arc<dyn Estimator>,
}

impl Default for EstimatorSuite {
    fn default() -> Self {
        Self::new(
            Arc::new(PosteriorEstimator::default()),
            Arc::new(CoherenceEstimator::default()),
            Arc::new(MdlEstimator::default()),
        )
    }
}

impl std::fmt::Debug for EstimatorSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EstimatorSuite")
            .field("posterior", &self.posterior.name())
            .field("coherence", &self.coherence.name())
            .field("mdl", &self.mdl.name())
            .finish()
    }
}

impl EstimatorSuite {
    pub fn new(
        posterior: Arc<dyn Estimator>,
        coherence: Arc<dyn Estimator>,
        mdl: Arc<dyn Estimator>,
    ) -> Self {
        Self {
            posterior,
            coherence,
            mdl,
        }
    }

    pub fn with_posterior(mut self, estimator: Arc<dyn Estimator>) -> Self {
        self.posterior = estimator;
        self
    }

    pub fn with_coherence(mut self, estimator: Arc<dyn Estimator>) -> Self {
        self.coherence = estimator;
        self
    }

    pub fn with_mdl(mut self, estimator: Arc<dyn Estimator>) -> Self {
        self.mdl = estimator;
        self
    }

    /// Run all three estimators over `window` and validate their output.
    pub fn measure(
        &self,
        window: &[f64],
        hypothesis: &Hypothesis,
    ) -> Result<Measurement, EstimatorError> {
        if let Some(index) = window.iter().position(|v| !v.is_finite()) {
            return Err(EstimatorError::NonFiniteInput { index });
        }

        let posterior = bounded(
            self.posterior.name(),
            self.posterior.estimate(window, hypothesis)?,
            0.0,
            1.0,
        )?;
        let coherence = bounded(
            self.coherence.name(),
            self.coherence.estimate(window, hypothesis)?,
            0.0,
            f64::INFINITY,
        )?;
        let mdl = finite(self.mdl.name(), self.mdl.estimate(window, hypothesis)?)?;

        let counts = beta_bernoulli(window, 0.0, 0.0);
        debug!(
            hypothesis = %hypothesis.id,
            window = window.len(),
            posterior,
            coherence,
            mdl,
            "Measured hypothesis"
        );
        Ok(Measurement {
            statistics: TestStatistics::new(posterior, coherence, mdl),
            successes: counts.successes,
            failures: counts.failures,
            window_len: window.len(),
        })
    }
}

fn finite(estimator: &'static str, value: f64) -> Result<f64, EstimatorError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EstimatorError::NonFinite { estimator })
    }
}

fn bounded(estimator: &'static str, value: f64, min: f64, max: f64) -> Result<f64, EstimatorError> {
    let value = finite(estimator, value)?;
    if value < min || value > max {
        return Err(EstimatorError::OutOfRange {
            estimator,
            value,
            min,
            max,
        });
    }
    Ok(value)
}
