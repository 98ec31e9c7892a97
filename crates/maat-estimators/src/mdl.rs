use std::f64::consts::{LN_2, PI};

use maat_types::Hypothesis;
use serde::{Deserialize, Serialize};

use crate::error::EstimatorError;
use crate::fit::{linear_fit, mean, sample_variance};
use crate::suite::Estimator;

const SIGMA_FLOOR: f64 = 1e-12;

/// Model compared against the constant-mean null.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MdlModel {
    /// Least-squares line over the sample index.
    #[default]
    Linear,
    /// The null itself; the delta is then the parameter penalty alone.
    Constant,
}

/// Gaussian code length in nats: `0.5 n (1 + ln(2 pi sigma^2))`.
fn gaussian_code_length(n: usize, sigma: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    0.5 * n as f64 * (1.0 + (2.0 * PI * sigma * sigma).ln())
}

fn sigma_of(values: &[f64]) -> f64 {
    let var = sample_variance(values);
    if var > 0.0 {
        var.sqrt()
    } else {
        SIGMA_FLOOR
    }
}

/// Description-length delta in bits: model data cost plus a
/// `0.5 * params * ln(n)` penalty, minus the null's data cost.
/// Negative means the model compresses the window better than the null.
pub fn mdl_delta_bits(values: &[f64], model: MdlModel, params: usize) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mu = mean(values);
    let null_resid: Vec<f64> = values.iter().map(|v| v - mu).collect();
    let resid = match model {
        MdlModel::Linear => linear_fit(values).residuals(values),
        MdlModel::Constant => null_resid.clone(),
    };

    let l_null = gaussian_code_length(n, sigma_of(&null_resid));
    let l_model = gaussian_code_length(n, sigma_of(&resid));
    let penalty = 0.5 * params as f64 * (n as f64).ln();
    (l_model + penalty - l_null) / LN_2
}

/// MDL estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MdlEstimator {
    pub model: MdlModel,
    pub params: usize,
}

impl Default for MdlEstimator {
    fn default() -> Self {
        Self {
            model: MdlModel::Linear,
            params: 2,
        }
    }
}

impl Estimator for MdlEstimator {
    fn name(&self) -> &'static str {
        "mdl_delta_bits"
    }

    fn estimate(&self, window: &[f64], _hypothesis: &Hypothesis) -> Result<f64, EstimatorError> {
        Ok(mdl_delta_bits(window, self.model, self.params))
    }
}
