use std::f64::consts::PI;

use maat_types::Hypothesis;
use serde::{Deserialize, Serialize};

use crate::error::EstimatorError;
use crate::fit::mean;
use crate::suite::Estimator;

/// Shortest window with a meaningful spectrum.
const MIN_SAMPLES: usize = 4;

/// Ratio of the largest DFT magnitude to the mean magnitude over bins
/// `0..=n/2` of the mean-detrended series. 0 when the series is shorter
/// than four samples or has no spectral energy.
pub fn fft_peak_mean(values: &[f64]) -> f64 {
    let n = values.len();
    if n < MIN_SAMPLES {
        return 0.0;
    }
    let mu = mean(values);
    let xs: Vec<f64> = values.iter().map(|v| v - mu).collect();

    let mags: Vec<f64> = (0..=n / 2)
        .map(|k| {
            let (mut re, mut im) = (0.0, 0.0);
            for (t, x) in xs.iter().enumerate() {
                let angle = 2.0 * PI * (k * t) as f64 / n as f64;
                re += x * angle.cos();
                im -= x * angle.sin();
            }
            re.hypot(im)
        })
        .collect();

    let mean_mag = mean(&mags);
    if mean_mag <= 1e-12 {
        return 0.0;
    }
    mags.iter().cloned().fold(f64::MIN, f64::max) / mean_mag
}

/// Coherence of the most recent `window_size` samples (all when `None`).
pub fn coherence_score(values: &[f64], window_size: Option<usize>) -> f64 {
    match window_size {
        Some(w) if values.len() > w => fft_peak_mean(&values[values.len() - w..]),
        _ => fft_peak_mean(values),
    }
}

/// Coherence estimator with an optional trailing window.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoherenceEstimator {
    pub window_size: Option<usize>,
}

impl Estimator for CoherenceEstimator {
    fn name(&self) -> &'static str {
        "coherence_ratio"
    }

    fn estimate(&self, window: &[f64], _hypothesis: &Hypothesis) -> Result<f64, EstimatorError> {
        Ok(coherence_score(window, self.window_size))
    }
}
