//! Small numeric helpers shared by the estimators.

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance with an `n - 1` denominator (floored at 1).
pub fn sample_variance(values: &[f64]) -> f64 {
    let mu = mean(values);
    let ss: f64 = values.iter().map(|v| (v - mu) * (v - mu)).sum();
    ss / (values.len().saturating_sub(1)).max(1) as f64
}

/// Least-squares line `y = intercept + slope * t` over sample indices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
}

impl LinearFit {
    pub fn predict(&self, t: usize) -> f64 {
        self.intercept + self.slope * t as f64
    }

    pub fn residuals(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .map(|(t, y)| y - self.predict(t))
            .collect()
    }
}

/// Fit a line over `(index, value)`; a flat line through the mean when
/// there are fewer than two samples.
pub fn linear_fit(values: &[f64]) -> LinearFit {
    let n = values.len();
    let mean_y = mean(values);
    if n < 2 {
        return LinearFit {
            intercept: mean_y,
            slope: 0.0,
        };
    }
    let mean_t = (n - 1) as f64 / 2.0;
    let mut num = 0.0;
    let mut den = 0.0;
    for (t, y) in values.iter().enumerate() {
        let dt = t as f64 - mean_t;
        num += dt * (y - mean_y);
        den += dt * dt;
    }
    if den.abs() < 1e-12 {
        return LinearFit {
            intercept: mean_y,
            slope: 0.0,
        };
    }
    let slope = num / den;
    LinearFit {
        intercept: mean_y - slope * mean_t,
        slope,
    }
}
