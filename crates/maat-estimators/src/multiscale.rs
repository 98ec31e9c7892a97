use std::f64::consts::SQRT_2;

use serde::{Deserialize, Serialize};

use crate::fit::mean;

/// A level counts as scale-invariant when its energy share is this close
/// to the mean share.
const INVARIANCE_TOLERANCE: f64 = 0.05;

/// Haar wavelet decomposition.
///
/// Returns detail coefficients from the finest level up, followed by the
/// final one-sample approximation when the halving reaches it. An odd
/// trailing sample is dropped at each level. Fewer than two samples
/// decompose to nothing.
pub fn haar_dwt(values: &[f64]) -> Vec<Vec<f64>> {
    let mut levels = Vec::new();
    let mut approx = values.to_vec();
    while approx.len() >= 2 {
        let (next, detail): (Vec<f64>, Vec<f64>) = approx
            .chunks_exact(2)
            .map(|p| ((p[0] + p[1]) / SQRT_2, (p[0] - p[1]) / SQRT_2))
            .unzip();
        levels.push(detail);
        approx = next;
        if approx.len() == 1 {
            levels.push(approx);
            break;
        }
    }
    levels
}

/// Mean energy per decomposition level and each level's share of the total.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleEnergy {
    pub energies: Vec<f64>,
    pub coherence: Vec<f64>,
}

impl ScaleEnergy {
    pub fn levels(&self) -> usize {
        self.energies.len()
    }
}

/// One level whose energy share sits near the mean share.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalePattern {
    /// 1-based, finest detail first.
    pub level: usize,
    pub share: f64,
}

/// Energy map of the Haar decomposition.
pub fn scale_energy(values: &[f64]) -> ScaleEnergy {
    let energies: Vec<f64> = haar_dwt(values)
        .iter()
        .map(|level| level.iter().map(|c| c * c).sum::<f64>() / level.len().max(1) as f64)
        .collect();
    let total = energies.iter().sum::<f64>();
    let total = if total > 0.0 { total } else { 1e-12 };
    let coherence = energies.iter().map(|e| e / total).collect();
    ScaleEnergy {
        energies,
        coherence,
    }
}

/// Levels carrying a near-uniform share of the energy, a hint that the
/// series looks alike across scales.
pub fn scale_invariant_levels(values: &[f64]) -> Vec<ScalePattern> {
    let map = scale_energy(values);
    if map.coherence.is_empty() {
        return Vec::new();
    }
    let avg = mean(&map.coherence);
    map.coherence
        .iter()
        .enumerate()
        .filter(|(_, share)| (*share - avg).abs() < INVARIANCE_TOLERANCE)
        .map(|(i, share)| ScalePattern {
            level: i + 1,
            share: *share,
        })
        .collect()
}
