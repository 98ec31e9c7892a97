use std::collections::VecDeque;

use maat_engine::CycleOutput;
use maat_estimators::mean;
use maat_types::HemisphereKind;
use serde::{Deserialize, Serialize};

use crate::config::TelemetryConfig;

/// How agreement between the external and meta series is measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealityMetric {
    /// `1 - min(1, |mean(external) - mean(meta)|)`.
    #[default]
    MeanAgreement,
    /// Pearson correlation of the aligned tails, mapped to `(r + 1) / 2`.
    Pearson,
}

impl RealityMetric {
    /// Agreement in [0, 1]. With nothing to compare the series are taken
    /// to agree; a flat series gives Pearson's neutral 0.5.
    pub fn measure(&self, external: &[f64], meta: &[f64]) -> f64 {
        if external.is_empty() || meta.is_empty() {
            return 1.0;
        }
        match self {
            RealityMetric::MeanAgreement => 1.0 - (mean(external) - mean(meta)).abs().min(1.0),
            RealityMetric::Pearson => {
                let n = external.len().min(meta.len());
                match pearson(&external[external.len() - n..], &meta[meta.len() - n..]) {
                    Some(r) => ((r + 1.0) / 2.0).clamp(0.0, 1.0),
                    None => 0.5,
                }
            }
        }
    }
}

fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() < 2 {
        return None;
    }
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma).powi(2);
        vb += (y - mb).powi(2);
    }
    let denom = (va * vb).sqrt();
    (denom > 1e-12).then(|| cov / denom)
}

/// Loop-health snapshot for one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Outer over inner activity, Laplace-smoothed; 1 when both are idle.
    pub criticality: f64,
    /// Elapsed cycles against the horizon, in [0, 1].
    pub temperature: f64,
    /// Recent decisions against capacity, in [0, 1].
    pub pressure: f64,
    /// Agreement of the external and meta series, in [0, 1].
    pub reality: f64,
}

#[derive(Clone, Copy, Debug)]
struct CycleActivity {
    inner_accepts: u64,
    outer_accepts: u64,
    decisions: u64,
}

/// Rolling state behind [`Telemetry`].
#[derive(Clone, Debug)]
pub struct TelemetryTracker {
    config: TelemetryConfig,
    activity: VecDeque<CycleActivity>,
    external: VecDeque<f64>,
    meta: VecDeque<f64>,
}

impl TelemetryTracker {
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            activity: VecDeque::new(),
            external: VecDeque::new(),
            meta: VecDeque::new(),
        }
    }

    /// Fold one cycle's outputs in and return the new snapshot.
    pub fn observe(
        &mut self,
        cycle: u64,
        inner: &CycleOutput,
        outer: &CycleOutput,
        external: &[f64],
        meta: &[f64],
    ) -> Telemetry {
        self.activity.push_back(CycleActivity {
            inner_accepts: inner.counts(HemisphereKind::Exploratory).accept,
            outer_accepts: outer.counts(HemisphereKind::Exploratory).accept,
            decisions: (inner.decisions.len() + outer.decisions.len()) as u64,
        });
        while self.activity.len() > self.config.activity_window {
            self.activity.pop_front();
        }
        push_window(&mut self.external, external, self.config.reality_window);
        push_window(&mut self.meta, meta, self.config.reality_window);

        let (inner_accepts, outer_accepts, decisions) = self
            .activity
            .iter()
            .fold((0u64, 0u64, 0u64), |(i, o, d), a| {
                (i + a.inner_accepts, o + a.outer_accepts, d + a.decisions)
            });
        let capacity = self.config.activity_window as f64 * self.config.pressure_capacity;

        let external: Vec<f64> = self.external.iter().copied().collect();
        let meta: Vec<f64> = self.meta.iter().copied().collect();
        Telemetry {
            criticality: (outer_accepts as f64 + 1.0) / (inner_accepts as f64 + 1.0),
            temperature: (cycle as f64 / self.config.horizon.max(1) as f64).min(1.0),
            pressure: (decisions as f64 / capacity).min(1.0),
            reality: self.config.reality_metric.measure(&external, &meta),
        }
    }
}

fn push_window(buffer: &mut VecDeque<f64>, samples: &[f64], cap: usize) {
    buffer.extend(samples.iter().copied());
    while buffer.len() > cap {
        buffer.pop_front();
    }
}
