use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use maat_types::{FieldValue, Observation, ObservationOrigin, TypesError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::FeedConfig;

/// Seeded, noisy two-tone signal with drift.
///
/// Sample `i` of a batch starting at clock `t0` is
/// `0.8 sin(2πt/16) + 0.2 sin(2πt/7) + U(-noise, noise) + drift·i` with
/// `t = t0 + i`. The clock never rewinds.
#[derive(Clone, Debug)]
pub struct SyntheticFeed {
    config: FeedConfig,
    rng: StdRng,
    clock: u64,
}

impl SyntheticFeed {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            clock: 0,
        }
    }

    /// Samples emitted so far.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn next_series(&mut self) -> Vec<f64> {
        let noise = self.config.noise.abs();
        let base = self.clock;
        let series = (0..self.config.samples)
            .map(|i| {
                let t = (base + i as u64) as f64;
                let mut x = 0.8 * (2.0 * PI * t / 16.0).sin() + 0.2 * (2.0 * PI * t / 7.0).sin();
                if noise > 0.0 {
                    x += self.rng.gen_range(-noise..=noise);
                }
                x + self.config.drift * i as f64
            })
            .collect();
        self.clock += self.config.samples as u64;
        series
    }

    /// Next batch as an external observation stamped with the logical
    /// clock at its first sample.
    pub fn next_observation(&mut self) -> Result<Observation, TypesError> {
        let timestamp = self.timestamp(self.clock);
        let mut fields = BTreeMap::new();
        fields.insert("x".to_string(), FieldValue::Series(self.next_series()));
        Observation::new(
            self.config.source.clone(),
            ObservationOrigin::External,
            timestamp,
            fields,
        )
    }

    /// Logical time of a clock reading; never the wall clock.
    pub fn timestamp(&self, clock: u64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.config.epoch_secs.saturating_add(clock as i64), 0)
            .unwrap_or_default()
    }
}
