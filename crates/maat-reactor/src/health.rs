use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::LazyLock;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use maat_types::Receipt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Claims kept for degradation checks.
const CLAIM_WINDOW: usize = 200;
/// Receipts kept for the learning rate.
const RECEIPT_WINDOW: usize = 500;
/// Receipts compressed together at each step of the learning rate.
const COMPRESSION_SPAN: usize = 25;
/// Fewer receipts than this give a learning rate of zero.
const MIN_RECEIPTS: usize = 20;

static TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[A-Za-z_]{3,}").ok());

/// Vocabulary diversity of recent claims and any degradation alerts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub vocabulary: usize,
    pub tokens: usize,
    /// Simpson diversity `1 - Σ p²` over token frequencies.
    pub simpson_diversity: f64,
    /// Negative normalized slope of the compressed size of recent
    /// receipts; positive when the record stream is getting more regular.
    #[serde(default)]
    pub learning_rate: f64,
    pub alerts: Vec<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.alerts.is_empty()
    }
}

/// Watches hypothesis claims for semantic collapse and fixation, and the
/// receipt stream for structure.
#[derive(Clone, Debug, Default)]
pub struct HealthMonitor {
    claims: VecDeque<String>,
    receipts: VecDeque<String>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe<'a>(&mut self, claims: impl IntoIterator<Item = &'a str>) {
        for claim in claims {
            if self.claims.len() == CLAIM_WINDOW {
                self.claims.pop_front();
            }
            self.claims.push_back(claim.to_string());
        }
    }

    pub fn observe_receipts<'a>(
        &mut self,
        receipts: impl IntoIterator<Item = &'a Receipt>,
    ) -> Result<(), serde_json::Error> {
        for receipt in receipts {
            if self.receipts.len() == RECEIPT_WINDOW {
                self.receipts.pop_front();
            }
            self.receipts.push_back(serde_json::to_string(receipt)?);
        }
        Ok(())
    }

    /// Compress a sliding span of receipts at each position and compare the
    /// last compressed size with the first, scaled by the mean size.
    pub fn learning_rate(&self) -> f64 {
        if self.receipts.len() < MIN_RECEIPTS {
            return 0.0;
        }
        let mut span: VecDeque<&str> = VecDeque::with_capacity(COMPRESSION_SPAN);
        let mut sizes = Vec::with_capacity(self.receipts.len());
        for receipt in &self.receipts {
            if span.len() == COMPRESSION_SPAN {
                span.pop_front();
            }
            span.push_back(receipt);
            match compressed_len(&span) {
                Ok(n) => sizes.push(n as f64),
                Err(e) => {
                    warn!(error = %e, "Receipt compression failed");
                    return 0.0;
                }
            }
        }
        let (first, last) = (sizes[0], sizes[sizes.len() - 1]);
        let slope = (last - first) / sizes.len() as f64;
        let mean = sizes.iter().sum::<f64>() / sizes.len() as f64;
        -slope / mean.max(10.0)
    }

    pub fn report(&self) -> HealthReport {
        let tokens: Vec<String> = self.claims.iter().flat_map(|c| tokenize(c)).collect();
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for t in &tokens {
            *freq.entry(t.as_str()).or_default() += 1;
        }
        let n = tokens.len().max(1) as f64;
        let simpson = 1.0 - freq.values().map(|c| (*c as f64 / n).powi(2)).sum::<f64>();

        let mut alerts = Vec::new();
        if freq.len() <= 20usize.max(tokens.len() / 20) {
            alerts.push("Semantic collapse (low vocabulary)".to_string());
        }
        let mut trigrams: HashMap<(&str, &str, &str), usize> = HashMap::new();
        for w in tokens.windows(3) {
            *trigrams
                .entry((w[0].as_str(), w[1].as_str(), w[2].as_str()))
                .or_default() += 1;
        }
        if trigrams.values().any(|c| *c > 10) {
            alerts.push("Hypothesis fixation (repetitive patterns)".to_string());
        }

        HealthReport {
            vocabulary: freq.len(),
            tokens: tokens.len(),
            simpson_diversity: simpson,
            learning_rate: self.learning_rate(),
            alerts,
        }
    }
}

/// Lowercased runs of three or more ASCII letters or underscores.
fn tokenize(text: &str) -> Vec<String> {
    TOKEN
        .as_ref()
        .map(|re| {
            re.find_iter(text)
                .map(|m| m.as_str().to_ascii_lowercase())
                .collect()
        })
        .unwrap_or_default()
}

/// zlib size at maximum compression of the concatenated lines.
fn compressed_len(lines: &VecDeque<&str>) -> std::io::Result<usize> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    for line in lines {
        encoder.write_all(line.as_bytes())?;
    }
    Ok(encoder.finish()?.len())
}
