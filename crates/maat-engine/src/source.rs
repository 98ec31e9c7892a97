use std::path::Path;

use maat_estimators::{fft_peak_mean, linear_fit, mean, scale_invariant_levels};
use maat_types::{CausalLink, HemisphereKind, Hypothesis, Observation};
use tracing::{debug, warn};

use crate::error::SourceError;

/// Produces candidate hypotheses for an observation.
///
/// Must be deterministic for a fixed seed and configuration; may return
/// nothing. Implementations never return more than `max_count` items.
pub trait HypothesisSource: Send {
    fn name(&self) -> &str;

    fn generate(
        &mut self,
        observation: &Observation,
        max_count: usize,
    ) -> Result<Vec<Hypothesis>, SourceError>;
}

/// Statistical claims computed from the observation's series.
///
/// Emits, in order, a stability, a trend and a periodicity claim, then a
/// self-similarity claim when some wavelet levels share the energy evenly.
#[derive(Clone, Debug)]
pub struct ProgrammaticSource {
    field: String,
}

impl Default for ProgrammaticSource {
    fn default() -> Self {
        Self::new("x")
    }
}

impl ProgrammaticSource {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl HypothesisSource for ProgrammaticSource {
    fn name(&self) -> &str {
        "programmatic"
    }

    fn generate(
        &mut self,
        observation: &Observation,
        max_count: usize,
    ) -> Result<Vec<Hypothesis>, SourceError> {
        let series = observation.samples(&self.field);
        if series.is_empty() {
            return Ok(Vec::new());
        }
        let mu = mean(&series);
        let slope = linear_fit(&series).slope;
        let coh = fft_peak_mean(&series);
        let target = self.field.as_str();

        let mut candidates = vec![
            (
                format!("mean>{:.3} implies stability", mu),
                CausalLink::new(["baseline"], target),
            ),
            (
                format!("slope>{:.3} implies trend", slope),
                CausalLink::new(["time"], target),
            ),
            (
                format!("coherence>{:.2} implies periodic pattern", coh),
                CausalLink::new(["phase"], target),
            ),
        ];
        let invariant = scale_invariant_levels(&series);
        if invariant.len() >= 2 {
            let levels: Vec<String> = invariant.iter().map(|p| p.level.to_string()).collect();
            candidates.push((
                format!(
                    "scale levels {} share energy implies self-similar pattern",
                    levels.join(",")
                ),
                CausalLink::new(["scale"], target),
            ));
        }

        candidates
            .into_iter()
            .take(max_count)
            .enumerate()
            .map(|(i, (claim, link))| {
                Hypothesis::new(
                    claim,
                    HemisphereKind::Exploratory,
                    vec![observation.id.clone()],
                    i as u32,
                    Some(link),
                )
                .map_err(SourceError::from)
            })
            .collect()
    }
}

/// Something that answers a prompt with free text.
pub trait TextProvider: Send {
    fn respond(&mut self, prompt: &str) -> Result<String, SourceError>;
}

impl<F> TextProvider for F
where
    F: FnMut(&str) -> Result<String, SourceError> + Send,
{
    fn respond(&mut self, prompt: &str) -> Result<String, SourceError> {
        self(prompt)
    }
}

/// Canned responses served round robin, one per prompt.
#[derive(Clone, Debug, Default)]
pub struct ScriptedText {
    lines: Vec<String>,
    next: usize,
}

impl ScriptedText {
    pub fn from_lines(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            lines: lines
                .into_iter()
                .map(Into::into)
                .map(|l: String| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
            next: 0,
        }
    }

    /// Load one response per non-blank line of a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_lines(text.lines()))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl TextProvider for ScriptedText {
    fn respond(&mut self, _prompt: &str) -> Result<String, SourceError> {
        if self.lines.is_empty() {
            return Ok(String::new());
        }
        let line = self.lines[self.next % self.lines.len()].clone();
        self.next = (self.next + 1) % self.lines.len();
        Ok(line)
    }
}

/// Claims parsed from an external text provider's answer.
pub struct ExternalTextSource {
    provider: Box<dyn TextProvider>,
    field: String,
}

impl ExternalTextSource {
    pub fn new(provider: Box<dyn TextProvider>) -> Self {
        Self {
            provider,
            field: "x".into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    fn prompt(series: &[f64], max_count: usize) -> String {
        let lo = series.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = series.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        format!(
            "Given a time series with {} samples:\n- Mean: {:.3}\n- Min: {:.3}\n- Max: {:.3}\n\n\
             Generate {} testable hypotheses about this data.\nFormat: one hypothesis per line.",
            series.len(),
            mean(series),
            lo,
            hi,
            max_count
        )
    }
}

impl HypothesisSource for ExternalTextSource {
    fn name(&self) -> &str {
        "external_text"
    }

    fn generate(
        &mut self,
        observation: &Observation,
        max_count: usize,
    ) -> Result<Vec<Hypothesis>, SourceError> {
        let series = observation.samples(&self.field);
        if series.is_empty() || max_count == 0 {
            return Ok(Vec::new());
        }
        let response = self.provider.respond(&Self::prompt(&series, max_count))?;
        parse_claims(&response)
            .into_iter()
            .take(max_count)
            .enumerate()
            .map(|(i, claim)| {
                Hypothesis::new(
                    claim,
                    HemisphereKind::Exploratory,
                    vec![observation.id.clone()],
                    i as u32,
                    None,
                )
                .map_err(SourceError::from)
            })
            .collect()
    }
}

/// Tries a primary source, falling back to the programmatic one when the
/// primary fails or has nothing to say.
pub struct FallbackSource {
    primary: Box<dyn HypothesisSource>,
    fallback: ProgrammaticSource,
}

impl FallbackSource {
    pub fn new(primary: Box<dyn HypothesisSource>) -> Self {
        Self {
            primary,
            fallback: ProgrammaticSource::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: ProgrammaticSource) -> Self {
        self.fallback = fallback;
        self
    }
}

impl HypothesisSource for FallbackSource {
    fn name(&self) -> &str {
        "fallback"
    }

    fn generate(
        &mut self,
        observation: &Observation,
        max_count: usize,
    ) -> Result<Vec<Hypothesis>, SourceError> {
        match self.primary.generate(observation, max_count) {
            Ok(hyps) if !hyps.is_empty() => Ok(hyps),
            Ok(_) => {
                debug!(primary = self.primary.name(), "Primary source empty, using fallback");
                self.fallback.generate(observation, max_count)
            }
            Err(e) => {
                warn!(
                    primary = self.primary.name(),
                    error = %e,
                    "Primary source failed, using fallback"
                );
                self.fallback.generate(observation, max_count)
            }
        }
    }
}

/// Split free text into claims: one per line or comma-separated, with
/// bullet and numbered-list markers removed.
pub fn parse_claims(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(|line| line.split(','))
        .map(|c| strip_marker(c.trim()).trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn strip_marker(claim: &str) -> &str {
    for bullet in ["- ", "* ", "\u{2022} "] {
        if let Some(rest) = claim.strip_prefix(bullet) {
            return rest;
        }
    }
    let digits = claim.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = claim[digits..].strip_prefix(". ") {
            return rest;
        }
    }
    claim
}
