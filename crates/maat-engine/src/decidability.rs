//! Pattern screen for claims that cannot be settled by measurement.
//!
//! A claim that refers to itself, states a paradox or asks whether
//! something halts is refused before any estimator runs. The screen is
//! conservative: it only flags phrasing it recognizes.

use std::fmt;

use maat_types::Hypothesis;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Claims longer than this are never classed as simple.
const SIMPLE_CLAIM_LEN: usize = 140;

const SELF_REFERENCE: &str =
    r"(?i)\b(this\s+hypothesis|itself|self-referential|not\s+provable)\b";
const UNBOUNDED_LOOP: &str =
    r"(?i)(\bwhile\s+true\b|\bfor\s*\(\s*;\s*;\s*\)|\binfinite\s+loop\b)";
const PARADOX: &str = r"(?i)\b(contradiction|paradox|liar\s+sentence)\b";
const HALTING: &str = r"(?i)\b(halts|halt(ing)?\s+problem|turing[\s-]+complete)\b";

/// Rough complexity hint for a claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplexityClass {
    P,
    Np,
    Exptime,
    Undecidable,
}

impl fmt::Display for ComplexityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplexityClass::P => write!(f, "P"),
            ComplexityClass::Np => write!(f, "NP"),
            ComplexityClass::Exptime => write!(f, "EXPTIME"),
            ComplexityClass::Undecidable => write!(f, "UNDECIDABLE"),
        }
    }
}

/// Which patterns matched a claim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecidabilityFlags {
    pub self_reference: bool,
    pub unbounded_loop: bool,
    pub paradox: bool,
    pub halting: bool,
}

impl DecidabilityFlags {
    pub fn any(&self) -> bool {
        self.self_reference || self.unbounded_loop || self.paradox || self.halting
    }

    /// Weighted evidence strength, 0.4/0.3/0.2/0.1 in flag order.
    pub fn confidence(&self) -> f64 {
        let weights = [
            (self.self_reference, 0.4),
            (self.unbounded_loop, 0.3),
            (self.paradox, 0.2),
            (self.halting, 0.1),
        ];
        weights
            .iter()
            .filter(|(hit, _)| *hit)
            .map(|(_, w)| w)
            .sum::<f64>()
            .min(1.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecidabilityAssessment {
    pub decidable: bool,
    pub complexity_class: ComplexityClass,
    pub confidence: f64,
    pub flags: DecidabilityFlags,
    pub reason: String,
}

/// Compiled claim patterns.
#[derive(Clone, Debug)]
pub struct DecidabilityGate {
    self_reference: Regex,
    unbounded_loop: Regex,
    paradox: Regex,
    halting: Regex,
}

impl DecidabilityGate {
    pub fn new() -> Result<Self, EngineError> {
        Ok(Self {
            self_reference: Regex::new(SELF_REFERENCE)?,
            unbounded_loop: Regex::new(UNBOUNDED_LOOP)?,
            paradox: Regex::new(PARADOX)?,
            halting: Regex::new(HALTING)?,
        })
    }

    pub fn flags(&self, text: &str) -> DecidabilityFlags {
        DecidabilityFlags {
            self_reference: self.self_reference.is_match(text),
            unbounded_loop: self.unbounded_loop.is_match(text),
            paradox: self.paradox.is_match(text),
            halting: self.halting.is_match(text),
        }
    }

    /// Classify a claim.
    ///
    /// Paradox, or self-reference together with halting, is undecidable.
    /// Loops or halting alone are decidable but expensive; short claims
    /// with no flag are P and everything else NP.
    pub fn assess(&self, claim: &str) -> DecidabilityAssessment {
        let claim = claim.trim();
        let flags = self.flags(claim);
        let (decidable, complexity_class, reason) =
            if flags.paradox || (flags.self_reference && flags.halting) {
                (
                    false,
                    ComplexityClass::Undecidable,
                    "self-reference or paradox indicates undecidability",
                )
            } else if flags.unbounded_loop || flags.halting {
                (
                    true,
                    ComplexityClass::Exptime,
                    "potentially intractable, treated as high complexity",
                )
            } else if !claim.is_empty() && claim.len() < SIMPLE_CLAIM_LEN && !flags.any() {
                (true, ComplexityClass::P, "simple bounded claim")
            } else {
                (true, ComplexityClass::Np, "complex claim, no paradox detected")
            };
        DecidabilityAssessment {
            decidable,
            complexity_class,
            confidence: flags.confidence(),
            flags,
            reason: reason.to_string(),
        }
    }

    /// Refusal line for a hypothesis that cannot be decided.
    pub fn refuse(&self, hypothesis: &Hypothesis) -> Option<String> {
        let assessment = self.assess(&hypothesis.claim);
        (!assessment.decidable).then(|| {
            format!(
                "decidability: {} (confidence {}): {}",
                assessment.complexity_class, assessment.confidence, assessment.reason
            )
        })
    }
}
