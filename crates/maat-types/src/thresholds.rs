use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// One of the three gate dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDimension {
    Bayes,
    Coherence,
    Mdl,
}

impl fmt::Display for GateDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateDimension::Bayes => write!(f, "bayes"),
            GateDimension::Coherence => write!(f, "coherence"),
            GateDimension::Mdl => write!(f, "mdl"),
        }
    }
}

/// Gate thresholds held by one hemisphere.
///
/// A hypothesis passes a gate when `posterior_mean >= bayes`,
/// `coherence_ratio >= coherence` and `mdl_delta_bits <= mdl` respectively.
/// Raising `bayes` or `coherence`, or lowering `mdl`, makes a set stricter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateThresholds {
    /// Minimum posterior mean.
    pub bayes: f64,
    /// Minimum coherence peak-to-mean ratio.
    pub coherence: f64,
    /// Maximum MDL delta in bits (negative means better compression).
    pub mdl: f64,
}

impl GateThresholds {
    pub fn new(bayes: f64, coherence: f64, mdl: f64) -> Self {
        Self {
            bayes,
            coherence,
            mdl,
        }
    }

    /// Exploratory defaults: looser, admits candidates for a second look.
    pub fn exploratory() -> Self {
        Self::new(0.80, 7.5, -8.0)
    }

    /// Conservative defaults: acceptance here is terminal.
    pub fn conservative() -> Self {
        Self::new(0.95, 8.5, -16.0)
    }

    /// True when `self` is at least as strict as `other` on every dimension.
    pub fn is_at_least_as_strict_as(&self, other: &GateThresholds) -> bool {
        self.bayes >= other.bayes && self.coherence >= other.coherence && self.mdl <= other.mdl
    }

    /// Reject non-finite components.
    pub fn validate(&self) -> Result<(), TypesError> {
        for (dimension, value) in [
            (GateDimension::Bayes, self.bayes),
            (GateDimension::Coherence, self.coherence),
            (GateDimension::Mdl, self.mdl),
        ] {
            if !value.is_finite() {
                return Err(TypesError::NonFiniteThreshold { dimension, value });
            }
        }
        Ok(())
    }
}

/// Verify that `conservative` is at least as strict as `exploratory`,
/// naming the first dimension that is not.
pub fn check_strictness(
    exploratory: &GateThresholds,
    conservative: &GateThresholds,
) -> Result<(), TypesError> {
    exploratory.validate()?;
    conservative.validate()?;
    if conservative.bayes < exploratory.bayes {
        return Err(TypesError::StrictnessViolation {
            dimension: GateDimension::Bayes,
            exploratory: exploratory.bayes,
            conservative: conservative.bayes,
        });
    }
    if conservative.coherence < exploratory.coherence {
        return Err(TypesError::StrictnessViolation {
            dimension: GateDimension::Coherence,
            exploratory: exploratory.coherence,
            conservative: conservative.coherence,
        });
    }
    if conservative.mdl > exploratory.mdl {
        return Err(TypesError::StrictnessViolation {
            dimension: GateDimension::Mdl,
            exploratory: exploratory.mdl,
            conservative: conservative.mdl,
        });
    }
    Ok(())
}
