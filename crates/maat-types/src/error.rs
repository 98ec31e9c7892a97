use thiserror::Error;

use crate::thresholds::GateDimension;

/// Errors raised while building or hashing records.
#[derive(Error, Debug)]
pub enum TypesError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid hex length: {0} (expected 64)")]
    InvalidHashLength(usize),

    #[error("invalid hex character")]
    InvalidHex,

    #[error("threshold {dimension} is not finite: {value}")]
    NonFiniteThreshold { dimension: GateDimension, value: f64 },

    #[error(
        "conservative {dimension} threshold {conservative} is looser than exploratory {exploratory}"
    )]
    StrictnessViolation {
        dimension: GateDimension,
        exploratory: f64,
        conservative: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictness_violation_message_names_dimension() {
        let err = TypesError::StrictnessViolation {
            dimension: GateDimension::Coherence,
            exploratory: 7.5,
            conservative: 6.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("coherence"));
        assert!(msg.contains("7.5"));
    }

    #[test]
    fn hash_length_display() {
        assert_eq!(
            TypesError::InvalidHashLength(3).to_string(),
            "invalid hex length: 3 (expected 64)"
        );
    }
}
