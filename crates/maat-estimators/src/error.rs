use thiserror::Error;

/// Errors from estimator evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimatorError {
    #[error("window sample {index} is not finite")]
    NonFiniteInput { index: usize },

    #[error("{estimator} produced a non-finite value")]
    NonFinite { estimator: &'static str },

    #[error("{estimator} value {value} outside [{min}, {max}]")]
    OutOfRange {
        estimator: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{estimator} failed: {message}")]
    Failed {
        estimator: &'static str,
        message: String,
    },
}
