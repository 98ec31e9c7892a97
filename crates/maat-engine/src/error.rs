use maat_ledger::LedgerError;
use maat_types::TypesError;
use thiserror::Error;

/// Errors that abort a hemisphere cycle or a state operation.
///
/// Per-hypothesis failures never surface here; they become rejected
/// decisions.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("ledger write failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("record construction failed: {0}")]
    Record(#[from] TypesError),

    #[error("invalid thresholds: {0}")]
    InvalidThresholds(TypesError),

    #[error("state I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("claim pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors from hypothesis sources.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("hypothesis source unavailable: {0}")]
    Unavailable(String),

    #[error("text provider failed: {0}")]
    Provider(String),

    #[error("could not read hypothesis script: {0}")]
    Io(#[from] std::io::Error),

    #[error("hypothesis construction failed: {0}")]
    Record(#[from] TypesError),
}

/// Errors from the threshold policy and its guard.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("proposal rejected: {0}")]
    StrictnessViolation(TypesError),

    #[error("policy state I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("policy state serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
