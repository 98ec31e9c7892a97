use maat_engine::{EngineError, PolicyError};
use maat_types::TypesError;
use thiserror::Error;

/// Errors from building or driving the recursive loop.
///
/// SCRAM is not an error; it is reported as a cycle status.
#[derive(Error, Debug)]
pub enum ReactorError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid thresholds: {0}")]
    Thresholds(TypesError),

    #[error("engine failure: {0}")]
    Engine(#[from] EngineError),

    #[error("policy failure: {0}")]
    Policy(#[from] PolicyError),

    #[error("observation construction failed: {0}")]
    Record(#[from] TypesError),

    #[error("state I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
