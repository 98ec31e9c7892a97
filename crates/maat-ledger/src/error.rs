use maat_types::{ContentHash, TypesError};
use thiserror::Error;

/// Errors from ledger sinks.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record could not be canonicalized: {0}")]
    Record(#[from] TypesError),

    #[error("duplicate record: {0}")]
    DuplicateEntry(ContentHash),

    #[error("malformed ledger line {line}: {message}")]
    Malformed { line: usize, message: String },
}
