use maat_types::{ContentHash, LedgerRecord};

use crate::error::LedgerError;

/// Append-only, ordered record sink.
pub trait LedgerSink: Send {
    /// Append one record, returning its unique key hash.
    fn append(&mut self, record: &LedgerRecord) -> Result<ContentHash, LedgerError>;

    /// Push buffered records to durable storage.
    fn flush(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}

impl<S: LedgerSink + ?Sized> LedgerSink for Box<S> {
    fn append(&mut self, record: &LedgerRecord) -> Result<ContentHash, LedgerError> {
        (**self).append(record)
    }

    fn flush(&mut self) -> Result<(), LedgerError> {
        (**self).flush()
    }
}

/// Discards records; still hashes them so callers get real keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLedger;

impl LedgerSink for NullLedger {
    fn append(&mut self, record: &LedgerRecord) -> Result<ContentHash, LedgerError> {
        Ok(record.ukh()?)
    }
}
