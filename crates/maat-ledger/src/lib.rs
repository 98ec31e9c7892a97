#![deny(unsafe_code)]
//! # maat-ledger
//!
//! Append-only persistence for the records the decision core produces.
//! The core writes each record once, in production order, through
//! [`LedgerSink`] and never reads it back within a run.
//!
//! - [`MemoryLedger`] keeps records in memory with filtered queries.
//! - [`JsonlLedger`] appends one canonical JSON line per record, each
//!   carrying its unique key hash (`ukh`).

pub mod error;
pub mod jsonl;
pub mod memory;
pub mod sink;

pub use error::LedgerError;
pub use jsonl::{read_jsonl, JsonlLedger};
pub use memory::{LedgerEntry, LedgerFilter, MemoryLedger};
pub use sink::{LedgerSink, NullLedger};
