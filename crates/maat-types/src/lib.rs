#![deny(unsafe_code)]
//! # maat-types
//!
//! Shared vocabulary of the MAAT decision core: observations, hypotheses,
//! the three test statistics, per-hemisphere gate thresholds, decisions,
//! receipts and the records appended to a ledger.
//!
//! ## Invariants
//!
//! - Conservative thresholds are at least as strict as exploratory ones on
//!   every dimension ([`check_strictness`]).
//! - Every record is content-addressed: its id and unique key hash are
//!   derived from its canonical JSON, never from a clock or a random source.

pub mod decision;
pub mod error;
pub mod hash;
pub mod hypothesis;
pub mod observation;
pub mod record;
pub mod thresholds;

pub use decision::{Decision, Evidence, Receipt, ReceiptStatus, TestStatistics, Verdict};
pub use error::TypesError;
pub use hash::{canonical_json, ContentHash};
pub use hypothesis::{CausalLink, HemisphereKind, Hypothesis, HypothesisId};
pub use observation::{FieldValue, Observation, ObservationId, ObservationOrigin};
pub use record::{LedgerRecord, RecordKind};
pub use thresholds::{check_strictness, GateDimension, GateThresholds};
