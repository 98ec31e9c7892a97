#![deny(unsafe_code)]
//! # maat-engine
//!
//! The bicameral hemisphere engine. One [`HemispherePair`] owns an
//! exploratory and a conservative [`Hemisphere`]; each cycle it
//!
//! 1. asks a [`HypothesisSource`] for candidates,
//! 2. drops candidates the grounding rule, the optional
//!    [`DecidabilityGate`] or the optional [`CausalFilter`] refuses
//!    (recorded as blocked),
//! 3. measures the three statistics with an `EstimatorSuite` and judges
//!    them with the exploratory hemisphere's thresholds,
//! 4. hands every exploratory Accept straight to the conservative
//!    hemisphere (callosum transfer),
//! 5. writes each produced record to its ledger sink in production order.
//!
//! A failing estimator rejects only its own hypothesis. Threshold changes
//! come only from a [`ThresholdPolicy`] routed through a
//! [`ThresholdSchedule`], which enforces the cooldown and keeps the
//! conservative hemisphere at least as strict as the exploratory one.

pub mod causal;
pub mod controls;
pub mod decidability;
pub mod error;
pub mod hemisphere;
pub mod pair;
pub mod policy;
pub mod source;
pub mod stats;

pub use causal::{CausalFilter, CausalGraph, CausalStats};
pub use controls::{CycleControls, Grounding};
pub use decidability::{
    ComplexityClass, DecidabilityAssessment, DecidabilityFlags, DecidabilityGate,
};
pub use error::{EngineError, PolicyError, SourceError};
pub use hemisphere::Hemisphere;
pub use pair::{BlockedHypothesis, CycleOutput, HemispherePair};
pub use policy::{
    DecisionSummary, LearnedGatesConfig, LearnedGatesPolicy, PolicyHistory, ThresholdPolicy,
    ThresholdSchedule, ThresholdUpdate,
};
pub use source::{
    parse_claims, ExternalTextSource, FallbackSource, HypothesisSource, ProgrammaticSource,
    ScriptedText, TextProvider,
};
pub use stats::{EngineStats, VerdictCounts};
