#![deny(unsafe_code)]
//! # maat-gate
//!
//! The triple gate. Given three test statistics and one hemisphere's
//! thresholds it returns a verdict, an attention score and one reason per
//! gate.
//!
//! - **Accept**: Bayesian, coherence and MDL gates all pass.
//! - **Reject**: neither the Bayesian nor the coherence gate passes,
//!   whatever the MDL gate says.
//! - **Defer**: everything else.
//!
//! The verdict depends only on the statistics and thresholds. Attention is
//! reported alongside for prioritisation and never feeds the verdict.

pub mod attention;
pub mod evaluator;

pub use attention::{AttentionScorer, AttentionSignals, AttentionWeights, WeightedAttention};
pub use evaluator::{GateEvaluator, GatePasses, GateReport};
