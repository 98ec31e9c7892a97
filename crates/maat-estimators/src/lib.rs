#![deny(unsafe_code)]
//! # maat-estimators
//!
//! Reference estimators for the three test statistics:
//!
//! - **Posterior mean**: Beta-Bernoulli update over "sample above the
//!   window mean" events ([`bayes`]).
//! - **Coherence ratio**: DFT peak-to-mean magnitude of the detrended
//!   window ([`coherence`]).
//! - **MDL delta bits**: Gaussian code length of a fitted model plus a
//!   BIC-style parameter penalty, minus the constant-mean null ([`mdl`]).
//!
//! [`multiscale`] adds a Haar wavelet energy map used to spot series that
//! look alike across scales.
//!
//! [`EstimatorSuite`] bundles one estimator per statistic behind the
//! [`Estimator`] trait and validates their outputs, so a misbehaving
//! estimator surfaces as an [`EstimatorError`] instead of a bogus verdict.

pub mod bayes;
pub mod coherence;
pub mod error;
pub mod fit;
pub mod mdl;
pub mod multiscale;
pub mod suite;

pub use bayes::{beta_bernoulli, BetaPosterior, PosteriorEstimator};
pub use coherence::{coherence_score, fft_peak_mean, CoherenceEstimator};
pub use error::EstimatorError;
pub use fit::{linear_fit, mean, LinearFit};
pub use mdl::{mdl_delta_bits, MdlEstimator, MdlModel};
pub use multiscale::{
    haar_dwt, scale_energy, scale_invariant_levels, ScaleEnergy, ScalePattern,
};
pub use suite::{Estimator, EstimatorSuite, Measurement};
