//! inference — standard errors and coefficient reports for fitted models.
//!
//! Purpose
//! -------
//! Quantify uncertainty after a fit. The observed information is the
//! finite-difference Hessian of the summed negative log-likelihood; its
//! pseudoinverse gives classical covariances, and a score covariance turns
//! it into a robust or clustered sandwich.
//!
//! Key behaviors
//! -------------
//! - [`calc_covariance`] / [`calc_standard_errors`]: `J⁺` or `J⁺ S J⁺`.
//! - [`CovarianceType`] and [`score_covariance`]: build `S` from
//!   per-observation scores.
//! - [`CoefficientReport`]: estimates, standard errors, z-values and
//!   p-values, rendered as markdown or CSV.
//!
//! Invariants & assumptions
//! ------------------------
//! - Hessians and scores share the summed log-likelihood scale.
//! - Everything is expressed in the optimizer's θ; models map selected
//!   entries to a natural scale before reporting.
//!
//! Conventions
//! -----------
//! - No logging here; failures are [`InferenceError`] values.
//!
//! Testing notes
//! -------------
//! - Unit tests use quadratics with known information and hand-computed
//!   score sums; the integration test checks standard errors of a fitted
//!   conditional logit.

pub mod errors;
pub mod hessian;
pub mod report;
pub mod scores;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{InferenceError, InferenceResult};
pub use self::hessian::{calc_covariance, calc_standard_errors, standard_errors};
pub use self::report::{CoefficientReport, CoefficientRow, TrainingSummary};
pub use self::scores::{CovarianceType, score_covariance};

pub mod prelude {
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::hessian::{calc_covariance, calc_standard_errors};
    pub use super::report::CoefficientReport;
    pub use super::scores::CovarianceType;
}
