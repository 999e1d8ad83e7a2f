//! loglik_optimizer — argmin-backed maximum likelihood for choice models.
//!
//! Purpose
//! -------
//! Fit any model that can report a summed log-likelihood `ℓ(θ)` by running
//! L-BFGS on `c(θ) = -ℓ(θ)`. Choice models implement [`LogLikelihood`] and
//! call [`maximize`]; everything argmin-specific stays in this module.
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] flips signs and falls back to finite
//!   differences when a model has no analytic gradient.
//! - [`builders`] choose More–Thuente or Hager–Zhang line search and apply
//!   tolerances; [`run::run_lbfgs`] drives the executor.
//! - [`finite_diff`] also serves the inference layer, which needs Hessians
//!   of the fitted log-likelihood.
//!
//! Invariants & assumptions
//! ------------------------
//! - Models return `ℓ` and `∇ℓ`, never the cost.
//! - Model failures are [`OptError`](crate::optimization::errors::OptError)
//!   values; they travel through argmin and are recovered intact.
//! - [`OptimOutcome::value`] is the summed log-likelihood at θ̂.
//!
//! Conventions
//! -----------
//! - θ is unconstrained. Constrained quantities such as nest dissimilarity
//!   parameters are reparameterized by the model.
//!
//! Testing notes
//! -------------
//! - Unit tests sit next to each submodule; `api` fits a binary share
//!   model with a closed-form MLE.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::finite_diff::compute_hessian;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};
pub use self::validation::validate_theta;

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
