//! optimization — fitting machinery for choice models.
//!
//! Purpose
//! -------
//! Turn a model's log-likelihood into estimates. Full-batch fits run
//! argmin's L-BFGS through [`loglik_optimizer`]; mini-batch training uses
//! the [`adam`] update. Both report failures through [`errors::OptError`].
//!
//! Key behaviors
//! -------------
//! - [`loglik_optimizer::maximize`] maximizes `ℓ(θ)` and returns an
//!   [`loglik_optimizer::OptimOutcome`].
//! - [`adam::Adam`] applies bias-corrected first-order steps to a flat θ.
//! - [`numerical_stability`] holds the guarded transforms used inside the
//!   likelihoods and by the inference layer.
//!
//! Invariants & assumptions
//! ------------------------
//! - θ is unconstrained; models reparameterize anything that is not.
//! - Failures are `OptError` values, never panics. Model and data errors
//!   raised inside a likelihood are carried as `OptError::Model`.
//!
//! Conventions
//! -----------
//! - User-facing values are log-likelihoods; only solvers see costs.
//! - Logging goes through the `log` facade at `debug`/`info` level and only
//!   when asked for (`MLEOptions::verbose`, the training loop).
//!
//! Testing notes
//! -------------
//! - Each submodule tests its own contract on closed-form toy problems.

pub mod adam;
pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::adam::{Adam, AdamOptions};
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
