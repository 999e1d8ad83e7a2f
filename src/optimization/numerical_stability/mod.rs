//! numerical_stability — guarded transforms shared by models and inference.
//!
//! Purpose
//! -------
//! Keep every overflow-prone expression in one place: softplus maps for
//! positive parameters, the logistic derivative used by the delta method,
//! and max-shifted log-sum-exp reductions used by every choice probability.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are finite except for `-∞`, which marks an unavailable
//!   alternative in utility rows and is propagated, never turned into NaN.
//! - Functions are pure; no logging, no allocation beyond what `ndarray`
//!   iteration needs.
//!
//! Downstream usage
//! ----------------
//! - `models::conditional_logit` and `models::nested_logit` normalize
//!   utilities with [`log_softmax_inplace`] / [`log_sum_exp`].
//! - `models::nested_logit` maps dissimilarity parameters through
//!   [`safe_softplus`] and reports them via [`safe_logistic`].
//! - `inference::hessian` truncates eigenvalues at [`EIGEN_EPS`].

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    EIGEN_EPS, GENERAL_TOL, log_softmax_inplace, log_sum_exp, safe_logistic, safe_softplus,
    safe_softplus_inv,
};

pub mod prelude {
    pub use super::transformations::{
        EIGEN_EPS, log_softmax_inplace, log_sum_exp, safe_logistic, safe_softplus,
        safe_softplus_inv,
    };
}
