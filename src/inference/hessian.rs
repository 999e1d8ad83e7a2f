//! inference::hessian — covariance and standard errors from observed information.
//!
//! Purpose
//! -------
//! Turn the observed information of a fitted choice model into a parameter
//! covariance matrix and standard errors. The information matrix `J(θ̂)` is
//! the Hessian of the summed negative log-likelihood, obtained by finite
//! differences of the model's analytic gradient.
//!
//! Key behaviors
//! -------------
//! - Call [`compute_hessian`] on the NLL gradient to obtain `J(θ̂)`.
//! - Copy `J(θ̂)` into a `nalgebra::DMatrix` (`fill_dmatrix`) and form the
//!   Moore–Penrose pseudoinverse `J⁺` from its symmetric eigendecomposition.
//! - Classical covariance is `J⁺`; with a score covariance `S` the sandwich
//!   `J⁺ S J⁺` is returned instead.
//!
//! Invariants & assumptions
//! ------------------------
//! - `J(θ̂)` is symmetrized upstream by [`compute_hessian`].
//! - Eigenvalues at most [`EIGEN_EPS`] are dropped, so weakly identified
//!   directions (for example a `-full` intercept) contribute nothing instead
//!   of exploding.
//! - `S`, when given, is `p × p` on the same summed scale as `J`.
//!
//! Conventions
//! -----------
//! - No explicit inverse is formed.
//! - Standard errors are square roots of the covariance diagonal, clamped at
//!   zero.
//!
//! Downstream usage
//! ----------------
//! - `training::run` calls [`calc_covariance`] after fitting, with `S` from
//!   `inference::scores` when robust errors are requested.
use crate::{
    inference::errors::{InferenceError, InferenceResult},
    optimization::{
        loglik_optimizer::{Grad, Hessian, Theta, compute_hessian},
        numerical_stability::EIGEN_EPS,
    },
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Parameter covariance at `theta_hat`.
///
/// Parameters
/// ----------
/// - `f`: gradient of the **summed negative** log-likelihood, `θ ↦ ∇c(θ)`.
/// - `theta_hat`: point at which the information is evaluated.
/// - `score_cov`: optional `p × p` score covariance `S`; `None` gives the
///   classical `J⁺`, `Some(S)` the sandwich `J⁺ S J⁺`.
///
/// # Errors
/// - [`InferenceError::Opt`] when the finite-difference Hessian is not
///   finite.
/// - [`InferenceError::ScoreShapeMismatch`] when `S` is not `p × p`.
pub fn calc_covariance<F: Fn(&Theta) -> Grad>(
    f: &F, theta_hat: &Theta, score_cov: Option<&Array2<f64>>,
) -> InferenceResult<Array2<f64>> {
    let n = theta_hat.len();
    if let Some(s) = score_cov {
        if s.dim() != (n, n) {
            return Err(InferenceError::ScoreShapeMismatch { expected: (n, n), found: s.dim() });
        }
    }
    let obs_info = compute_hessian(f, theta_hat)?;
    let mut obs_info_nalg = DMatrix::<f64>::zeros(n, n);
    fill_dmatrix(&obs_info, &mut obs_info_nalg);
    let pinv = pseudo_inverse(obs_info_nalg, n);
    match score_cov {
        Some(s) => Ok(pinv.dot(s).dot(&pinv)),
        None => Ok(pinv),
    }
}

/// Standard errors `sqrt(diag(cov))` at `theta_hat`.
///
/// # Errors
/// As [`calc_covariance`].
pub fn calc_standard_errors<F: Fn(&Theta) -> Grad>(
    f: &F, theta_hat: &Theta, score_cov: Option<&Array2<f64>>,
) -> InferenceResult<Array1<f64>> {
    let cov = calc_covariance(f, theta_hat, score_cov)?;
    Ok(standard_errors(&cov))
}

/// `sqrt(max(diag(cov), 0))`.
pub fn standard_errors(cov: &Array2<f64>) -> Array1<f64> {
    cov.diag().mapv(|v| v.max(0.0).sqrt())
}

// ---- Helper methods ----

/// Copy a square `ndarray` matrix into a preallocated `DMatrix`.
fn fill_dmatrix(obs_info: &Hessian, obs_info_nalg: &mut DMatrix<f64>) {
    let n = obs_info.ncols();
    for j in 0..n {
        for i in 0..n {
            obs_info_nalg[(i, j)] = obs_info[[i, j]];
        }
    }
}

/// `J⁺ = Σ_{k: λ_k > EIGEN_EPS} q_k q_kᵀ / λ_k` from `J = Q Λ Qᵀ`.
fn pseudo_inverse(obs_info_nalg: DMatrix<f64>, n: usize) -> Array2<f64> {
    let eigen_decomp = obs_info_nalg.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let mut pinv = Array2::<f64>::zeros((n, n));
    for (k, &lambda) in eigen_decomp.eigenvalues.iter().enumerate() {
        if lambda <= EIGEN_EPS {
            continue;
        }
        for i in 0..n {
            let coeff = q[(i, k)] / lambda;
            for j in 0..n {
                pinv[[i, j]] += coeff * q[(j, k)];
            }
        }
    }
    pinv
}
