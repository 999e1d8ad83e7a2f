//! loglik_optimizer::finite_diff — numerical derivatives around `θ`.
//!
//! Purpose
//! -------
//! Wrap `finitediff` so the optimizer and the inference layer can request
//! gradients and Hessians without touching its API, and so that failures
//! inside the differentiated closure come back as [`OptError`] values.
//!
//! Key behaviors
//! -------------
//! - [`fd_gradient`]: central differences first, forward differences when
//!   the central pass failed or produced a non-finite gradient.
//! - [`run_fd_diff`]: the forward-difference pass on its own.
//! - [`compute_hessian`]: differentiate a gradient function (central, then
//!   forward on failure) and symmetrize the result.
//!
//! Invariants & assumptions
//! ------------------------
//! - `finitediff` closures must return plain numbers, so callers record the
//!   first error in a `RefCell<Option<Error>>` and return `NaN`. Both
//!   gradient helpers clear that cell before use and surface its content.
//! - Every matrix or vector returned here has passed
//!   [`validate_grad`] / [`validate_hessian`].
//!
//! Downstream usage
//! ----------------
//! - `adapter` calls [`fd_gradient`] for models without analytic gradients.
//! - `inference::hessian` calls [`compute_hessian`] on the analytic
//!   log-likelihood gradient of a fitted choice model.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Central-difference gradient with a forward-difference retry.
///
/// `func` must store any evaluation error in `closure_err` and return `NaN`.
///
/// # Errors
/// - The error captured during the forward pass, converted to `OptError`.
/// - `GradientDimMismatch` / `InvalidGradient` if the forward pass still
///   yields an unusable gradient.
pub fn fd_gradient<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let central = theta.central_diff(func);
    if closure_err.borrow().is_none() && validate_grad(&central, theta.len()).is_ok() {
        return Ok(central);
    }
    run_fd_diff(theta, func, closure_err)
}

/// Forward-difference gradient with error capture and validation.
///
/// # Errors
/// - Any error `func` stored in `closure_err`.
/// - `GradientDimMismatch` / `InvalidGradient` from [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// Hessian of a scalar function from its gradient `f`.
///
/// Central differences are tried first; if the result is not a finite
/// `P × P` matrix the forward scheme is used and its validation error, if
/// any, is returned. The accepted matrix is symmetrized in place.
///
/// # Errors
/// - `HessianDimMismatch` / `InvalidHessian` from the forward pass.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut hess = theta.central_hessian(f);
    if validate_hessian(&hess, dim).is_err() {
        hess = theta.forward_hessian(f);
        validate_hessian(&hess, dim)?;
    }
    symmetrize_hess(&mut hess);
    Ok(hess)
}

// ---- Helper methods ----

/// Average each off-diagonal pair; the diagonal is untouched.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Central and forward gradients on smooth functions.
    // - Propagation of errors captured inside the differentiated closure.
    // - Hessians of a quadratic, the non-finite path and symmetrization.
    //
    // They intentionally DO NOT cover:
    // - Choice-model Hessians (see `inference::hessian`).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify `fd_gradient` matches the analytic gradient of a log-sum-exp.
    //
    // Given
    // -----
    // - f(θ) = ln(e^θ0 + e^θ1) at θ = (0.3, -0.7).
    //
    // Expect
    // ------
    // - The gradient equals the softmax of θ to ~1e-6.
    fn fd_gradient_matches_softmax() {
        // Arrange
        let theta = array![0.3, -0.7];
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |x: &Theta| x.mapv(f64::exp).sum().ln();
        let denom = theta.mapv(f64::exp).sum();

        // Act
        let grad = fd_gradient(&theta, &f, &closure_err).expect("smooth function");

        // Assert
        assert_abs_diff_eq!(grad[0], 0.3_f64.exp() / denom, epsilon = 1e-6);
        assert_abs_diff_eq!(grad[1], (-0.7_f64).exp() / denom, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Ensure an error recorded inside the closure is returned as `OptError`.
    //
    // Given
    // -----
    // - A closure that stores `OptError::NonFiniteCost` and returns NaN.
    //
    // Expect
    // ------
    // - `run_fd_diff` returns that exact error.
    fn run_fd_diff_returns_captured_error() {
        // Arrange
        let theta: Theta = Array1::from(vec![1.0_f64]);
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |_: &Theta| {
            closure_err.replace(Some(OptError::NonFiniteCost { value: f64::NAN }.into()));
            f64::NAN
        };

        // Act
        let err = run_fd_diff(&theta, &f, &closure_err).expect_err("closure failed");

        // Assert
        assert!(matches!(err, OptError::NonFiniteCost { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Confirm a NaN-valued objective without a captured error is rejected.
    //
    // Given
    // -----
    // - f(θ) = NaN everywhere.
    //
    // Expect
    // ------
    // - `OptError::InvalidGradient`.
    fn fd_gradient_rejects_nan_objective() {
        // Arrange
        let theta = array![0.0, 1.0];
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |_: &Theta| f64::NAN;

        // Act
        let err = fd_gradient(&theta, &f, &closure_err).expect_err("NaN gradient");

        // Assert
        assert!(matches!(err, OptError::InvalidGradient { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Check the Hessian of a coupled quadratic.
    //
    // Given
    // -----
    // - f(θ) = θ0² + θ0·θ1 + 2θ1², gradient (2θ0 + θ1, θ0 + 4θ1).
    //
    // Expect
    // ------
    // - H ≈ [[2, 1], [1, 4]] and exactly symmetric.
    fn compute_hessian_of_quadratic() {
        // Arrange
        let theta = array![1.0, -2.0];
        let grad_fn = |x: &Theta| array![2.0 * x[0] + x[1], x[0] + 4.0 * x[1]];

        // Act
        let hess = compute_hessian(&grad_fn, &theta).expect("finite Hessian");

        // Assert
        assert_abs_diff_eq!(hess[[0, 0]], 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hess[[0, 1]], 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hess[[1, 1]], 4.0, epsilon = 1e-5);
        assert_eq!(hess[[0, 1]], hess[[1, 0]]);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a NaN gradient function yields `InvalidHessian`.
    //
    // Given
    // -----
    // - A gradient function returning `[NaN]`.
    //
    // Expect
    // ------
    // - `OptError::InvalidHessian`.
    fn compute_hessian_rejects_nan() {
        // Arrange
        let theta = array![0.0];
        let grad_fn = |_: &Theta| array![f64::NAN];

        // Act
        let err = compute_hessian(&grad_fn, &theta).expect_err("NaN Hessian");

        // Assert
        assert!(matches!(err, OptError::InvalidHessian { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Verify symmetrization averages off-diagonal pairs only.
    //
    // Given
    // -----
    // - [[1, 2], [0, 3]].
    //
    // Expect
    // ------
    // - [[1, 1], [1, 3]].
    fn symmetrize_hess_averages_pairs() {
        // Arrange
        let mut h: Hessian =
            Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 0.0, 3.0]).expect("2x2 matrix");

        // Act
        symmetrize_hess(&mut h);

        // Assert
        assert_eq!(h, array![[1.0, 1.0], [1.0, 3.0]]);
    }
}
