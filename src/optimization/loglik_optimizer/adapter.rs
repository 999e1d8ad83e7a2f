//! Bridge from a [`LogLikelihood`] to argmin's `CostFunction` + `Gradient`.
//!
//! argmin minimizes, so the adapter exposes `c(θ) = -ℓ(θ)` and `-∇ℓ(θ)`.
//! Models without an analytic gradient get a finite-difference gradient of
//! the cost itself, which needs no sign flip.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::fd_gradient,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};

/// A model and the data it is fitted on, seen as an argmin problem.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// `-ℓ(θ)`; a non-finite log-likelihood is an error, not a cost.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// `-∇ℓ(θ)` when the model has one, otherwise a finite-difference
    /// gradient of [`cost`](CostFunction::cost).
    ///
    /// # Errors
    /// - Any model error other than `GradientNotImplemented`.
    /// - Errors raised by cost evaluations during differencing.
    /// - Validation errors for a mis-sized or non-finite gradient.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                Ok(fd_gradient(theta, &cost_func, &closure_err)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sign flips between log-likelihood and cost.
    // - The finite-difference fallback for models without `grad`.
    // - Rejection of non-finite log-likelihood values.
    // -------------------------------------------------------------------------

    /// Binary logit with a single slope and no data: ℓ(θ) = ln σ(θ).
    struct Logit;

    impl LogLikelihood for Logit {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            Ok(-(-theta[0]).exp().ln_1p())
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    /// Same model with an analytic gradient 1 - σ(θ).
    struct LogitWithGrad;

    impl LogLikelihood for LogitWithGrad {
        type Data = ();

        fn value(&self, theta: &Theta, data: &()) -> OptResult<f64> {
            Logit.value(theta, data)
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            Ok(array![1.0 - 1.0 / (1.0 + (-theta[0]).exp())])
        }
    }

    /// Always returns `-∞`.
    struct Degenerate;

    impl LogLikelihood for Degenerate {
        type Data = ();

        fn value(&self, _: &Theta, _: &()) -> OptResult<f64> {
            Ok(f64::NEG_INFINITY)
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Check the analytic and finite-difference paths agree on `-∇ℓ`.
    //
    // Given
    // -----
    // - `Logit` (no gradient) and `LogitWithGrad` at θ = 0.4.
    //
    // Expect
    // ------
    // - Cost is `-ℓ`; both gradients equal σ(θ) - 1.
    fn gradient_paths_agree_and_flip_sign() {
        // Arrange
        let theta = array![0.4];
        let fd = ArgMinAdapter::new(&Logit, &());
        let analytic = ArgMinAdapter::new(&LogitWithGrad, &());
        let expected = 1.0 / (1.0 + (-0.4_f64).exp()) - 1.0;

        // Act
        let cost = fd.cost(&theta).expect("finite cost");
        let g_fd = fd.gradient(&theta).expect("fd gradient");
        let g_an = analytic.gradient(&theta).expect("analytic gradient");

        // Assert
        assert_abs_diff_eq!(cost, (-0.4_f64).exp().ln_1p(), epsilon = 1e-12);
        assert_abs_diff_eq!(g_an[0], expected, epsilon = 1e-12);
        assert_abs_diff_eq!(g_fd[0], expected, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a non-finite log-likelihood becomes `NonFiniteCost`.
    //
    // Given
    // -----
    // - `Degenerate`, whose value is `-∞`.
    //
    // Expect
    // ------
    // - `cost` fails and converts back to `OptError::NonFiniteCost`.
    fn cost_rejects_non_finite_values() {
        // Arrange
        let adapter = ArgMinAdapter::new(&Degenerate, &());

        // Act
        let err = adapter.cost(&array![0.0]).expect_err("non-finite value");

        // Assert
        assert!(matches!(OptError::from(err), OptError::NonFiniteCost { .. }));
    }
}
