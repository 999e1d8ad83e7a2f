//! optimization::adam — first-order updates for mini-batch training.
//!
//! Purpose
//! -------
//! Provide the Adam update used by the training loop when the log-likelihood
//! is optimized over mini-batches rather than by full-batch L-BFGS.
//!
//! Key behaviors
//! -------------
//! - [`AdamOptions`] validates the learning rate, decay rates and the
//!   denominator guard once.
//! - [`Adam::step`] applies one bias-corrected update in place:
//!   `m ← β₁m + (1-β₁)g`, `v ← β₂v + (1-β₂)g²`,
//!   `θ ← θ - lr_t · m / (√v + ε)` with `lr_t = lr·√(1-β₂ᵗ)/(1-β₁ᵗ)`.
//!
//! Conventions
//! -----------
//! - `step` receives the gradient of the quantity being *minimized*, i.e.
//!   the negative mean log-likelihood of the batch.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta, validation::validate_grad},
};
use ndarray::Zip;

/// Hyper-parameters for [`Adam`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamOptions {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl AdamOptions {
    /// Validated constructor.
    ///
    /// # Errors
    /// - [`OptError::InvalidLearningRate`] unless `learning_rate` is finite
    ///   and positive.
    /// - [`OptError::InvalidBeta`] unless each decay rate lies in `[0, 1)`.
    /// - [`OptError::InvalidEpsilon`] unless `epsilon` is finite and positive.
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> OptResult<Self> {
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(OptError::InvalidLearningRate { value: learning_rate });
        }
        for (name, value) in [("beta1", beta1), ("beta2", beta2)] {
            if !(0.0..1.0).contains(&value) {
                return Err(OptError::InvalidBeta { name, value });
            }
        }
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(OptError::InvalidEpsilon { value: epsilon });
        }
        Ok(Self { learning_rate, beta1, beta2, epsilon })
    }

    /// Default decay rates (0.9, 0.999) and ε = 1e-8 with a custom rate.
    ///
    /// # Errors
    /// [`OptError::InvalidLearningRate`].
    pub fn with_learning_rate(learning_rate: f64) -> OptResult<Self> {
        Self::new(learning_rate, 0.9, 0.999, 1e-8)
    }
}

impl Default for AdamOptions {
    fn default() -> Self {
        Self { learning_rate: 0.01, beta1: 0.9, beta2: 0.999, epsilon: 1e-8 }
    }
}

/// Moment estimates and step counter for one parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Adam {
    opts: AdamOptions,
    m: Theta,
    v: Theta,
    t: u64,
}

impl Adam {
    pub fn new(opts: AdamOptions, dim: usize) -> Self {
        Self { opts, m: Theta::zeros(dim), v: Theta::zeros(dim), t: 0 }
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> u64 {
        self.t
    }

    pub fn options(&self) -> &AdamOptions {
        &self.opts
    }

    /// Apply one update to `theta` given the gradient of the loss.
    ///
    /// # Errors
    /// - `GradientDimMismatch` / `InvalidGradient` when `grad` does not fit
    ///   this optimizer or is not finite. State is left untouched.
    pub fn step(&mut self, theta: &mut Theta, grad: &Grad) -> OptResult<()> {
        validate_grad(grad, self.m.len())?;
        if theta.len() != self.m.len() {
            return Err(OptError::ThetaLengthMismatch {
                expected: self.m.len(),
                actual: theta.len(),
            });
        }
        self.t += 1;
        let AdamOptions { learning_rate, beta1, beta2, epsilon } = self.opts;
        let t = self.t as i32;
        let lr_t = learning_rate * (1.0 - beta2.powi(t)).sqrt() / (1.0 - beta1.powi(t));
        Zip::from(theta).and(&mut self.m).and(&mut self.v).and(grad).for_each(|th, m, v, &g| {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            *th -= lr_t * *m / (v.sqrt() + epsilon);
        });
        Ok(())
    }
}
