//! Shared surface of fitted choice models.
use crate::{
    models::errors::ModelResult,
    optimization::loglik_optimizer::{LogLikelihood, Theta},
};
use ndarray::{Array1, Array2};

/// A choice model the training loop and the inference layer can drive.
///
/// The log-likelihood itself comes from [`LogLikelihood`]; this trait adds
/// parameter bookkeeping and what standard errors need.
pub trait ChoiceModel: LogLikelihood + Clone {
    /// Length of θ.
    fn num_params(&self) -> usize;

    /// Current parameters (θ̂ after a fit).
    fn theta(&self) -> &Theta;

    /// Replace the current parameters.
    ///
    /// # Errors
    /// `ThetaLengthMismatch` / `InvalidThetaInput`.
    fn set_theta(&mut self, theta: Theta) -> ModelResult<()>;

    /// Starting point for optimization.
    fn initial_theta(&self) -> Theta;

    /// One label per entry of θ, in order.
    fn coefficient_labels(&self) -> Vec<String>;

    /// Per-observation gradients of `ℓ_n(θ)`, shape `(len, num_params)`.
    fn scores(&self, theta: &Theta, data: &Self::Data) -> ModelResult<Array2<f64>>;

    /// Map estimates and standard errors from θ to the reported scale.
    ///
    /// Identity unless the model reparameterizes some entries.
    fn natural_scale(&self, theta: &Theta, se: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        (theta.clone(), se.clone())
    }
}
