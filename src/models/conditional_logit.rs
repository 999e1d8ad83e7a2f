//! models::conditional_logit — multinomial logit over a utility specification.
//!
//! Purpose
//! -------
//! Model the probability that observation `n` picks item `i` as
//! `P(i | n) = exp(U[n, i]) / Σ_{j available} exp(U[n, j])`, where `U` comes
//! from a [`UtilitySpec`], and fit the coefficients by maximum likelihood.
//!
//! Key behaviors
//! -------------
//! - Unavailable items get utility `-∞` and therefore zero probability.
//! - `ℓ(θ) = Σ_n log P(y_n | n)`; the analytic gradient pushes
//!   `e_{y_n} - P_n` back through every coefficient.
//! - [`ConditionalLogitModel::fit`] runs L-BFGS from the current θ and keeps
//!   θ̂ and the solver outcome on the model.
//!
//! Invariants & assumptions
//! ------------------------
//! - At least two items; θ has exactly `spec.num_params()` finite entries.
//! - A fresh model starts at θ = 0 (all items equally likely).
//!
//! Downstream usage
//! ----------------
//! - `training::run` fits it with Adam or L-BFGS through [`ChoiceModel`].
//! - `inference` reads [`ChoiceModel::scores`] for robust covariances.
//!
//! Testing notes
//! -------------
//! - Unit tests compare the analytic gradient with finite differences and
//!   check probabilities and availability masking by hand.
use crate::{
    data::ChoiceDataset,
    models::{
        errors::{ModelError, ModelResult},
        spec::UtilitySpec,
        traits::ChoiceModel,
    },
    optimization::{
        errors::OptResult,
        loglik_optimizer::{
            Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta, maximize, validate_theta,
        },
        numerical_stability::log_softmax_inplace,
    },
};
use ndarray::{Array1, Array2, Zip};
use std::{collections::BTreeMap, fmt};

/// Conditional (multinomial) logit model.
#[derive(Debug, Clone)]
pub struct ConditionalLogitModel {
    spec: UtilitySpec,
    theta: Theta,
    outcome: Option<OptimOutcome>,
}

impl ConditionalLogitModel {
    /// Model over `spec`, starting at θ = 0.
    ///
    /// # Errors
    /// [`ModelError::TooFewItems`] for fewer than two items.
    pub fn new(spec: UtilitySpec) -> ModelResult<Self> {
        if spec.num_items() < 2 {
            return Err(ModelError::TooFewItems { num_items: spec.num_items() });
        }
        let theta = Theta::zeros(spec.num_params());
        Ok(Self { spec, theta, outcome: None })
    }

    /// Build from coefficient → variation-name pairs and feature widths.
    ///
    /// # Errors
    /// Everything [`UtilitySpec::from_strs`] and [`ConditionalLogitModel::new`]
    /// return.
    pub fn from_dicts(
        coef_variations: &[(&str, &str)], num_params: &BTreeMap<String, usize>,
        num_items: usize, num_users: Option<usize>,
    ) -> ModelResult<Self> {
        Self::new(UtilitySpec::from_strs(coef_variations, num_params, num_items, num_users)?)
    }

    pub fn spec(&self) -> &UtilitySpec {
        &self.spec
    }

    pub fn num_items(&self) -> usize {
        self.spec.num_items()
    }

    /// Solver outcome of the last [`fit`](Self::fit).
    ///
    /// # Errors
    /// [`ModelError::ModelNotFitted`] before the first fit.
    pub fn outcome(&self) -> ModelResult<&OptimOutcome> {
        self.outcome.as_ref().ok_or(ModelError::ModelNotFitted)
    }

    /// Log-probabilities `(len, num_items)`; unavailable items are `-∞`.
    ///
    /// # Errors
    /// - [`ModelError::ThetaLengthMismatch`].
    /// - [`ModelError::NoAvailableItems`] for an observation with no
    ///   available item.
    /// - Data errors from feature expansion.
    pub fn log_probabilities(
        &self, theta: &Theta, data: &ChoiceDataset,
    ) -> ModelResult<Array2<f64>> {
        let mut log_p = self.spec.utility(theta.view(), data)?;
        if let Some(avail) = data.availability() {
            Zip::from(&mut log_p).and(&avail).for_each(|u, &ok| {
                if !ok {
                    *u = f64::NEG_INFINITY;
                }
            });
        }
        for (observation, row) in log_p.outer_iter_mut().enumerate() {
            if log_softmax_inplace(row) == f64::NEG_INFINITY {
                return Err(ModelError::NoAvailableItems { observation });
            }
        }
        Ok(log_p)
    }

    /// Choice probabilities at the current θ.
    ///
    /// # Errors
    /// As [`ConditionalLogitModel::log_probabilities`].
    pub fn predict_proba(&self, data: &ChoiceDataset) -> ModelResult<Array2<f64>> {
        Ok(self.log_probabilities(&self.theta, data)?.mapv(f64::exp))
    }

    /// `-ℓ(θ)` at the current θ, summed over observations.
    ///
    /// # Errors
    /// As [`ConditionalLogitModel::log_probabilities`].
    pub fn negative_log_likelihood(&self, data: &ChoiceDataset) -> ModelResult<f64> {
        Ok(-self.loglik(&self.theta, data)?)
    }

    /// Fit by L-BFGS starting from the current θ; θ̂ replaces θ.
    ///
    /// # Errors
    /// Any optimizer, model or data error.
    pub fn fit(&mut self, data: &ChoiceDataset, opts: &MLEOptions) -> OptResult<&OptimOutcome> {
        let outcome = maximize(&*self, self.theta.clone(), data, opts)?;
        self.theta = outcome.theta_hat.clone();
        let stored = self.outcome.insert(outcome);
        Ok(&*stored)
    }

    // ---- Helpers ----

    fn loglik(&self, theta: &Theta, data: &ChoiceDataset) -> ModelResult<f64> {
        let log_p = self.log_probabilities(theta, data)?;
        Ok(data.labels().iter().enumerate().map(|(n, &y)| log_p[[n, y]]).sum())
    }

    /// `∂ℓ_n/∂U[n, i] = 1{i = y_n} - P(i | n)`.
    fn utility_gradient(&self, theta: &Theta, data: &ChoiceDataset) -> ModelResult<Array2<f64>> {
        let mut d_utility = self.log_probabilities(theta, data)?.mapv(|lp| -lp.exp());
        for (n, &y) in data.labels().iter().enumerate() {
            d_utility[[n, y]] += 1.0;
        }
        Ok(d_utility)
    }
}

impl LogLikelihood for ConditionalLogitModel {
    type Data = ChoiceDataset;

    fn value(&self, theta: &Theta, data: &ChoiceDataset) -> OptResult<f64> {
        Ok(self.loglik(theta, data)?)
    }

    fn check(&self, theta: &Theta, data: &ChoiceDataset) -> OptResult<()> {
        validate_theta(theta, self.spec.num_params())?;
        self.spec.check_data(data)?;
        Ok(())
    }

    fn grad(&self, theta: &Theta, data: &ChoiceDataset) -> OptResult<Grad> {
        let d_utility = self.utility_gradient(theta, data)?;
        Ok(self.spec.backprop(d_utility.view(), data)?)
    }
}

impl ChoiceModel for ConditionalLogitModel {
    fn num_params(&self) -> usize {
        self.spec.num_params()
    }

    fn theta(&self) -> &Theta {
        &self.theta
    }

    fn set_theta(&mut self, theta: Theta) -> ModelResult<()> {
        check_theta(&theta, self.spec.num_params())?;
        self.theta = theta;
        Ok(())
    }

    fn initial_theta(&self) -> Theta {
        Theta::zeros(self.spec.num_params())
    }

    fn coefficient_labels(&self) -> Vec<String> {
        self.spec.labels()
    }

    fn scores(&self, theta: &Theta, data: &ChoiceDataset) -> ModelResult<Array2<f64>> {
        let d_utility = self.utility_gradient(theta, data)?;
        self.spec.scores(d_utility.view(), data)
    }
}

impl fmt::Display for ConditionalLogitModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ConditionalLogitModel(num_items={}, num_params={})",
            self.spec.num_items(),
            self.spec.num_params()
        )?;
        write!(f, "{}", self.spec)
    }
}

/// Length and finiteness check shared by the models' `set_theta`.
pub(crate) fn check_theta(theta: &Array1<f64>, expected: usize) -> ModelResult<()> {
    if theta.len() != expected {
        return Err(ModelError::ThetaLengthMismatch { expected, actual: theta.len() });
    }
    match theta.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ModelError::InvalidThetaInput { index, value: theta[index] }),
        None => Ok(()),
    }
}
