//! rust_choice — conditional and nested logit models fitted by maximum likelihood.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and, with the `python-bindings`
//! feature, as the PyO3 bridge exposing the conditional logit to Python via
//! the `_rust_choice` extension module.
//!
//! Key behaviors
//! -------------
//! - [`data`]: validated choice datasets, joint datasets, batching and
//!   long-table pivoting.
//! - [`models`]: utility specifications, the conditional logit and the
//!   nested logit.
//! - [`optimization`]: argmin L-BFGS driver, Adam, numerically stable
//!   transforms.
//! - [`inference`]: Hessian-based covariances and coefficient reports.
//! - [`training`]: the one-call `run` helper.
//!
//! Invariants & assumptions
//! ------------------------
//! - Heavy numerical work lives in the inner modules; the PyO3 items below
//!   only convert inputs, dispatch, and map errors.
//!
//! Conventions
//! -----------
//! - Python classes live under `_rust_choice.models` and are registered in
//!   `sys.modules` so dotted imports work.
//! - Errors from core code convert to `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Rust callers use the inner modules directly and can ignore everything
//!   guarded by `python-bindings`.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and by
//!   `tests/integration_choice_pipeline.rs`.

pub mod data;
pub mod inference;
pub mod models;
pub mod optimization;
pub mod training;
pub mod utils;

#[cfg(feature = "python-bindings")]
use std::collections::BTreeMap;

#[cfg(feature = "python-bindings")]
use pyo3::{
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    models::{ChoiceModel, ConditionalLogitModel, ModelError},
    optimization::loglik_optimizer::OptimOutcome,
    training::{RunOptions, TrainingAlgorithm, run},
    utils::{build_choice_dataset, extract_covariance, extract_mle_opts},
};

/// ConditionalLogit — Python-facing wrapper for [`ConditionalLogitModel`].
///
/// Constructed as
/// `ConditionalLogit(coef_variation, num_param, num_items, num_users=None)`
/// where `coef_variation` is a list of `(name, variation)` pairs and
/// `num_param` maps feature names to their widths. Data arguments of `fit`,
/// `run` and `predict_proba` are the labels, a dict of feature arrays, and
/// optional session/user indices and availability mask.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_choice.models", unsendable)]
pub struct ConditionalLogit {
    pub inner: ConditionalLogitModel,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl ConditionalLogit {
    #[new]
    #[pyo3(
        signature = (coef_variation, num_param, num_items, num_users = None),
        text_signature = "(coef_variation, num_param, num_items, /, num_users=None)"
    )]
    pub fn new(
        coef_variation: Vec<(String, String)>, num_param: BTreeMap<String, usize>,
        num_items: usize, num_users: Option<usize>,
    ) -> PyResult<Self> {
        let pairs: Vec<(&str, &str)> =
            coef_variation.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect();
        let inner = ConditionalLogitModel::from_dicts(&pairs, &num_param, num_items, num_users)?;
        Ok(ConditionalLogit { inner })
    }

    #[pyo3(
        signature = (
            labels,
            features = None,
            session_index = None,
            user_index = None,
            item_availability = None,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
        ),
        text_signature = "(self, labels, /, features=None, session_index=None, user_index=None, \
                          item_availability=None, tol_grad=None, tol_cost=None, max_iter=None, \
                          line_searcher=None, lbfgs_mem=None)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn fit<'py>(
        &mut self, labels: &Bound<'py, PyAny>, features: Option<&Bound<'py, PyDict>>,
        session_index: Option<&Bound<'py, PyAny>>, user_index: Option<&Bound<'py, PyAny>>,
        item_availability: Option<&Bound<'py, PyAny>>, tol_grad: Option<f64>,
        tol_cost: Option<f64>, max_iter: Option<usize>, line_searcher: Option<&str>,
        lbfgs_mem: Option<usize>,
    ) -> PyResult<ChoiceOptimOutcome> {
        let data = build_choice_dataset(
            labels,
            features,
            self.inner.num_items(),
            session_index,
            user_index,
            item_availability,
        )?;
        let opts = extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem)?;
        let outcome = self.inner.fit(&data, &opts)?;
        Ok(ChoiceOptimOutcome { inner: outcome.clone() })
    }

    /// Train with the run helper and return the coefficient report as text.
    #[pyo3(
        signature = (
            labels,
            features = None,
            session_index = None,
            user_index = None,
            item_availability = None,
            batch_size = None,
            learning_rate = 0.01,
            num_epochs = 5000,
            algorithm = "adam",
            covariance = None,
            clusters = None,
            seed = None,
        ),
        text_signature = "(self, labels, /, features=None, session_index=None, user_index=None, \
                          item_availability=None, batch_size=None, learning_rate=0.01, \
                          num_epochs=5000, algorithm='adam', covariance='classical', \
                          clusters=None, seed=None)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn run<'py>(
        &mut self, labels: &Bound<'py, PyAny>, features: Option<&Bound<'py, PyDict>>,
        session_index: Option<&Bound<'py, PyAny>>, user_index: Option<&Bound<'py, PyAny>>,
        item_availability: Option<&Bound<'py, PyAny>>, batch_size: Option<usize>,
        learning_rate: f64, num_epochs: usize, algorithm: &str, covariance: Option<&str>,
        clusters: Option<&Bound<'py, PyAny>>, seed: Option<u64>,
    ) -> PyResult<String> {
        let data = build_choice_dataset(
            labels,
            features,
            self.inner.num_items(),
            session_index,
            user_index,
            item_availability,
        )?;
        let algorithm: TrainingAlgorithm = algorithm.parse()?;
        let opts = RunOptions::new(
            batch_size,
            learning_rate,
            num_epochs,
            true,
            seed,
            algorithm,
            extract_covariance(covariance, clusters)?,
        )?;
        let outcome = run(&self.inner, &data, &opts)?;
        self.inner = outcome.model;
        Ok(outcome.report.to_string())
    }

    #[pyo3(
        signature = (
            labels,
            features = None,
            session_index = None,
            user_index = None,
            item_availability = None,
        ),
        text_signature = "(self, labels, /, features=None, session_index=None, user_index=None, \
                          item_availability=None)"
    )]
    pub fn predict_proba<'py>(
        &self, labels: &Bound<'py, PyAny>, features: Option<&Bound<'py, PyDict>>,
        session_index: Option<&Bound<'py, PyAny>>, user_index: Option<&Bound<'py, PyAny>>,
        item_availability: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Vec<Vec<f64>>> {
        let data = build_choice_dataset(
            labels,
            features,
            self.inner.num_items(),
            session_index,
            user_index,
            item_availability,
        )?;
        let proba = self.inner.predict_proba(&data)?;
        Ok(proba.outer_iter().map(|row| row.to_vec()).collect())
    }

    #[getter]
    pub fn theta(&self) -> Vec<f64> {
        self.inner.theta().to_vec()
    }

    #[getter]
    pub fn coefficient_labels(&self) -> Vec<String> {
        self.inner.coefficient_labels()
    }

    #[getter]
    pub fn results(&self) -> PyResult<ChoiceOptimOutcome> {
        match self.inner.outcome() {
            Ok(outcome) => Ok(ChoiceOptimOutcome { inner: outcome.clone() }),
            Err(_) => Err(ModelError::ModelNotFitted.into()),
        }
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// ChoiceOptimOutcome — read-only view of an L-BFGS [`OptimOutcome`].
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_choice.models")]
pub struct ChoiceOptimOutcome {
    pub inner: OptimOutcome,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl ChoiceOptimOutcome {
    #[getter]
    pub fn theta_hat(&self) -> Vec<f64> {
        self.inner.theta_hat.to_vec()
    }

    #[getter]
    pub fn value(&self) -> f64 {
        self.inner.value
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.converged
    }

    #[getter]
    pub fn status(&self) -> String {
        self.inner.status.clone()
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.iterations
    }

    #[getter]
    pub fn grad_norm(&self) -> Option<f64> {
        self.inner.grad_norm
    }

    #[getter]
    pub fn fn_evals(&self) -> Vec<(String, u64)> {
        self.inner.fn_evals.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }
}

/// Module initializer for the `_rust_choice` extension.
///
/// Creates the `models` submodule, attaches it to the parent and registers
/// it in `sys.modules` as `rust_choice.models`.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_choice<'py>(py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let models_mod = PyModule::new(py, "models")?;
    models(py, m, &models_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    py.import("sys")?.getattr("modules")?.set_item("rust_choice.models", models_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn models<'py>(
    _py: Python, rust_choice: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<ConditionalLogit>()?;
    m.add_class::<ChoiceOptimOutcome>()?;
    rust_choice.add_submodule(m)?;
    Ok(())
}
