//! training::run — fit a choice model and report its coefficients.
//!
//! Purpose
//! -------
//! One call that trains a copy of a model on a dataset, computes standard
//! errors at the estimate and produces a [`CoefficientReport`].
//!
//! Key behaviors
//! -------------
//! - The input model is cloned; the caller's model is never modified.
//! - Adam: every epoch walks the loader's batches, steps on the gradient of
//!   the batch's mean negative log-likelihood and records the epoch's mean
//!   log-likelihood (evaluated before each step). Progress is logged every
//!   `max(num_epochs / 10, 1)` epochs.
//! - L-BFGS: a single full-data `maximize` call.
//! - Standard errors come from the Hessian of the full-data NLL, optionally
//!   sandwiched with score covariances, and are reported on each model's
//!   natural scale.
//!
//! Conventions
//! -----------
//! - Logging uses `log::info!` for the received model and data, progress and
//!   the final report, and `log::debug!` for per-run details.
use crate::{
    data::{ChoiceData, create_data_loader},
    inference::{
        hessian::{calc_covariance, standard_errors},
        report::{CoefficientReport, TrainingSummary},
        scores::score_covariance,
    },
    models::traits::ChoiceModel,
    optimization::{
        adam::Adam,
        errors::OptError,
        loglik_optimizer::{OptimOutcome, Theta, maximize},
    },
    training::{
        errors::RunResult,
        options::{RunOptions, TrainingAlgorithm},
    },
};
use ndarray::Array2;
use std::{cell::RefCell, fmt};

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunOutcome<M> {
    /// Trained copy of the input model.
    pub model: M,
    pub report: CoefficientReport,
    /// Mean log-likelihood per observation of the last epoch (Adam) or at
    /// θ̂ (L-BFGS).
    pub final_mean_loglik: f64,
    /// Covariance of θ̂ in the optimizer's parameterization.
    pub covariance: Array2<f64>,
    /// Solver outcome when L-BFGS was used.
    pub lbfgs: Option<OptimOutcome>,
}

/// Train a copy of `model` on `data` and report its coefficients.
///
/// # Errors
/// - Invalid options ([`RunOptions`] validation).
/// - Model/data incompatibilities detected by `LogLikelihood::check`.
/// - Optimizer failures, and Hessian or score problems while computing
///   standard errors.
pub fn run<M>(model: &M, data: &M::Data, opts: &RunOptions) -> RunResult<RunOutcome<M>>
where
    M: ChoiceModel + fmt::Display,
    M::Data: ChoiceData + fmt::Display,
{
    opts.validate()?;
    let banner = "=".repeat(20);
    log::info!("{banner} received model {banner}\n{model}");
    log::info!("{banner} received dataset {banner}\n{data}");
    log::info!("{banner} training the model {banner}");

    let mut trained = model.clone();
    trained.check(trained.theta(), data)?;
    let num_obs = data.num_obs();

    let (final_mean_loglik, summary_base, lbfgs) = match &opts.algorithm {
        TrainingAlgorithm::Adam => {
            let (mean_ll, batch_size) = train_adam(&mut trained, data, opts)?;
            let summary = TrainingSummary {
                algorithm: opts.algorithm.to_string(),
                num_epochs: opts.num_epochs,
                learning_rate: Some(opts.learning_rate),
                batch_size,
                num_obs,
                final_mean_loglik: mean_ll,
                covariance: opts.covariance.to_string(),
            };
            (mean_ll, summary, None)
        }
        TrainingAlgorithm::Lbfgs(mle_opts) => {
            let outcome = maximize(&trained, trained.theta().clone(), data, mle_opts)?;
            trained.set_theta(outcome.theta_hat.clone())?;
            let mean_ll = outcome.value / num_obs as f64;
            log::info!(
                "L-BFGS: {} after {} iterations, Mean Log-likelihood={mean_ll}",
                outcome.status,
                outcome.iterations
            );
            let summary = TrainingSummary {
                algorithm: opts.algorithm.to_string(),
                num_epochs: outcome.iterations,
                learning_rate: None,
                batch_size: num_obs,
                num_obs,
                final_mean_loglik: mean_ll,
                covariance: opts.covariance.to_string(),
            };
            (mean_ll, summary, Some(outcome))
        }
    };

    let theta_hat = trained.theta().clone();
    let score_cov = if opts.covariance.needs_scores() {
        let scores = trained.scores(&theta_hat, data)?;
        score_covariance(&scores, &opts.covariance)?
    } else {
        None
    };
    let covariance = covariance_at(&trained, &theta_hat, data, score_cov.as_ref())?;
    let (estimates, std_errs) = trained.natural_scale(&theta_hat, &standard_errors(&covariance));
    let report =
        CoefficientReport::new(trained.coefficient_labels(), &estimates, &std_errs, summary_base)?;
    log::info!("{banner} model results {banner}\n{report}");

    Ok(RunOutcome { model: trained, report, final_mean_loglik, covariance, lbfgs })
}

// ---- Helper methods ----

/// Covariance of θ̂ from the finite-difference Hessian of the negative
/// log-likelihood.
///
/// The Hessian routine takes an infallible gradient, so a failing gradient
/// evaluation yields NaNs there and its first error is returned here in
/// place of whatever the NaNs caused downstream.
fn covariance_at<M: ChoiceModel>(
    model: &M, theta_hat: &Theta, data: &M::Data, score_cov: Option<&Array2<f64>>,
) -> RunResult<Array2<f64>> {
    let first_err: RefCell<Option<OptError>> = RefCell::new(None);
    let nll_grad = |theta: &Theta| -> Theta {
        match model.grad(theta, data) {
            Ok(g) => -g,
            Err(err) => {
                first_err.borrow_mut().get_or_insert(err);
                Theta::from_elem(theta.len(), f64::NAN)
            }
        }
    };
    let covariance = calc_covariance(&nll_grad, theta_hat, score_cov);
    if let Some(err) = first_err.into_inner() {
        return Err(err.into());
    }
    Ok(covariance?)
}

/// Adam epochs; returns the last epoch's mean log-likelihood and the
/// effective batch size.
fn train_adam<M>(trained: &mut M, data: &M::Data, opts: &RunOptions) -> RunResult<(f64, usize)>
where
    M: ChoiceModel,
    M::Data: ChoiceData,
{
    let mut loader = create_data_loader(data, opts.batch_size, opts.shuffle, opts.seed)?;
    let full_batch = loader.num_batches() == 1;
    let mut theta = trained.theta().clone();
    let mut adam = Adam::new(opts.adam_options()?, theta.len());
    let log_every = (opts.num_epochs / 10).max(1);
    log::debug!(
        "Adam: {} batches of up to {} observations per epoch",
        loader.num_batches(),
        loader.batch_size()
    );

    let mut mean_ll = f64::NAN;
    for epoch in 1..=opts.num_epochs {
        let (mut ll, mut count) = (0.0, 0usize);
        for indices in loader.epoch() {
            let selected;
            let batch = if full_batch {
                data
            } else {
                selected = data.select(&indices)?;
                &selected
            };
            let n = indices.len() as f64;
            ll += trained.value(&theta, batch)?;
            let grad = trained.grad(&theta, batch)?;
            adam.step(&mut theta, &(grad / -n))?;
            count += indices.len();
        }
        mean_ll = ll / count as f64;
        if epoch % log_every == 0 {
            log::info!("Epoch {epoch}: Mean Log-likelihood={mean_ll}");
        }
    }
    trained.set_theta(theta)?;
    Ok((mean_ll, loader.batch_size()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::ChoiceDataset,
        inference::scores::CovarianceType,
        models::conditional_logit::ConditionalLogitModel,
        optimization::loglik_optimizer::MLEOptions,
    };
    use crate::training::errors::RunError;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};
    use std::collections::BTreeMap;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - L-BFGS runs against the closed-form intercept-only optimum, with
    //   classical and robust errors.
    // - Adam runs moving toward the same optimum and leaving the input
    //   model untouched.
    // - Gradient errors raised while computing the covariance.
    //
    // They intentionally DO NOT cover:
    // - Nested models and realistic designs (see the integration tests).
    // -------------------------------------------------------------------------

    /// 100 choices over three items with shares 0.5, 0.3, 0.2.
    fn share_dataset() -> ChoiceDataset {
        let labels: Array1<usize> =
            (0..100).map(|n| if n < 50 { 0 } else if n < 80 { 1 } else { 2 }).collect();
        ChoiceDataset::builder(labels).num_items(3).build().expect("valid dataset")
    }

    fn intercept_model() -> ConditionalLogitModel {
        ConditionalLogitModel::from_dicts(&[("intercept", "item")], &BTreeMap::new(), 3, None)
            .expect("valid model")
    }

    #[test]
    // Purpose
    // -------
    // Check an L-BFGS run: estimates, standard errors and report.
    //
    // Given
    // -----
    // - Shares 0.5 / 0.3 / 0.2 over 100 observations, classical errors.
    //
    // Expect
    // ------
    // - α̂ = [ln 0.6, ln 0.4]; Var(α̂_1) = 1/n_0 + 1/n_1 = 1/50 + 1/30.
    // - The mean log-likelihood equals Σ p ln p.
    fn lbfgs_run_matches_closed_form() {
        // Arrange
        let data = share_dataset();
        let model = intercept_model();
        let opts = RunOptions {
            algorithm: TrainingAlgorithm::Lbfgs(MLEOptions::default()),
            ..RunOptions::default()
        };

        // Act
        let outcome = run(&model, &data, &opts).expect("run succeeds");

        // Assert
        let theta = outcome.model.theta();
        assert_abs_diff_eq!(theta[0], 0.6_f64.ln(), epsilon = 1e-4);
        assert_abs_diff_eq!(theta[1], 0.4_f64.ln(), epsilon = 1e-4);
        let row = outcome.report.row("intercept_0").expect("row present");
        assert_abs_diff_eq!(row.std_err, (1.0 / 50.0 + 1.0 / 30.0_f64).sqrt(), epsilon = 1e-3);
        let expected_ll = 0.5 * 0.5_f64.ln() + 0.3 * 0.3_f64.ln() + 0.2 * 0.2_f64.ln();
        assert_abs_diff_eq!(outcome.final_mean_loglik, expected_ll, epsilon = 1e-6);
        assert!(outcome.lbfgs.expect("lbfgs outcome").converged);
        assert_eq!(model.theta(), &Theta::zeros(2));
    }

    #[test]
    // Purpose
    // -------
    // Verify that robust errors coincide with classical ones for a
    // saturated model.
    //
    // Given
    // -----
    // - The intercept-only model, which is correctly specified.
    //
    // Expect
    // ------
    // - Robust SEs match classical SEs to 1e-3.
    fn robust_matches_classical_for_saturated_model() {
        // Arrange
        let data = share_dataset();
        let model = intercept_model();
        let lbfgs = TrainingAlgorithm::Lbfgs(MLEOptions::default());
        let classical = RunOptions { algorithm: lbfgs.clone(), ..RunOptions::default() };
        let robust = RunOptions {
            algorithm: lbfgs,
            covariance: CovarianceType::Robust,
            ..RunOptions::default()
        };

        // Act
        let a = run(&model, &data, &classical).expect("classical run");
        let b = run(&model, &data, &robust).expect("robust run");

        // Assert
        for (ra, rb) in a.report.rows.iter().zip(&b.report.rows) {
            assert_abs_diff_eq!(ra.std_err, rb.std_err, epsilon = 1e-3);
        }
        assert_eq!(b.report.summary.covariance, "robust");
    }

    #[test]
    // Purpose
    // -------
    // Ensure mini-batch Adam improves the fit and reports its schedule.
    //
    // Given
    // -----
    // - Batch size 25, learning rate 0.02, 300 epochs, seeded shuffling.
    //
    // Expect
    // ------
    // - Final mean log-likelihood above the uniform ln(1/3).
    // - Estimates near the closed form (within 0.1).
    // - Summary reports batch size 25 out of 100.
    fn adam_run_improves_likelihood() {
        // Arrange
        let data = share_dataset();
        let model = intercept_model();
        let opts = RunOptions {
            batch_size: Some(25),
            learning_rate: 0.02,
            num_epochs: 300,
            seed: Some(7),
            ..RunOptions::default()
        };

        // Act
        let outcome = run(&model, &data, &opts).expect("run succeeds");

        // Assert
        assert!(outcome.final_mean_loglik > (1.0_f64 / 3.0).ln());
        assert_abs_diff_eq!(outcome.model.theta()[0], 0.6_f64.ln(), epsilon = 0.1);
        assert_abs_diff_eq!(outcome.model.theta()[1], 0.4_f64.ln(), epsilon = 0.1);
        assert_eq!(outcome.report.summary.batch_size, 25);
        assert_eq!(outcome.report.summary.num_obs, 100);
        assert!(outcome.lbfgs.is_none());
    }

    #[test]
    // Purpose
    // -------
    // Surface gradient failures from the covariance step instead of a
    // NaN-driven error.
    //
    // Given
    // -----
    // - The intercept model (two parameters) and a θ̂ of length three.
    //
    // Expect
    // ------
    // - The gradient's own `ThetaLengthMismatch` error comes back.
    fn covariance_returns_first_gradient_error() {
        // Arrange
        let data = share_dataset();
        let model = intercept_model();
        let theta_hat = array![0.1, -0.2, 0.3];

        // Act
        let err = covariance_at(&model, &theta_hat, &data, None)
            .expect_err("gradient cannot be evaluated");

        // Assert
        assert_eq!(
            err,
            RunError::Opt(OptError::ThetaLengthMismatch { expected: 2, actual: 3 })
        );
    }
}
