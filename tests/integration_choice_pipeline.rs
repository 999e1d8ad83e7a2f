//! Integration tests for discrete-choice models, training and inference.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline: from simulated or tabular choice
//!   data, through model construction and fitting, to standard errors and
//!   coefficient reports.
//! - Exercise a realistic design mixing every coefficient variation the
//!   conditional logit supports, rather than toy intercept-only fits.
//!
//! Coverage
//! --------
//! - `data`:
//!   - `ChoiceDataset` construction with price, session and intercept
//!     features.
//!   - `LongTable` CSV loading, `pivot3d`, `pivot_availability`,
//!     `group_first` and `chosen_alternatives`, including cases that lack
//!     some alternatives.
//! - `models`:
//!   - `ConditionalLogitModel` recovery of known coefficients.
//!   - `NestedLogitModel` fitting on a two-nest partition of the same data.
//! - `training::run`:
//!   - L-BFGS with robust standard errors and Adam with mini-batches.
//!
//! Exclusions
//! ----------
//! - Low-level validation rules and gradient checks; these are covered by
//!   unit tests.
//! - Python bindings.
use ndarray::{Array1, Array2, Array3, Axis};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rust_choice::{
    data::{
        ChoiceDataset, JointDataset, LongTable, chosen_alternatives, group_first, pivot_availability,
        pivot3d,
    },
    inference::CovarianceType,
    models::{
        ChoiceModel, ConditionalLogitModel, NestedLogitModel, UtilitySpec,
        nested_logit::{CATEGORY, ITEM},
    },
    optimization::loglik_optimizer::MLEOptions,
    training::{RunOptions, TrainingAlgorithm, run},
};
use std::collections::BTreeMap;

const NUM_ITEMS: usize = 4;
const NUM_OBS: usize = 4000;

/// True coefficients in parameter order: `price_cost` (constant, 3),
/// `session_income` (item, 3), `price_ivt` (item-full, 4), `intercept`
/// (item, 3).
const TRUE_THETA: [f64; 13] =
    [-1.0, 0.5, -0.8, 0.3, -0.2, 0.5, -0.5, -0.3, -0.7, -0.2, 0.5, -0.5, 0.2];

/// Simulated features shared by every dataset built from one draw.
struct Design {
    cost: Array3<f64>,
    ivt: Array3<f64>,
    income: Array2<f64>,
}

fn draw_design(rng: &mut StdRng) -> Design {
    let cost = Array3::from_shape_fn((NUM_OBS, NUM_ITEMS, 3), |_| rng.gen_range(0.0..2.0));
    let ivt = Array3::from_shape_fn((NUM_OBS, NUM_ITEMS, 1), |_| rng.gen_range(0.0..2.0));
    let income = Array2::from_shape_fn((NUM_OBS, 1), |_| rng.gen_range(-1.0..1.0));
    Design { cost, ivt, income }
}

fn design_dataset(design: &Design, labels: Array1<usize>) -> ChoiceDataset {
    ChoiceDataset::builder(labels)
        .num_items(NUM_ITEMS)
        .feature("price_cost", design.cost.clone())
        .feature("price_ivt", design.ivt.clone())
        .feature("session_income", design.income.clone())
        .build()
        .expect("simulated dataset should be valid")
}

fn num_params() -> BTreeMap<String, usize> {
    [("price_cost", 3), ("session_income", 1), ("price_ivt", 1)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn variations() -> [(&'static str, &'static str); 4] {
    [
        ("price_cost", "constant"),
        ("session_income", "item"),
        ("price_ivt", "item-full"),
        ("intercept", "item"),
    ]
}

fn clm() -> ConditionalLogitModel {
    ConditionalLogitModel::from_dicts(&variations(), &num_params(), NUM_ITEMS, None)
        .expect("valid conditional logit")
}

/// Draw choices from the conditional logit at [`TRUE_THETA`].
fn simulate(seed: u64) -> ChoiceDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let design = draw_design(&mut rng);
    let mut truth = clm();
    truth.set_theta(Array1::from(TRUE_THETA.to_vec())).expect("true theta has the right length");
    let placeholder = design_dataset(&design, Array1::zeros(NUM_OBS));
    let proba = truth.predict_proba(&placeholder).expect("probabilities at the true theta");

    let labels: Array1<usize> = proba
        .axis_iter(Axis(0))
        .map(|row| {
            let u: f64 = rng.gen();
            let mut acc = 0.0;
            for (item, p) in row.iter().enumerate() {
                acc += p;
                if u < acc {
                    return item;
                }
            }
            NUM_ITEMS - 1
        })
        .collect();
    design_dataset(&design, labels)
}

#[test]
// Purpose
// -------
// Recover known coefficients with L-BFGS and report robust errors.
//
// Given
// -----
// - 4000 simulated choices over 4 items from a 13-parameter design.
//
// Expect
// ------
// - Every estimate within 0.3 of the truth.
// - Finite, positive standard errors under the labels the model reports.
fn lbfgs_recovers_simulated_coefficients() {
    // Arrange
    let data = simulate(11);
    let opts = RunOptions {
        algorithm: TrainingAlgorithm::Lbfgs(MLEOptions::default()),
        covariance: CovarianceType::Robust,
        ..RunOptions::default()
    };

    // Act
    let outcome = run(&clm(), &data, &opts).expect("L-BFGS run should succeed");

    // Assert
    let theta = outcome.model.theta();
    for (j, (est, truth)) in theta.iter().zip(TRUE_THETA.iter()).enumerate() {
        assert!((est - truth).abs() < 0.3, "parameter {j}: estimate {est} vs truth {truth}");
    }
    assert_eq!(outcome.report.rows.len(), TRUE_THETA.len());
    for row in &outcome.report.rows {
        let se = row.std_err;
        assert!(se.is_finite() && se > 0.0, "bad std. err. for {}", row.coefficient);
    }
    assert!(outcome.report.row("price_ivt_3").is_some());
    assert!(outcome.report.row("intercept_2").is_some());
    assert!(outcome.final_mean_loglik > (1.0 / NUM_ITEMS as f64).ln());
}

#[test]
// Purpose
// -------
// Smoke-test mini-batch Adam on the simulated design.
//
// Given
// -----
// - Batch size 500, learning rate 0.05, 40 epochs, seeded shuffling.
//
// Expect
// ------
// - Final mean log-likelihood above the uniform baseline ln(1/4).
// - A report with one row per parameter.
fn adam_improves_on_uniform_baseline() {
    // Arrange
    let data = simulate(12);
    let opts = RunOptions {
        batch_size: Some(500),
        learning_rate: 0.05,
        num_epochs: 40,
        seed: Some(3),
        ..RunOptions::default()
    };

    // Act
    let outcome = run(&clm(), &data, &opts).expect("Adam run should succeed");

    // Assert
    assert!(outcome.final_mean_loglik > (1.0 / NUM_ITEMS as f64).ln());
    assert_eq!(outcome.report.rows.len(), TRUE_THETA.len());
    assert_eq!(outcome.report.summary.batch_size, 500);
}

#[test]
// Purpose
// -------
// Fit a nested logit on the simulated choices.
//
// Given
// -----
// - Nests {0, 1} and {2, 3}, a nest intercept at the category level and
//   the full design at the item level.
//
// Expect
// ------
// - Fitting lowers the negative log-likelihood.
// - The fitted nested model is at least as good as the conditional logit,
//   which it contains at λ = 1, up to optimizer slack.
// - Dissimilarity parameters stay positive and finite.
fn nested_logit_fit_improves_likelihood() {
    // Arrange
    let data = simulate(13);
    let nest_labels: Array1<usize> = data.labels().mapv(|i| i / 2);
    let category = ChoiceDataset::builder(nest_labels)
        .num_items(2)
        .build()
        .expect("valid category dataset");
    let joint = JointDataset::new(vec![
        (CATEGORY.to_string(), category),
        (ITEM.to_string(), data.clone()),
    ])
    .expect("valid joint dataset");
    let category_spec =
        UtilitySpec::from_strs(&[("intercept", "item")], &BTreeMap::new(), 2, None)
            .expect("valid category spec");
    let item_spec = UtilitySpec::from_strs(&variations(), &num_params(), NUM_ITEMS, None)
        .expect("valid item spec");
    let nests = vec![vec![0, 1], vec![2, 3]];
    let mut nested = NestedLogitModel::new(nests, category_spec, item_spec, true)
        .expect("valid nested model");
    let mut flat = clm();
    let initial_nll = nested.negative_log_likelihood(&joint).expect("initial nll");

    // Act
    nested.fit(&joint, &MLEOptions::default()).expect("nested fit should succeed");
    flat.fit(&data, &MLEOptions::default()).expect("conditional logit fit should succeed");

    // Assert
    let nested_nll = nested.negative_log_likelihood(&joint).expect("fitted nll");
    let flat_nll = flat.negative_log_likelihood(&data).expect("flat nll");
    assert!(nested_nll < initial_nll);
    assert!(nested_nll <= flat_nll + 0.5, "nested {nested_nll} vs flat {flat_nll}");
    for lambda in nested.lambdas() {
        assert!(lambda.is_finite() && lambda > 0.0);
    }
}

#[test]
// Purpose
// -------
// Build a dataset from a long-format CSV table and evaluate a model on it.
//
// Given
// -----
// - Three cases over three modes (`bus`, `car`, `train`) with a per-row
//   cost, a per-case income and a choice flag.
//
// Expect
// ------
// - Labels follow the sorted mode order.
// - The pivoted cost tensor and grouped income feed a valid dataset whose
//   predicted probabilities sum to one per case.
fn long_table_csv_to_dataset() {
    // Arrange
    let csv = "\
case,mode,chosen,cost,income
1,car,1,4.0,30
1,bus,0,1.5,30
1,train,0,3.0,30
2,car,0,5.0,55
2,bus,0,2.0,55
2,train,1,2.5,55
10,car,0,3.5,42
10,bus,1,1.0,42
10,train,0,2.8,42
";
    let table = LongTable::from_reader(csv.as_bytes()).expect("parse csv");

    // Act
    let cost = pivot3d(&table, "case", "mode", &["cost"]).expect("pivot cost");
    let income = group_first(&table, "case", "income").expect("group income");
    let labels = chosen_alternatives(&table, "case", "mode", "chosen").expect("labels");
    let data = ChoiceDataset::builder(labels.clone())
        .feature("price_cost", cost.clone())
        .feature("session_income", income.insert_axis(Axis(1)))
        .build()
        .expect("dataset from table");
    let model = ConditionalLogitModel::from_dicts(
        &[("price_cost", "constant"), ("session_income", "item"), ("intercept", "item")],
        &[("price_cost".to_string(), 1), ("session_income".to_string(), 1)]
            .into_iter()
            .collect(),
        3,
        None,
    )
    .expect("valid model");
    let proba = model.predict_proba(&data).expect("probabilities");

    // Assert
    // Modes sort as bus, car, train; cases sort numerically as 1, 2, 10.
    assert_eq!(labels.to_vec(), vec![1, 2, 0]);
    assert_eq!(cost.dim(), (3, 3, 1));
    assert_eq!(cost[[2, 0, 0]], 1.0);
    assert_eq!(data.num_items(), 3);
    for row in proba.axis_iter(Axis(0)) {
        assert!((row.sum() - 1.0).abs() < 1e-12);
    }
}

#[test]
// Purpose
// -------
// Fit a model on a long table where some cases lack an alternative.
//
// Given
// -----
// - Eight cases over `bus`, `car`, `train`; cases 2 and 5 have no `train`
//   row, so the pivoted cost holds NaN there.
// - Availability derived from the pivot and a cost-plus-intercept model.
//
// Expect
// ------
// - The dataset builds despite the NaN cells of unavailable items.
// - L-BFGS reaches the maximum likelihood estimate
//   (β, α_car, α_train) ≈ (-0.368246, 0.328815, 0.278300) with mean
//   log-likelihood ≈ -0.963591, above the value at zero.
fn unbalanced_long_table_fits_with_availability() {
    // Arrange
    let csv = "\
case,mode,chosen,cost
1,bus,0,1.0
1,car,1,3.0
1,train,0,2.0
2,bus,1,1.5
2,car,0,2.5
3,bus,0,2.0
3,car,0,2.0
3,train,1,1.0
4,bus,1,1.0
4,car,0,4.0
4,train,0,3.0
5,bus,0,2.5
5,car,1,1.5
6,bus,0,0.5
6,car,0,3.5
6,train,1,2.5
7,bus,0,1.2
7,car,1,2.2
7,train,0,1.8
8,bus,1,2.2
8,car,0,1.2
8,train,0,3.0
";
    let table = LongTable::from_reader(csv.as_bytes()).expect("parse csv");
    let cost = pivot3d(&table, "case", "mode", &["cost"]).expect("pivot cost");
    let availability = pivot_availability(&cost);
    let labels = chosen_alternatives(&table, "case", "mode", "chosen").expect("labels");
    let data = ChoiceDataset::builder(labels)
        .feature("price_cost", cost.clone())
        .item_availability(availability.clone())
        .build()
        .expect("NaN costs of unavailable items are accepted");
    let model = ConditionalLogitModel::from_dicts(
        &[("price_cost", "constant"), ("intercept", "item")],
        &[("price_cost".to_string(), 1)].into_iter().collect(),
        3,
        None,
    )
    .expect("valid model");
    let opts = RunOptions {
        algorithm: TrainingAlgorithm::Lbfgs(MLEOptions::default()),
        ..RunOptions::default()
    };
    let ll_at_zero = -7.977968 / 8.0;

    // Act
    let outcome = run(&model, &data, &opts).expect("L-BFGS run should succeed");

    // Assert
    assert!(cost[[1, 2, 0]].is_nan());
    assert!(!availability[[1, 2]] && !availability[[4, 2]]);
    assert_eq!(availability.iter().filter(|ok| **ok).count(), 22);
    let theta = outcome.model.theta();
    for (est, expected) in theta.iter().zip([-0.368246, 0.328815, 0.278300]) {
        assert!((est - expected).abs() < 1e-3, "estimate {est} vs {expected}");
    }
    assert!((outcome.final_mean_loglik + 0.963591).abs() < 1e-5);
    assert!(outcome.final_mean_loglik > ll_at_zero);
    let proba = outcome.model.predict_proba(&data).expect("probabilities");
    assert_eq!(proba[[1, 2]], 0.0);
    for row in proba.axis_iter(Axis(0)) {
        assert!((row.sum() - 1.0).abs() < 1e-12);
    }
}
