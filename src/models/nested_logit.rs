//! models::nested_logit — two-level nested logit with dissimilarity parameters.
//!
//! Purpose
//! -------
//! Items are partitioned into nests (categories). Observation `n` picks nest
//! `m` and then item `i ∈ B_m`, with
//!
//! ```text
//! I_m      = log Σ_{i ∈ B_m, available} exp(Y_i / λ_m)
//! V_m      = W_m + λ_m I_m
//! log P(j) = Y_j / λ_k − I_k + V_k − log Σ_m exp(V_m)      (j ∈ B_k)
//! ```
//!
//! where `W` is the nest-level utility from the category specification and
//! `Y` the item-level utility from the item specification.
//!
//! Key behaviors
//! -------------
//! - θ is laid out as `[category block | item block | θ_λ]`, with one θ_λ per
//!   nest or a single shared one.
//! - `λ = softplus(θ_λ)` keeps every dissimilarity strictly positive; the
//!   report maps θ_λ back to λ with the delta method.
//! - Nests whose items are all unavailable drop out of the outer sum.
//! - The gradient is analytic for both coefficient blocks and θ_λ.
//!
//! Invariants & assumptions
//! ------------------------
//! - Nests partition `0..num_items` and none is empty.
//! - Data is a [`JointDataset`] with a `"category"` member (one "item" per
//!   nest) and an `"item"` member whose labels are the chosen items.
//!
//! Testing notes
//! -------------
//! - With λ = 1 and zero nest utility the model must reduce to the
//!   conditional logit; the tests check this exactly, together with the
//!   gradient against finite differences.
use crate::{
    data::{ChoiceDataset, JointDataset},
    models::{
        conditional_logit::check_theta,
        errors::{ModelError, ModelResult},
        spec::UtilitySpec,
        traits::ChoiceModel,
    },
    optimization::{
        errors::OptResult,
        loglik_optimizer::{
            Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta, maximize, validate_theta,
        },
        numerical_stability::{
            GENERAL_TOL, log_sum_exp, safe_logistic, safe_softplus, safe_softplus_inv,
        },
    },
};
use ndarray::{Array1, Array2, Axis, s};
use std::fmt;

/// Member of the joint dataset holding nest-level features.
pub const CATEGORY: &str = "category";

/// Member of the joint dataset holding item-level features and labels.
pub const ITEM: &str = "item";

const INITIAL_LAMBDA: f64 = 0.5;

/// Nested logit model.
#[derive(Debug, Clone)]
pub struct NestedLogitModel {
    nests: Vec<Vec<usize>>,
    item_to_nest: Vec<usize>,
    category_spec: UtilitySpec,
    item_spec: UtilitySpec,
    shared_lambda: bool,
    theta: Theta,
    outcome: Option<OptimOutcome>,
}

/// Per-observation quantities of one evaluation.
struct Evaluation {
    log_prob: Array1<f64>,
    proba: Array2<f64>,
    d_category: Array2<f64>,
    d_item: Array2<f64>,
    d_lambda: Array2<f64>,
}

impl NestedLogitModel {
    /// Model with nests `category_to_item[m]`, starting at zero coefficients
    /// and λ = 0.5.
    ///
    /// # Errors
    /// - [`ModelError::TooFewItems`] when the item spec has fewer than two
    ///   items.
    /// - [`ModelError::NestCountMismatch`] when the category spec does not
    ///   have one item per nest.
    /// - [`ModelError::EmptyNest`], [`ModelError::ItemNotInNest`],
    ///   [`ModelError::ItemInMultipleNests`] when the nests do not partition
    ///   the items.
    /// - [`ModelError::ItemCountMismatch`] for a nest member past the last
    ///   item.
    pub fn new(
        category_to_item: Vec<Vec<usize>>, category_spec: UtilitySpec, item_spec: UtilitySpec,
        shared_lambda: bool,
    ) -> ModelResult<Self> {
        let num_items = item_spec.num_items();
        if num_items < 2 {
            return Err(ModelError::TooFewItems { num_items });
        }
        if category_spec.num_items() != category_to_item.len() {
            return Err(ModelError::NestCountMismatch {
                expected: category_to_item.len(),
                found: category_spec.num_items(),
            });
        }
        let mut assigned: Vec<Option<usize>> = vec![None; num_items];
        for (category, nest) in category_to_item.iter().enumerate() {
            if nest.is_empty() {
                return Err(ModelError::EmptyNest { category });
            }
            for &item in nest {
                let slot = assigned.get_mut(item).ok_or(ModelError::ItemCountMismatch {
                    expected: num_items,
                    found: item + 1,
                })?;
                if slot.is_some() {
                    return Err(ModelError::ItemInMultipleNests { item });
                }
                *slot = Some(category);
            }
        }
        let item_to_nest = assigned
            .into_iter()
            .enumerate()
            .map(|(item, nest)| nest.ok_or(ModelError::ItemNotInNest { item }))
            .collect::<ModelResult<Vec<_>>>()?;

        let mut model = Self {
            nests: category_to_item,
            item_to_nest,
            category_spec,
            item_spec,
            shared_lambda,
            theta: Theta::zeros(0),
            outcome: None,
        };
        model.theta = model.initial_theta();
        Ok(model)
    }

    pub fn num_nests(&self) -> usize {
        self.nests.len()
    }

    pub fn num_items(&self) -> usize {
        self.item_spec.num_items()
    }

    pub fn nests(&self) -> &[Vec<usize>] {
        &self.nests
    }

    pub fn category_spec(&self) -> &UtilitySpec {
        &self.category_spec
    }

    pub fn item_spec(&self) -> &UtilitySpec {
        &self.item_spec
    }

    /// Number of θ_λ entries: one, or one per nest.
    pub fn num_lambdas(&self) -> usize {
        if self.shared_lambda { 1 } else { self.nests.len() }
    }

    /// Dissimilarity λ_m of every nest at the current θ.
    pub fn lambdas(&self) -> Vec<f64> {
        self.lambdas_at(&self.theta)
    }

    /// Solver outcome of the last [`fit`](Self::fit).
    ///
    /// # Errors
    /// [`ModelError::ModelNotFitted`] before the first fit.
    pub fn outcome(&self) -> ModelResult<&OptimOutcome> {
        self.outcome.as_ref().ok_or(ModelError::ModelNotFitted)
    }

    /// Choice probabilities `(len, num_items)` at the current θ.
    ///
    /// # Errors
    /// Missing joint members, data incompatibilities, and
    /// [`ModelError::NoAvailableItems`].
    pub fn predict_proba(&self, data: &JointDataset) -> ModelResult<Array2<f64>> {
        Ok(self.evaluate(&self.theta, data, false)?.proba)
    }

    /// `-ℓ(θ)` at the current θ, summed over observations.
    ///
    /// # Errors
    /// As [`NestedLogitModel::predict_proba`].
    pub fn negative_log_likelihood(&self, data: &JointDataset) -> ModelResult<f64> {
        Ok(-self.evaluate(&self.theta, data, false)?.log_prob.sum())
    }

    /// Fit by L-BFGS starting from the current θ; θ̂ replaces θ.
    ///
    /// # Errors
    /// Any optimizer, model or data error.
    pub fn fit(&mut self, data: &JointDataset, opts: &MLEOptions) -> OptResult<&OptimOutcome> {
        let outcome = maximize(&*self, self.theta.clone(), data, opts)?;
        self.theta = outcome.theta_hat.clone();
        let stored = self.outcome.insert(outcome);
        Ok(&*stored)
    }

    // ---- Layout ----

    fn item_offset(&self) -> usize {
        self.category_spec.num_params()
    }

    fn lambda_offset(&self) -> usize {
        self.category_spec.num_params() + self.item_spec.num_params()
    }

    fn lambda_slot(&self, nest: usize) -> usize {
        if self.shared_lambda { 0 } else { nest }
    }

    fn lambdas_at(&self, theta: &Theta) -> Vec<f64> {
        let offset = self.lambda_offset();
        (0..self.nests.len())
            .map(|m| {
                theta
                    .get(offset + self.lambda_slot(m))
                    .map_or(INITIAL_LAMBDA, |&t| safe_softplus(t).max(GENERAL_TOL))
            })
            .collect()
    }

    // ---- Evaluation ----

    fn members<'a>(
        &self, data: &'a JointDataset,
    ) -> ModelResult<(&'a ChoiceDataset, &'a ChoiceDataset)> {
        Ok((data.get(CATEGORY)?, data.get(ITEM)?))
    }

    /// Log-probabilities of the chosen items, full probabilities and, with
    /// `with_grad`, `∂ℓ_n` with respect to `W`, `Y` and θ_λ.
    fn evaluate(
        &self, theta: &Theta, data: &JointDataset, with_grad: bool,
    ) -> ModelResult<Evaluation> {
        check_theta(theta, self.num_params())?;
        let (category, item) = self.members(data)?;
        let item_offset = self.item_offset();
        let lambda_offset = self.lambda_offset();
        let w = self.category_spec.utility(theta.slice(s![..item_offset]), category)?;
        let y = self.item_spec.utility(theta.slice(s![item_offset..lambda_offset]), item)?;
        let avail = item.availability();
        let lambdas = self.lambdas_at(theta);
        let d_softplus: Vec<f64> = (0..self.num_lambdas())
            .map(|l| safe_logistic(theta[lambda_offset + l]))
            .collect();

        let len = item.len();
        let num_items = self.num_items();
        let num_nests = self.nests.len();
        let grad_shape = |cols: usize| if with_grad { (len, cols) } else { (0, 0) };
        let mut eval = Evaluation {
            log_prob: Array1::zeros(len),
            proba: Array2::zeros((len, num_items)),
            d_category: Array2::zeros(grad_shape(num_nests)),
            d_item: Array2::zeros(grad_shape(num_items)),
            d_lambda: Array2::zeros(grad_shape(self.num_lambdas())),
        };

        let mut inclusive = vec![f64::NEG_INFINITY; num_nests];
        let mut y_bar = vec![0.0; num_nests];
        let mut v = vec![f64::NEG_INFINITY; num_nests];
        let mut within = vec![0.0; num_items];
        for (n, &chosen) in item.labels().iter().enumerate() {
            let is_available = |i: usize| avail.as_ref().map_or(true, |a| a[[n, i]]);
            within.fill(0.0);
            for (m, nest) in self.nests.iter().enumerate() {
                let lam = lambdas[m];
                let scaled: Vec<(usize, f64)> = nest
                    .iter()
                    .filter(|&&i| is_available(i))
                    .map(|&i| (i, y[[n, i]] / lam))
                    .collect();
                inclusive[m] = log_sum_exp(scaled.iter().map(|&(_, s)| s));
                y_bar[m] = 0.0;
                if inclusive[m] == f64::NEG_INFINITY {
                    v[m] = f64::NEG_INFINITY;
                    continue;
                }
                for &(i, s) in &scaled {
                    within[i] = (s - inclusive[m]).exp();
                    y_bar[m] += within[i] * y[[n, i]];
                }
                v[m] = w[[n, m]] + lam * inclusive[m];
            }
            let total = log_sum_exp(v.iter().copied());
            if total == f64::NEG_INFINITY {
                return Err(ModelError::NoAvailableItems { observation: n });
            }
            let q: Vec<f64> = v.iter().map(|&vm| (vm - total).exp()).collect();
            for i in 0..num_items {
                eval.proba[[n, i]] = within[i] * q[self.item_to_nest[i]];
            }

            let k = self.item_to_nest[chosen];
            let lam_k = lambdas[k];
            eval.log_prob[n] = y[[n, chosen]] / lam_k - inclusive[k] + v[k] - total;
            if !with_grad {
                continue;
            }

            for m in 0..num_nests {
                let chosen_nest = if m == k { 1.0 } else { 0.0 };
                eval.d_category[[n, m]] = chosen_nest - q[m];
            }
            for i in 0..num_items {
                let m = self.item_to_nest[i];
                let mut d = -q[m] * within[i];
                if m == k {
                    d += (lam_k - 1.0) / lam_k * within[i];
                }
                if i == chosen {
                    d += 1.0 / lam_k;
                }
                eval.d_item[[n, i]] = d;
            }
            for m in 0..num_nests {
                if inclusive[m] == f64::NEG_INFINITY {
                    continue;
                }
                let lam = lambdas[m];
                let mut d = -q[m] * (inclusive[m] - y_bar[m] / lam);
                if m == k {
                    d += -y[[n, chosen]] / (lam * lam) + inclusive[m]
                        - (lam - 1.0) * y_bar[m] / (lam * lam);
                }
                let slot = self.lambda_slot(m);
                eval.d_lambda[[n, slot]] += d * d_softplus[slot];
            }
        }
        Ok(eval)
    }
}

impl LogLikelihood for NestedLogitModel {
    type Data = JointDataset;

    fn value(&self, theta: &Theta, data: &JointDataset) -> OptResult<f64> {
        Ok(self.evaluate(theta, data, false)?.log_prob.sum())
    }

    fn check(&self, theta: &Theta, data: &JointDataset) -> OptResult<()> {
        validate_theta(theta, self.num_params())?;
        let (category, item) = self.members(data)?;
        self.category_spec.check_data(category)?;
        self.item_spec.check_data(item)?;
        Ok(())
    }

    fn grad(&self, theta: &Theta, data: &JointDataset) -> OptResult<Grad> {
        let eval = self.evaluate(theta, data, true)?;
        let (category, item) = self.members(data)?;
        let (item_offset, lambda_offset) = (self.item_offset(), self.lambda_offset());
        let mut grad = Grad::zeros(self.num_params());
        grad.slice_mut(s![..item_offset])
            .assign(&self.category_spec.backprop(eval.d_category.view(), category)?);
        grad.slice_mut(s![item_offset..lambda_offset])
            .assign(&self.item_spec.backprop(eval.d_item.view(), item)?);
        grad.slice_mut(s![lambda_offset..]).assign(&eval.d_lambda.sum_axis(Axis(0)));
        Ok(grad)
    }
}

impl ChoiceModel for NestedLogitModel {
    fn num_params(&self) -> usize {
        self.lambda_offset() + self.num_lambdas()
    }

    fn theta(&self) -> &Theta {
        &self.theta
    }

    fn set_theta(&mut self, theta: Theta) -> ModelResult<()> {
        check_theta(&theta, self.num_params())?;
        self.theta = theta;
        Ok(())
    }

    fn initial_theta(&self) -> Theta {
        let mut theta = Theta::zeros(self.num_params());
        theta.slice_mut(s![self.lambda_offset()..]).fill(safe_softplus_inv(INITIAL_LAMBDA));
        theta
    }

    fn coefficient_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .category_spec
            .labels()
            .into_iter()
            .map(|l| format!("{CATEGORY}.{l}"))
            .chain(self.item_spec.labels().into_iter().map(|l| format!("{ITEM}.{l}")))
            .collect();
        if self.shared_lambda {
            labels.push("lambda".to_string());
        } else {
            labels.extend((0..self.nests.len()).map(|m| format!("lambda_{m}")));
        }
        labels
    }

    fn scores(&self, theta: &Theta, data: &JointDataset) -> ModelResult<Array2<f64>> {
        let eval = self.evaluate(theta, data, true)?;
        let (category, item) = self.members(data)?;
        let (item_offset, lambda_offset) = (self.item_offset(), self.lambda_offset());
        let mut scores = Array2::zeros((item.len(), self.num_params()));
        scores
            .slice_mut(s![.., ..item_offset])
            .assign(&self.category_spec.scores(eval.d_category.view(), category)?);
        scores
            .slice_mut(s![.., item_offset..lambda_offset])
            .assign(&self.item_spec.scores(eval.d_item.view(), item)?);
        scores.slice_mut(s![.., lambda_offset..]).assign(&eval.d_lambda);
        Ok(scores)
    }

    /// θ_λ entries are reported as λ = softplus(θ_λ) with
    /// `se(λ) = logistic(θ_λ) · se(θ_λ)`.
    fn natural_scale(&self, theta: &Theta, se: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        let mut estimate = theta.clone();
        let mut scaled_se = se.clone();
        for idx in self.lambda_offset()..theta.len().min(se.len()) {
            estimate[idx] = safe_softplus(theta[idx]);
            scaled_se[idx] = se[idx] * safe_logistic(theta[idx]);
        }
        (estimate, scaled_se)
    }
}

impl fmt::Display for NestedLogitModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "NestedLogitModel(num_nests={}, num_items={}, shared_lambda={}, num_params={})",
            self.nests.len(),
            self.num_items(),
            self.shared_lambda,
            self.num_params()
        )?;
        writeln!(f, "nests: {:?}", self.nests)?;
        writeln!(f, "category coefficients:")?;
        writeln!(f, "{}", self.category_spec)?;
        writeln!(f, "item coefficients:")?;
        write!(f, "{}", self.item_spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::conditional_logit::ConditionalLogitModel;
    use approx::assert_abs_diff_eq;
    use finitediff::FiniteDiff;
    use ndarray::{Array3, array};
    use std::collections::BTreeMap;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Reduction to the conditional logit at λ = 1 with zero nest utility.
    // - Analytic gradient (coefficients and θ_λ) against finite differences.
    // - Probabilities summing to one under an availability mask.
    // - Nest-structure validation.
    //
    // They intentionally DO NOT cover:
    // - Recovery of true parameters (see the integration tests).
    // -------------------------------------------------------------------------

    const NESTS: [&[usize]; 2] = [&[0], &[1, 2]];
    const LABELS: [usize; 6] = [0, 1, 2, 1, 0, 2];

    fn params(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(n, k)| (n.to_string(), *k)).collect()
    }

    fn nests() -> Vec<Vec<usize>> {
        NESTS.iter().map(|n| n.to_vec()).collect()
    }

    fn item_dataset() -> ChoiceDataset {
        let prices = Array3::from_shape_vec(
            (3, 3, 1),
            vec![1.0, 2.0, 0.5, 1.5, 0.7, 2.2, 0.9, 1.1, 1.3],
        )
        .expect("3x3x1 grid");
        ChoiceDataset::builder(Array1::from(LABELS.to_vec()))
            .session_index(array![0, 1, 2, 0, 1, 2])
            .feature("price_cost", prices)
            .item_availability(array![
                [true, true, true],
                [true, true, false],
                [true, true, true]
            ])
            .build()
            .expect("valid item dataset")
    }

    /// Nest-level dataset: labels are the nests of the chosen items.
    fn joint_dataset() -> JointDataset {
        let nest_of = |i: usize| if i == 0 { 0 } else { 1 };
        let category = ChoiceDataset::builder(LABELS.iter().map(|&i| nest_of(i)).collect())
            .num_items(2)
            .feature("session_nestcost", array![[0.4], [-0.2], [1.1], [0.3], [0.0], [-0.6]])
            .build()
            .expect("valid category dataset");
        JointDataset::new(vec![
            (CATEGORY.to_string(), category),
            (ITEM.to_string(), item_dataset()),
        ])
        .expect("valid joint dataset")
    }

    fn item_spec() -> UtilitySpec {
        UtilitySpec::from_strs(
            &[("price_cost", "constant"), ("intercept", "item")],
            &params(&[("price_cost", 1)]),
            3,
            None,
        )
        .expect("valid item spec")
    }

    fn category_spec() -> UtilitySpec {
        UtilitySpec::from_strs(
            &[("session_nestcost", "item"), ("intercept", "item")],
            &params(&[("session_nestcost", 1)]),
            2,
            None,
        )
        .expect("valid category spec")
    }

    #[test]
    // Purpose
    // -------
    // Ensure the nested logit collapses to the conditional logit.
    //
    // Given
    // -----
    // - Zero category coefficients, a shared λ = 1 and non-trivial item
    //   coefficients.
    //
    // Expect
    // ------
    // - Same log-likelihood, probabilities and item-block gradient as the
    //   conditional logit on the `"item"` member.
    fn unit_lambda_matches_conditional_logit() {
        // Arrange
        let data = joint_dataset();
        let mut nested =
            NestedLogitModel::new(nests(), category_spec(), item_spec(), true).expect("valid");
        let mut clm = ConditionalLogitModel::new(item_spec()).expect("valid");
        let item_theta = array![-0.8, 0.3, -0.4];
        let mut theta = Theta::zeros(nested.num_params());
        theta.slice_mut(s![2..5]).assign(&item_theta);
        theta[5] = safe_softplus_inv(1.0);
        nested.set_theta(theta.clone()).expect("theta fits");
        clm.set_theta(item_theta.clone()).expect("theta fits");
        let item = data.get(ITEM).expect("item member");

        // Act
        let nested_ll = nested.value(&theta, &data).expect("nested value");
        let clm_ll = clm.value(&item_theta, item).expect("clm value");
        let nested_grad = nested.grad(&theta, &data).expect("nested grad");
        let clm_grad = clm.grad(&item_theta, item).expect("clm grad");
        let nested_p = nested.predict_proba(&data).expect("nested proba");
        let clm_p = clm.predict_proba(item).expect("clm proba");

        // Assert
        assert_abs_diff_eq!(nested.lambdas()[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(nested_ll, clm_ll, epsilon = 1e-9);
        for j in 0..3 {
            assert_abs_diff_eq!(nested_grad[2 + j], clm_grad[j], epsilon = 1e-9);
        }
        for (a, b) in nested_p.iter().zip(clm_p.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-10);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the analytic gradient and scores, including θ_λ.
    //
    // Given
    // -----
    // - Per-nest λ, every block non-zero, and an availability mask that
    //   shrinks the second nest in session 1.
    //
    // Expect
    // ------
    // - `grad` matches a central difference of `value` to 1e-6.
    // - Column sums of `scores` equal `grad`.
    fn gradient_matches_finite_differences() {
        // Arrange
        let data = joint_dataset();
        let model =
            NestedLogitModel::new(nests(), category_spec(), item_spec(), false).expect("valid");
        let theta = array![0.6, -0.2, -0.9, 0.4, -0.3, -0.5, 0.7];
        model.check(&theta, &data).expect("compatible");

        // Act
        let grad = model.grad(&theta, &data).expect("gradient");
        let fd = theta.central_diff(&|t: &Theta| model.value(t, &data).unwrap_or(f64::NAN));
        let scores = model.scores(&theta, &data).expect("scores");

        // Assert
        for j in 0..theta.len() {
            assert_abs_diff_eq!(grad[j], fd[j], epsilon = 1e-6);
            assert_abs_diff_eq!(scores.column(j).sum(), grad[j], epsilon = 1e-10);
        }
    }

    #[test]
    // Purpose
    // -------
    // Check probabilities, initial λ, labels and the natural-scale map.
    //
    // Given
    // -----
    // - A fresh per-nest model on `joint_dataset`.
    //
    // Expect
    // ------
    // - Rows sum to one and the masked item has zero probability.
    // - λ starts at 0.5 for every nest; labels carry block prefixes.
    // - `natural_scale` turns θ_λ into λ and scales its standard error.
    fn probabilities_labels_and_natural_scale() {
        // Arrange
        let data = joint_dataset();
        let model =
            NestedLogitModel::new(nests(), category_spec(), item_spec(), false).expect("valid");

        // Act
        let proba = model.predict_proba(&data).expect("probabilities");
        let labels = model.coefficient_labels();
        let se = Array1::from_elem(model.num_params(), 0.1);
        let (est, scaled) = model.natural_scale(model.theta(), &se);

        // Assert
        for row in proba.outer_iter() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
        assert_eq!(proba[[1, 2]], 0.0);
        for lam in model.lambdas() {
            assert_abs_diff_eq!(lam, 0.5, epsilon = 1e-10);
        }
        assert_eq!(labels.len(), model.num_params());
        assert_eq!(labels[0], "category.session_nestcost_0");
        assert_eq!(labels[2], "item.price_cost_0");
        assert_eq!(labels[5], "lambda_0");
        assert_abs_diff_eq!(est[5], 0.5, epsilon = 1e-10);
        assert_abs_diff_eq!(scaled[5], 0.1 * (1.0 - (-0.5_f64).exp()), epsilon = 1e-10);
        assert_abs_diff_eq!(scaled[0], 0.1, epsilon = 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Check that nests must partition the items.
    //
    // Given
    // -----
    // - An empty nest, an item in two nests, an uncovered item, an item
    //   index past the end, and a category spec with the wrong nest count.
    //
    // Expect
    // ------
    // - The matching `ModelError` for each.
    fn nest_structure_validation() {
        // Arrange
        let build = |nests: Vec<Vec<usize>>| {
            NestedLogitModel::new(nests, category_spec(), item_spec(), true).map(|_| ())
        };
        let three_nests = UtilitySpec::from_strs(&[("intercept", "item")], &params(&[]), 3, None)
            .expect("valid spec");

        // Act / Assert
        assert_eq!(build(vec![vec![0, 1, 2], vec![]]), Err(ModelError::EmptyNest { category: 1 }));
        assert_eq!(
            build(vec![vec![0, 1], vec![1, 2]]),
            Err(ModelError::ItemInMultipleNests { item: 1 })
        );
        assert_eq!(build(vec![vec![0], vec![1]]), Err(ModelError::ItemNotInNest { item: 2 }));
        assert_eq!(
            build(vec![vec![0], vec![1, 2, 3]]),
            Err(ModelError::ItemCountMismatch { expected: 3, found: 4 })
        );
        assert_eq!(
            NestedLogitModel::new(nests(), three_nests, item_spec(), true).map(|_| ()),
            Err(ModelError::NestCountMismatch { expected: 2, found: 3 })
        );
    }
}
