//! models::spec — an ordered set of coefficients forming a utility function.
//!
//! Purpose
//! -------
//! Turn a coefficient-name → variation mapping into a concrete θ layout and
//! evaluate `U[n, i] = Σ_coef Σ_p x_coef[n, i, p] · β_coef(u_n, i, p)` on a
//! [`ChoiceDataset`], together with the reverse pass from `∂ℓ/∂U` to `∂ℓ/∂θ`.
//!
//! Key behaviors
//! -------------
//! - Coefficients occupy consecutive θ blocks in the order they were given.
//! - The reserved name `intercept` needs no feature: its design is a column
//!   of ones. It must have exactly one parameter.
//! - [`UtilitySpec::check_data`] confirms that a dataset carries every
//!   feature with the declared width and matching item/user counts, so the
//!   evaluation paths can index without further checks.
//!
//! Invariants & assumptions
//! ------------------------
//! - `theta` passed to [`UtilitySpec::utility`] is exactly this
//!   specification's block (`num_params()` entries).
//! - Datasets passed to evaluation have already passed `check_data`.
use crate::{
    data::{ChoiceDataset, errors::DataError},
    models::{
        coefficient::{CoefVariation, Coefficient},
        errors::{ModelError, ModelResult},
    },
};
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2};
use std::{
    collections::{BTreeMap, HashSet},
    fmt,
};

/// Reserved coefficient name whose design is a column of ones.
pub const INTERCEPT: &str = "intercept";

/// Ordered coefficients over a fixed item (and optional user) universe.
#[derive(Debug, Clone, PartialEq)]
pub struct UtilitySpec {
    coefficients: Vec<Coefficient>,
    num_items: usize,
    num_users: Option<usize>,
    num_params: usize,
}

impl UtilitySpec {
    /// Build a specification.
    ///
    /// `variations` fixes the θ order. `num_params` maps each coefficient
    /// name to its feature width `k`; the intercept may be omitted there.
    ///
    /// # Errors
    /// - [`ModelError::EmptySpec`], [`ModelError::TooFewItems`] (zero items).
    /// - [`ModelError::DuplicateCoefficient`].
    /// - [`ModelError::MissingNumParams`], [`ModelError::ZeroNumParams`],
    ///   [`ModelError::InterceptParams`].
    /// - [`ModelError::MissingNumUsers`] for user variations without users.
    pub fn new(
        variations: Vec<(String, CoefVariation)>, num_params: &BTreeMap<String, usize>,
        num_items: usize, num_users: Option<usize>,
    ) -> ModelResult<Self> {
        if variations.is_empty() {
            return Err(ModelError::EmptySpec);
        }
        if num_items == 0 {
            return Err(ModelError::TooFewItems { num_items });
        }
        let mut seen = HashSet::new();
        let mut coefficients = Vec::with_capacity(variations.len());
        let mut offset = 0;
        for (name, variation) in variations {
            if !seen.insert(name.clone()) {
                return Err(ModelError::DuplicateCoefficient { name });
            }
            let k = match (name.as_str(), num_params.get(&name)) {
                (INTERCEPT, None) | (INTERCEPT, Some(1)) => 1,
                (INTERCEPT, Some(&found)) => return Err(ModelError::InterceptParams { found }),
                (_, Some(&k)) => k,
                (_, None) => return Err(ModelError::MissingNumParams { name }),
            };
            if name == INTERCEPT && matches!(variation, CoefVariation::ItemFull) {
                log::warn!(
                    "intercept with variation 'item-full' is not identified; \
                     use 'item' to pin the first item's intercept at zero"
                );
            }
            let coef = Coefficient::new(name, variation, k, num_items, num_users, offset)?;
            offset += coef.len();
            coefficients.push(coef);
        }
        Ok(Self { coefficients, num_items, num_users, num_params: offset })
    }

    /// Parse string variations, then [`UtilitySpec::new`].
    ///
    /// # Errors
    /// [`ModelError::InvalidVariation`] plus everything `new` returns.
    pub fn from_strs(
        variations: &[(&str, &str)], num_params: &BTreeMap<String, usize>, num_items: usize,
        num_users: Option<usize>,
    ) -> ModelResult<Self> {
        let parsed = variations
            .iter()
            .map(|(name, v)| Ok((name.to_string(), v.parse::<CoefVariation>()?)))
            .collect::<ModelResult<Vec<_>>>()?;
        Self::new(parsed, num_params, num_items, num_users)
    }

    pub fn coefficients(&self) -> &[Coefficient] {
        &self.coefficients
    }

    /// Total free parameters.
    pub fn num_params(&self) -> usize {
        self.num_params
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    pub fn num_users(&self) -> Option<usize> {
        self.num_users
    }

    /// Labels of every free parameter in θ order.
    pub fn labels(&self) -> Vec<String> {
        self.coefficients.iter().flat_map(Coefficient::labels).collect()
    }

    /// Confirm `data` can be evaluated by this specification.
    ///
    /// # Errors
    /// - [`ModelError::ItemCountMismatch`] / [`ModelError::UserCountMismatch`].
    /// - [`ModelError::Data`] for a missing feature or user index.
    /// - [`ModelError::FeatureParamMismatch`] when a feature's width differs
    ///   from the declared parameter count.
    pub fn check_data(&self, data: &ChoiceDataset) -> ModelResult<()> {
        if data.num_items() != self.num_items {
            return Err(ModelError::ItemCountMismatch {
                expected: self.num_items,
                found: data.num_items(),
            });
        }
        for coef in &self.coefficients {
            if coef.variation().varies_by_user() {
                let expected = self.num_users.unwrap_or(0);
                match (data.user_index(), data.num_users()) {
                    (Some(_), Some(found)) if found == expected => {}
                    (Some(_), Some(found)) => {
                        return Err(ModelError::UserCountMismatch { expected, found });
                    }
                    _ => {
                        return Err(DataError::MissingUserIndex { name: coef.name().to_string() }
                            .into());
                    }
                }
            }
            if coef.name() == INTERCEPT {
                continue;
            }
            let found = data.feature(coef.name())?.tensor.num_params();
            if found != coef.num_params() {
                return Err(ModelError::FeatureParamMismatch {
                    name: coef.name().to_string(),
                    expected: coef.num_params(),
                    found,
                });
            }
        }
        Ok(())
    }

    /// Utilities `(len, num_items)` at `theta`.
    ///
    /// # Errors
    /// - [`ModelError::ThetaLengthMismatch`] for a wrongly sized block.
    /// - Data errors from feature expansion.
    pub fn utility(
        &self, theta: ArrayView1<'_, f64>, data: &ChoiceDataset,
    ) -> ModelResult<Array2<f64>> {
        self.check_theta(theta)?;
        let mut utility = Array2::<f64>::zeros((data.len(), self.num_items));
        for coef in &self.coefficients {
            let x = self.design(coef, data)?;
            coef.add_utility(&x, data.user_index(), theta, &mut utility)?;
        }
        Ok(utility)
    }

    /// Gradient of ℓ with respect to this block, given `∂ℓ/∂U`.
    ///
    /// # Errors
    /// Data errors from feature expansion.
    pub fn backprop(
        &self, d_utility: ArrayView2<'_, f64>, data: &ChoiceDataset,
    ) -> ModelResult<Array1<f64>> {
        let mut grad = Array1::<f64>::zeros(self.num_params);
        for coef in &self.coefficients {
            let x = self.design(coef, data)?;
            coef.add_gradient(&x, data.user_index(), d_utility, &mut grad)?;
        }
        Ok(grad)
    }

    /// Per-observation gradients `(len, num_params)`, given `∂ℓ_n/∂U_n`.
    ///
    /// # Errors
    /// Data errors from feature expansion.
    pub fn scores(
        &self, d_utility: ArrayView2<'_, f64>, data: &ChoiceDataset,
    ) -> ModelResult<Array2<f64>> {
        let mut scores = Array2::<f64>::zeros((data.len(), self.num_params));
        for coef in &self.coefficients {
            let x = self.design(coef, data)?;
            coef.add_scores(&x, data.user_index(), d_utility, &mut scores)?;
        }
        Ok(scores)
    }

    // ---- Helpers ----

    fn design(&self, coef: &Coefficient, data: &ChoiceDataset) -> ModelResult<Array3<f64>> {
        if coef.name() == INTERCEPT {
            return Ok(Array3::ones((data.len(), self.num_items, 1)));
        }
        Ok(data.feature_x(coef.name())?)
    }

    fn check_theta(&self, theta: ArrayView1<'_, f64>) -> ModelResult<()> {
        if theta.len() != self.num_params {
            return Err(ModelError::ThetaLengthMismatch {
                expected: self.num_params,
                actual: theta.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for UtilitySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for coef in &self.coefficients {
            writeln!(
                f,
                "  {}: variation={}, num_params={}, free={}",
                coef.name(),
                coef.variation(),
                coef.num_params(),
                coef.len()
            )?;
        }
        Ok(())
    }
}
