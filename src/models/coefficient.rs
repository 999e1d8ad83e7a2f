//! models::coefficient — how one coefficient varies and where it lives in θ.
//!
//! A coefficient multiplies one expanded feature `x[n, i, p]` (observation,
//! item, feature column). Its *variation* decides whether the multiplier
//! depends on the item, on the user, on both, or on neither:
//!
//! | variation        | β indexed by      | free parameters |
//! |------------------|-------------------|-----------------|
//! | `constant`       | `p`               | `k`             |
//! | `item`           | `(i, p)`, i ≥ 1   | `(I-1)·k`       |
//! | `item-full`      | `(i, p)`          | `I·k`           |
//! | `user`           | `(u, p)`          | `U·k`           |
//! | `user-item`      | `(u, i, p)`, i ≥ 1| `U·(I-1)·k`     |
//! | `user-item-full` | `(u, i, p)`       | `U·I·k`         |
//!
//! For `item` and `user-item` the coefficient of item 0 is pinned to zero,
//! the usual identification restriction for item-specific terms.
//! Free parameters are stored row-major over `(user, item, p)` starting at
//! the coefficient's `offset` inside the owning specification's block.
use crate::{
    data::errors::DataError,
    models::errors::{ModelError, ModelResult},
};
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2};
use std::{fmt, str::FromStr};

/// How a coefficient varies across items and users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoefVariation {
    Constant,
    Item,
    ItemFull,
    User,
    UserItem,
    UserItemFull,
}

impl CoefVariation {
    pub fn varies_by_user(self) -> bool {
        matches!(self, CoefVariation::User | CoefVariation::UserItem | CoefVariation::UserItemFull)
    }

    pub fn varies_by_item(self) -> bool {
        !matches!(self, CoefVariation::Constant | CoefVariation::User)
    }

    /// `true` when item 0 carries no free parameter.
    pub fn pins_first_item(self) -> bool {
        matches!(self, CoefVariation::Item | CoefVariation::UserItem)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CoefVariation::Constant => "constant",
            CoefVariation::Item => "item",
            CoefVariation::ItemFull => "item-full",
            CoefVariation::User => "user",
            CoefVariation::UserItem => "user-item",
            CoefVariation::UserItemFull => "user-item-full",
        }
    }
}

impl FromStr for CoefVariation {
    type Err = ModelError;

    /// Case-insensitive; `_` and `-` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "constant" => Ok(CoefVariation::Constant),
            "item" => Ok(CoefVariation::Item),
            "item-full" => Ok(CoefVariation::ItemFull),
            "user" => Ok(CoefVariation::User),
            "user-item" => Ok(CoefVariation::UserItem),
            "user-item-full" => Ok(CoefVariation::UserItemFull),
            _ => Err(ModelError::InvalidVariation { name: s.to_string() }),
        }
    }
}

impl fmt::Display for CoefVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One coefficient of a utility specification.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    name: String,
    variation: CoefVariation,
    num_params: usize,
    num_items: usize,
    num_users: usize,
    offset: usize,
}

impl Coefficient {
    /// Build a coefficient whose first free parameter sits at `offset`.
    ///
    /// `num_users` is only read for user-varying coefficients.
    ///
    /// # Errors
    /// - [`ModelError::ZeroNumParams`] when `num_params == 0`.
    /// - [`ModelError::MissingNumUsers`] for user variations without users.
    pub fn new(
        name: impl Into<String>, variation: CoefVariation, num_params: usize, num_items: usize,
        num_users: Option<usize>, offset: usize,
    ) -> ModelResult<Self> {
        let name = name.into();
        if num_params == 0 {
            return Err(ModelError::ZeroNumParams { name });
        }
        let num_users = if variation.varies_by_user() {
            match num_users {
                Some(u) if u > 0 => u,
                _ => return Err(ModelError::MissingNumUsers { name }),
            }
        } else {
            1
        };
        Ok(Self { name, variation, num_params, num_items, num_users, offset })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variation(&self) -> CoefVariation {
        self.variation
    }

    /// Feature width `k`.
    pub fn num_params(&self) -> usize {
        self.num_params
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of item blocks that carry free parameters.
    fn item_blocks(&self) -> usize {
        match self.variation {
            CoefVariation::Constant | CoefVariation::User => 1,
            CoefVariation::Item | CoefVariation::UserItem => self.num_items.saturating_sub(1),
            CoefVariation::ItemFull | CoefVariation::UserItemFull => self.num_items,
        }
    }

    /// Number of free parameters this coefficient owns in θ.
    pub fn len(&self) -> usize {
        self.num_users * self.item_blocks() * self.num_params
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// θ index of `β(user, item, p)`, or `None` for the pinned item 0.
    ///
    /// `user` is ignored for variations that do not depend on the user.
    pub fn slot(&self, user: usize, item: usize, p: usize) -> Option<usize> {
        let block = match self.variation {
            CoefVariation::Constant | CoefVariation::User => 0,
            CoefVariation::Item | CoefVariation::UserItem => item.checked_sub(1)?,
            CoefVariation::ItemFull | CoefVariation::UserItemFull => item,
        };
        let u = if self.variation.varies_by_user() { user } else { 0 };
        Some(self.offset + (u * self.item_blocks() + block) * self.num_params + p)
    }

    /// `U[n, i] += Σ_p x[n, i, p] · β(user_n, i, p)`.
    ///
    /// `theta` is the owning specification's block.
    ///
    /// # Errors
    /// [`ModelError::Data`] wrapping `MissingUserIndex` when the
    /// coefficient varies by user and `users` is `None`.
    pub fn add_utility(
        &self, x: &Array3<f64>, users: Option<&Array1<usize>>, theta: ArrayView1<'_, f64>,
        utility: &mut Array2<f64>,
    ) -> ModelResult<()> {
        let (len, num_items, k) = x.dim();
        for n in 0..len {
            let user = self.user_of(n, users)?;
            for i in 0..num_items {
                let mut acc = 0.0;
                for p in 0..k {
                    if let Some(s) = self.slot(user, i, p) {
                        acc += x[[n, i, p]] * theta[s];
                    }
                }
                utility[[n, i]] += acc;
            }
        }
        Ok(())
    }

    /// `grad[slot(u_n, i, p)] += Σ_n d_utility[n, i] · x[n, i, p]`.
    ///
    /// # Errors
    /// As [`Coefficient::add_utility`].
    pub fn add_gradient(
        &self, x: &Array3<f64>, users: Option<&Array1<usize>>, d_utility: ArrayView2<'_, f64>,
        grad: &mut Array1<f64>,
    ) -> ModelResult<()> {
        self.for_each_term(x, users, d_utility, |_, s, value| grad[s] += value)
    }

    /// Per-observation version of [`Coefficient::add_gradient`]: row `n` of
    /// `scores` receives observation `n`'s contribution.
    ///
    /// # Errors
    /// As [`Coefficient::add_utility`].
    pub fn add_scores(
        &self, x: &Array3<f64>, users: Option<&Array1<usize>>, d_utility: ArrayView2<'_, f64>,
        scores: &mut Array2<f64>,
    ) -> ModelResult<()> {
        self.for_each_term(x, users, d_utility, |n, s, value| scores[[n, s]] += value)
    }

    /// Report labels `"{name}_{j}"`, one per free parameter.
    pub fn labels(&self) -> Vec<String> {
        (0..self.len()).map(|j| format!("{}_{j}", self.name)).collect()
    }

    // ---- Helpers ----

    fn for_each_term<G: FnMut(usize, usize, f64)>(
        &self, x: &Array3<f64>, users: Option<&Array1<usize>>, d_utility: ArrayView2<'_, f64>,
        mut sink: G,
    ) -> ModelResult<()> {
        let (len, num_items, k) = x.dim();
        for n in 0..len {
            let user = self.user_of(n, users)?;
            for i in 0..num_items {
                let d = d_utility[[n, i]];
                if d == 0.0 {
                    continue;
                }
                for p in 0..k {
                    if let Some(s) = self.slot(user, i, p) {
                        sink(n, s, d * x[[n, i, p]]);
                    }
                }
            }
        }
        Ok(())
    }

    fn user_of(&self, n: usize, users: Option<&Array1<usize>>) -> ModelResult<usize> {
        if !self.variation.varies_by_user() {
            return Ok(0);
        }
        users
            .map(|u| u[n])
            .ok_or_else(|| ModelError::Data(DataError::MissingUserIndex { name: self.name.clone() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Parsing of variation names.
    // - Parameter counts and θ slots for every variation.
    // - Utility contributions and gradients against hand-computed values.
    //
    // They intentionally DO NOT cover:
    // - Feature lookup and data checks (see `spec`).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure variation names parse loosely and reject unknown names.
    //
    // Given
    // -----
    // - "Item_Full", " user-item " and "nested".
    //
    // Expect
    // ------
    // - `ItemFull`, `UserItem`, and `InvalidVariation`.
    fn variation_parses_loosely() {
        // Act / Assert
        assert_eq!("Item_Full".parse::<CoefVariation>().expect("valid"), CoefVariation::ItemFull);
        assert_eq!(" user-item ".parse::<CoefVariation>().expect("valid"), CoefVariation::UserItem);
        assert!(matches!(
            "nested".parse::<CoefVariation>(),
            Err(ModelError::InvalidVariation { .. })
        ));
        assert_eq!(CoefVariation::UserItemFull.to_string(), "user-item-full");
    }

    #[test]
    // Purpose
    // -------
    // Verify free-parameter counts for every variation.
    //
    // Given
    // -----
    // - k = 2, I = 4, U = 3.
    //
    // Expect
    // ------
    // - 2, 6, 8, 6, 18 and 24 parameters respectively.
    fn parameter_counts_per_variation() {
        // Arrange
        let cases = [
            (CoefVariation::Constant, 2),
            (CoefVariation::Item, 6),
            (CoefVariation::ItemFull, 8),
            (CoefVariation::User, 6),
            (CoefVariation::UserItem, 18),
            (CoefVariation::UserItemFull, 24),
        ];

        for (variation, expected) in cases {
            // Act
            let coef = Coefficient::new("c", variation, 2, 4, Some(3), 0).expect("valid");

            // Assert
            assert_eq!(coef.len(), expected, "{variation}");
            assert_eq!(coef.labels().len(), expected);
        }
    }

    #[test]
    // Purpose
    // -------
    // Check slot layout and the pinned zero for item 0.
    //
    // Given
    // -----
    // - A user-item coefficient with k = 2, I = 3, U = 2 at offset 5.
    //
    // Expect
    // ------
    // - Item 0 has no slot; (u=1, i=2, p=1) maps to 5 + (1·2 + 1)·2 + 1 = 12.
    fn slots_are_row_major_with_pinned_first_item() {
        // Arrange
        let coef =
            Coefficient::new("c", CoefVariation::UserItem, 2, 3, Some(2), 5).expect("valid");

        // Act / Assert
        assert_eq!(coef.slot(0, 0, 0), None);
        assert_eq!(coef.slot(0, 1, 0), Some(5));
        assert_eq!(coef.slot(1, 2, 1), Some(12));
        assert_eq!(coef.len(), 8);
    }

    #[test]
    // Purpose
    // -------
    // Verify utility and gradient of an item-specific coefficient.
    //
    // Given
    // -----
    // - One observation, 3 items, k = 1, x = [1, 2, 3], θ = [0.5, -1.0].
    //
    // Expect
    // ------
    // - U = [0, 1, -3]; with dU = [1, 1, 1] the gradient is [2, 3].
    fn item_coefficient_utility_and_gradient() {
        // Arrange
        let coef = Coefficient::new("item_x", CoefVariation::Item, 1, 3, None, 0).expect("valid");
        let x = Array3::from_shape_vec((1, 3, 1), vec![1.0, 2.0, 3.0]).expect("shape");
        let theta = array![0.5, -1.0];
        let mut utility = Array2::<f64>::zeros((1, 3));
        let mut grad = Array1::<f64>::zeros(2);

        // Act
        coef.add_utility(&x, None, theta.view(), &mut utility).expect("utility");
        coef.add_gradient(&x, None, array![[1.0, 1.0, 1.0]].view(), &mut grad)
            .expect("gradient");

        // Assert
        assert_eq!(utility, array![[0.0, 1.0, -3.0]]);
        assert_eq!(grad, array![2.0, 3.0]);
    }

    #[test]
    // Purpose
    // -------
    // Ensure user-varying coefficients pick the observation's user and fail
    // without a user index.
    //
    // Given
    // -----
    // - A user coefficient, k = 1, two users, θ = [2, -1], x ≡ 1, users [1, 0].
    //
    // Expect
    // ------
    // - Rows of U are -1 and 2; scores land in the matching columns.
    // - `users = None` yields `ModelError::Data(MissingUserIndex)`.
    fn user_coefficient_reads_user_index() {
        // Arrange
        let coef = Coefficient::new("user_x", CoefVariation::User, 1, 2, Some(2), 0).expect("ok");
        let x = Array3::<f64>::ones((2, 2, 1));
        let users = array![1, 0];
        let mut utility = Array2::<f64>::zeros((2, 2));
        let mut scores = Array2::<f64>::zeros((2, 2));

        // Act
        coef.add_utility(&x, Some(&users), array![2.0, -1.0].view(), &mut utility)
            .expect("utility");
        coef.add_scores(&x, Some(&users), array![[1.0, 0.0], [0.0, 1.0]].view(), &mut scores)
            .expect("scores");
        let err = coef
            .add_utility(&x, None, array![2.0, -1.0].view(), &mut utility)
            .expect_err("missing users");

        // Assert
        assert_eq!(utility.row(0).to_vec(), vec![-1.0, -1.0]);
        assert_eq!(utility.row(1).to_vec(), vec![2.0, 2.0]);
        assert_eq!(scores, array![[0.0, 1.0], [1.0, 0.0]]);
        assert!(matches!(err, ModelError::Data(_)));
    }
}
