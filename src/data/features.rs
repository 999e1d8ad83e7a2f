//! data::features — feature kinds and storage for choice datasets.
//!
//! A feature's level is encoded in its name prefix, which decides both the
//! expected storage shape and how the feature is expanded per observation:
//!
//! | prefix      | kind                    | stored shape                    |
//! |-------------|-------------------------|---------------------------------|
//! | `item_`     | [`FeatureKind::Item`]     | `(num_items, k)`                |
//! | `user_`     | [`FeatureKind::User`]     | `(num_users, k)`                |
//! | `session_`  | [`FeatureKind::Session`]  | `(num_sessions, k)`             |
//! | `price_`    | [`FeatureKind::Price`]    | `(num_sessions, num_items, k)`  |
//! | `useritem_` | [`FeatureKind::UserItem`] | `(num_users, num_items, k)`     |
use crate::data::errors::{DataError, DataResult};
use ndarray::{Array2, Array3, Axis};

/// Level at which a feature varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Item,
    User,
    Session,
    Price,
    UserItem,
}

impl FeatureKind {
    /// Classify a feature from its name prefix.
    ///
    /// `useritem_` is tested before `user_` so the longer prefix wins.
    ///
    /// # Errors
    /// - [`DataError::UnknownFeaturePrefix`] for any other name.
    pub fn from_name(name: &str) -> DataResult<Self> {
        if name.starts_with("useritem_") {
            Ok(FeatureKind::UserItem)
        } else if name.starts_with("user_") {
            Ok(FeatureKind::User)
        } else if name.starts_with("item_") {
            Ok(FeatureKind::Item)
        } else if name.starts_with("session_") {
            Ok(FeatureKind::Session)
        } else if name.starts_with("price_") {
            Ok(FeatureKind::Price)
        } else {
            Err(DataError::UnknownFeaturePrefix { name: name.to_string() })
        }
    }

    /// `true` for kinds stored as 3-D tensors.
    pub fn is_grid(self) -> bool {
        matches!(self, FeatureKind::Price | FeatureKind::UserItem)
    }

    /// `true` for kinds indexed by user.
    pub fn needs_user_index(self) -> bool {
        matches!(self, FeatureKind::User | FeatureKind::UserItem)
    }
}

/// Raw feature values as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureTensor {
    /// Item, user or session table of shape `(rows, k)`.
    Flat(Array2<f64>),
    /// Session×item or user×item tensor of shape `(rows, num_items, k)`.
    Grid(Array3<f64>),
}

impl FeatureTensor {
    /// Number of parameter columns `k` (the trailing dimension).
    pub fn num_params(&self) -> usize {
        match self {
            FeatureTensor::Flat(t) => t.ncols(),
            FeatureTensor::Grid(t) => t.len_of(Axis(2)),
        }
    }

    /// Length of the leading (table) dimension.
    pub fn rows(&self) -> usize {
        match self {
            FeatureTensor::Flat(t) => t.nrows(),
            FeatureTensor::Grid(t) => t.len_of(Axis(0)),
        }
    }

    /// Raw shape, used by `Display` summaries.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            FeatureTensor::Flat(t) => t.shape().to_vec(),
            FeatureTensor::Grid(t) => t.shape().to_vec(),
        }
    }

    /// First non-finite entry, if any.
    pub fn first_non_finite(&self) -> Option<f64> {
        match self {
            FeatureTensor::Flat(t) => t.iter().copied().find(|v| !v.is_finite()),
            FeatureTensor::Grid(t) => t.iter().copied().find(|v| !v.is_finite()),
        }
    }
}

impl From<Array2<f64>> for FeatureTensor {
    fn from(value: Array2<f64>) -> Self {
        FeatureTensor::Flat(value)
    }
}

impl From<Array3<f64>> for FeatureTensor {
    fn from(value: Array3<f64>) -> Self {
        FeatureTensor::Grid(value)
    }
}

/// A validated feature: its kind plus raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub kind: FeatureKind,
    pub tensor: FeatureTensor,
}

impl Feature {
    /// Classify and validate a named tensor.
    ///
    /// Checks the layout matches the kind, that `k ≥ 1`, and that all values
    /// are finite. Dimension agreement with the dataset is checked by the
    /// dataset builder, which knows the table sizes.
    pub fn new(name: &str, tensor: FeatureTensor) -> DataResult<Self> {
        let kind = FeatureKind::from_name(name)?;
        match (&tensor, kind.is_grid()) {
            (FeatureTensor::Flat(_), true) => {
                return Err(DataError::FeatureLayout {
                    name: name.to_string(),
                    reason: "price_ and useritem_ features must be 3-D (rows, num_items, k)",
                });
            }
            (FeatureTensor::Grid(_), false) => {
                return Err(DataError::FeatureLayout {
                    name: name.to_string(),
                    reason: "item_, user_ and session_ features must be 2-D (rows, k)",
                });
            }
            _ => {}
        }
        if tensor.num_params() == 0 {
            return Err(DataError::EmptyFeature { name: name.to_string() });
        }
        if let Some(value) = tensor.first_non_finite() {
            return Err(DataError::NonFiniteFeature { name: name.to_string(), value });
        }
        Ok(Self { kind, tensor })
    }

    /// Item dimension of grid features; `None` for flat user/session tables.
    pub fn item_dim(&self) -> Option<usize> {
        match (&self.tensor, self.kind) {
            (FeatureTensor::Flat(t), FeatureKind::Item) => Some(t.nrows()),
            (FeatureTensor::Grid(t), _) => Some(t.len_of(Axis(1))),
            _ => None,
        }
    }
}
