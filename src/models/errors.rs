//! models::errors — specification and evaluation errors for choice models.
//!
//! [`ModelError`] covers malformed utility specifications, nest structures,
//! parameter vectors that do not fit a model, and datasets that do not match
//! the model they are evaluated with. Inside the optimizer it is carried by
//! `OptError` (see `optimization::errors`).
use crate::data::errors::DataError;
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Utility specification ----
    /// Variation name could not be parsed.
    InvalidVariation { name: String },

    /// A utility specification needs at least one coefficient.
    EmptySpec,

    /// Coefficient has no entry in the parameter-count map.
    MissingNumParams { name: String },

    /// Coefficient declared with zero parameters.
    ZeroNumParams { name: String },

    /// The intercept must have exactly one parameter.
    InterceptParams { found: usize },

    /// User-varying coefficient without a user count.
    MissingNumUsers { name: String },

    /// Coefficient registered twice.
    DuplicateCoefficient { name: String },

    /// Choice models need at least two items.
    TooFewItems { num_items: usize },

    // ---- Parameters ----
    /// Parameter vector length does not match the model.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// Parameter entries must be finite.
    InvalidThetaInput { index: usize, value: f64 },

    /// Model has not been fitted yet.
    ModelNotFitted,

    // ---- Data compatibility ----
    /// Feature width differs from the declared parameter count.
    FeatureParamMismatch { name: String, expected: usize, found: usize },

    /// Dataset item count differs from the model's.
    ItemCountMismatch { expected: usize, found: usize },

    /// Dataset user count differs from the model's.
    UserCountMismatch { expected: usize, found: usize },

    /// An observation has no available item.
    NoAvailableItems { observation: usize },

    /// Wrapped data-layer failure.
    Data(DataError),

    // ---- Nests ----
    /// Nest lists no items.
    EmptyNest { category: usize },

    /// Item does not belong to any nest.
    ItemNotInNest { item: usize },

    /// Item belongs to more than one nest.
    ItemInMultipleNests { item: usize },

    /// Category-level specification does not have one item per nest.
    NestCountMismatch { expected: usize, found: usize },
}

impl std::error::Error for ModelError {}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Utility specification ----
            ModelError::InvalidVariation { name } => write!(
                f,
                "Invalid coefficient variation '{name}': expected constant, item, item-full, \
                 user, user-item or user-item-full"
            ),
            ModelError::EmptySpec => write!(f, "Utility specification has no coefficients"),
            ModelError::MissingNumParams { name } => {
                write!(f, "No parameter count given for coefficient '{name}'")
            }
            ModelError::ZeroNumParams { name } => {
                write!(f, "Coefficient '{name}' must have at least one parameter")
            }
            ModelError::InterceptParams { found } => {
                write!(f, "Intercept must have exactly one parameter, found {found}")
            }
            ModelError::MissingNumUsers { name } => {
                write!(f, "Coefficient '{name}' varies by user but num_users is not set")
            }
            ModelError::DuplicateCoefficient { name } => {
                write!(f, "Coefficient '{name}' registered twice")
            }
            ModelError::TooFewItems { num_items } => {
                write!(f, "Choice models need at least two items, found {num_items}")
            }

            // ---- Parameters ----
            ModelError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            ModelError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid theta input at index {index}: {value}, must be finite")
            }
            ModelError::ModelNotFitted => write!(f, "Model has not been fitted"),

            // ---- Data compatibility ----
            ModelError::FeatureParamMismatch { name, expected, found } => write!(
                f,
                "Feature '{name}' has {found} columns but the coefficient expects {expected}"
            ),
            ModelError::ItemCountMismatch { expected, found } => {
                write!(f, "Dataset has {found} items, model expects {expected}")
            }
            ModelError::UserCountMismatch { expected, found } => {
                write!(f, "Dataset has {found} users, model expects {expected}")
            }
            ModelError::NoAvailableItems { observation } => {
                write!(f, "Observation {observation} has no available item")
            }
            ModelError::Data(err) => write!(f, "{err}"),

            // ---- Nests ----
            ModelError::EmptyNest { category } => write!(f, "Nest {category} contains no items"),
            ModelError::ItemNotInNest { item } => write!(f, "Item {item} is not in any nest"),
            ModelError::ItemInMultipleNests { item } => {
                write!(f, "Item {item} appears in more than one nest")
            }
            ModelError::NestCountMismatch { expected, found } => write!(
                f,
                "Category specification covers {found} categories, expected {expected} nests"
            ),
        }
    }
}

impl From<DataError> for ModelError {
    fn from(err: DataError) -> Self {
        ModelError::Data(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<ModelError> for PyErr {
    fn from(err: ModelError) -> PyErr {
        PyValueError::new_err(format!("ModelError: {err}"))
    }
}
