//! Error handling for post-estimation inference.
//!
//! `InferenceError` covers malformed score matrices, cluster assignments and
//! report inputs. Failures of the underlying Hessian computation arrive as
//! `OptError` and model evaluation failures as `ModelError`; both are wrapped
//! so callers see a single error type. `InferenceResult<T>` is the shared
//! alias.
use crate::{models::errors::ModelError, optimization::errors::OptError};
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Unified error type for inference routines.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Scores and covariance ----
    /// Score matrix has no rows.
    EmptyScores,

    /// Score covariance must be `p × p` for `p` parameters.
    ScoreShapeMismatch { expected: (usize, usize), found: (usize, usize) },

    /// Cluster ids must have one entry per observation.
    ClusterLengthMismatch { expected: usize, found: usize },

    /// Clustered covariance needs at least two clusters.
    TooFewClusters { found: usize },

    // ---- Reports ----
    /// Labels, estimates and standard errors must have equal lengths.
    ReportLengthMismatch { labels: usize, estimates: usize, std_errs: usize },

    /// Reference distribution could not be built.
    Distribution(String),

    /// Writing a report failed.
    Io(String),

    // ---- Wrapped layers ----
    Opt(OptError),
    Model(ModelError),
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Scores and covariance ----
            InferenceError::EmptyScores => write!(f, "Inference Error: score matrix is empty"),
            InferenceError::ScoreShapeMismatch { expected, found } => write!(
                f,
                "Inference Error: score covariance has shape {found:?}, expected {expected:?}"
            ),
            InferenceError::ClusterLengthMismatch { expected, found } => write!(
                f,
                "Inference Error: {found} cluster ids given for {expected} observations"
            ),
            InferenceError::TooFewClusters { found } => write!(
                f,
                "Inference Error: clustered covariance needs at least 2 clusters, found {found}"
            ),

            // ---- Reports ----
            InferenceError::ReportLengthMismatch { labels, estimates, std_errs } => write!(
                f,
                "Inference Error: {labels} labels, {estimates} estimates and {std_errs} \
                 standard errors"
            ),
            InferenceError::Distribution(msg) => write!(f, "Inference Error: {msg}"),
            InferenceError::Io(msg) => write!(f, "Inference Error: failed to write report: {msg}"),

            // ---- Wrapped layers ----
            InferenceError::Opt(err) => write!(f, "Inference Error: {err}"),
            InferenceError::Model(err) => write!(f, "Inference Error: {err}"),
        }
    }
}

impl From<OptError> for InferenceError {
    fn from(err: OptError) -> Self {
        InferenceError::Opt(err)
    }
}

impl From<ModelError> for InferenceError {
    fn from(err: ModelError) -> Self {
        InferenceError::Model(err)
    }
}

impl From<csv::Error> for InferenceError {
    fn from(err: csv::Error) -> Self {
        InferenceError::Io(err.to_string())
    }
}

impl From<std::io::Error> for InferenceError {
    fn from(err: std::io::Error) -> Self {
        InferenceError::Io(err.to_string())
    }
}

#[cfg(feature = "python-bindings")]
impl From<InferenceError> for PyErr {
    fn from(err: InferenceError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
