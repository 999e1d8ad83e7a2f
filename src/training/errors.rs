//! Errors raised by the training loop.
//!
//! `RunError` rejects invalid run options and wraps failures from every
//! layer the loop drives: batching (`DataError`), model bookkeeping
//! (`ModelError`), optimization (`OptError`) and standard errors
//! (`InferenceError`).
use crate::{
    data::errors::DataError, inference::errors::InferenceError, models::errors::ModelError,
    optimization::errors::OptError,
};
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type RunResult<T> = Result<T, RunError>;

#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    // ---- Options ----
    /// Training needs at least one epoch.
    InvalidNumEpochs { value: usize },

    /// Algorithm name could not be parsed.
    InvalidAlgorithm { name: String },

    // ---- Wrapped layers ----
    Data(DataError),
    Model(ModelError),
    Opt(OptError),
    Inference(InferenceError),
}

impl std::error::Error for RunError {}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Options ----
            RunError::InvalidNumEpochs { value } => {
                write!(f, "Invalid number of epochs: {value}, must be at least 1")
            }
            RunError::InvalidAlgorithm { name } => write!(
                f,
                "Invalid training algorithm '{name}': expected 'adam' or 'lbfgs'"
            ),

            // ---- Wrapped layers ----
            RunError::Data(err) => write!(f, "Data error: {err}"),
            RunError::Model(err) => write!(f, "Model error: {err}"),
            RunError::Opt(err) => write!(f, "Optimization error: {err}"),
            RunError::Inference(err) => write!(f, "{err}"),
        }
    }
}

impl From<DataError> for RunError {
    fn from(err: DataError) -> Self {
        RunError::Data(err)
    }
}

impl From<ModelError> for RunError {
    fn from(err: ModelError) -> Self {
        RunError::Model(err)
    }
}

impl From<OptError> for RunError {
    fn from(err: OptError) -> Self {
        RunError::Opt(err)
    }
}

impl From<InferenceError> for RunError {
    fn from(err: InferenceError) -> Self {
        RunError::Inference(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<RunError> for PyErr {
    fn from(err: RunError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
