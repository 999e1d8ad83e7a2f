//! data::errors — validation and IO errors for choice datasets.
//!
//! Purpose
//! -------
//! Collect every failure that can occur while assembling, slicing, batching,
//! or loading choice data into one enum, [`DataError`], with a shared result
//! alias [`DataResult<T>`].
//!
//! Conventions
//! -----------
//! - Variants carry the offending name/index/value so messages are actionable
//!   without a debugger.
//! - `csv::Error` is not `Clone`, so CSV failures are stored as text.
//! - With the `python-bindings` feature, `From<DataError> for PyErr` maps every
//!   variant to a `ValueError`.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type DataResult<T> = Result<T, DataError>;

/// Error type for the `data` layer.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    // ---- Observations and indices ----
    /// Dataset must contain at least one observation.
    EmptyDataset,

    /// An index array does not have one entry per observation.
    IndexLengthMismatch { name: &'static str, expected: usize, found: usize },

    /// An index refers past the end of the table it indexes.
    IndexOutOfRange { name: &'static str, position: usize, value: usize, bound: usize },

    /// A subset request contained no indices.
    EmptySubset,

    // ---- Features ----
    /// Feature name does not start with a recognised prefix.
    UnknownFeaturePrefix { name: String },

    /// Feature was registered twice.
    DuplicateFeature { name: String },

    /// Feature has a 2-D layout where 3-D is required, or vice versa.
    FeatureLayout { name: String, reason: &'static str },

    /// A feature dimension disagrees with the dataset.
    FeatureShapeMismatch { name: String, dim: &'static str, expected: usize, found: usize },

    /// Feature has no parameter columns.
    EmptyFeature { name: String },

    /// Feature contains NaN or an infinite value.
    NonFiniteFeature { name: String, value: f64 },

    /// Feature is not present in the dataset.
    MissingFeature { name: String },

    /// User-level features require a user index.
    MissingUserIndex { name: String },

    // ---- Availability ----
    /// Availability matrix must be `num_sessions × num_items`.
    AvailabilityShapeMismatch { expected: (usize, usize), found: (usize, usize) },

    /// The chosen item was marked unavailable in its session.
    ChosenItemUnavailable { observation: usize, item: usize },

    // ---- Joint datasets ----
    /// A joint dataset needs at least one member.
    EmptyJoint,

    /// Member datasets must have the same number of observations.
    JointLengthMismatch { name: String, expected: usize, found: usize },

    /// Member name registered twice.
    DuplicateDataset { name: String },

    /// Requested member does not exist.
    MissingDataset { name: String },

    // ---- Tables ----
    /// Failure reported by the CSV reader.
    Csv { text: String },

    /// Table has no rows.
    EmptyTable,

    /// Column is not present in the table.
    MissingColumn { name: String },

    /// Column lengths disagree.
    RaggedColumns { name: String, expected: usize, found: usize },

    /// Cell could not be parsed as a number.
    ParseNumber { column: String, row: usize, value: String },

    /// Two rows share the same pivot key pair.
    DuplicatePivotEntry { dim0: String, dim1: String },

    /// A case does not have exactly one chosen alternative.
    AmbiguousChoice { case: String, count: usize },

    /// Label is not part of the provided vocabulary.
    UnknownLabel { value: String },

    // ---- Batching ----
    /// Batch size must be at least one.
    InvalidBatchSize { batch_size: usize },
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Observations and indices ----
            DataError::EmptyDataset => write!(f, "Dataset must contain at least one observation"),
            DataError::IndexLengthMismatch { name, expected, found } => {
                write!(f, "{name} length mismatch: expected {expected}, found {found}")
            }
            DataError::IndexOutOfRange { name, position, value, bound } => {
                write!(f, "{name}[{position}] = {value} is out of range (must be < {bound})")
            }
            DataError::EmptySubset => write!(f, "Subset indices must not be empty"),

            // ---- Features ----
            DataError::UnknownFeaturePrefix { name } => write!(
                f,
                "Feature '{name}' has no recognised prefix (item_, user_, session_, price_, useritem_)"
            ),
            DataError::DuplicateFeature { name } => write!(f, "Feature '{name}' registered twice"),
            DataError::FeatureLayout { name, reason } => {
                write!(f, "Feature '{name}' has the wrong layout: {reason}")
            }
            DataError::FeatureShapeMismatch { name, dim, expected, found } => {
                write!(f, "Feature '{name}': {dim} dimension is {found}, expected {expected}")
            }
            DataError::EmptyFeature { name } => {
                write!(f, "Feature '{name}' must have at least one parameter column")
            }
            DataError::NonFiniteFeature { name, value } => {
                write!(f, "Feature '{name}' contains a non-finite value: {value}")
            }
            DataError::MissingFeature { name } => write!(f, "Feature '{name}' not found"),
            DataError::MissingUserIndex { name } => {
                write!(f, "'{name}' requires a user index but the dataset has none")
            }

            // ---- Availability ----
            DataError::AvailabilityShapeMismatch { expected, found } => write!(
                f,
                "Item availability shape mismatch: expected {expected:?}, found {found:?}"
            ),
            DataError::ChosenItemUnavailable { observation, item } => {
                write!(f, "Observation {observation} chose item {item}, which is unavailable")
            }

            // ---- Joint datasets ----
            DataError::EmptyJoint => write!(f, "Joint dataset must contain at least one member"),
            DataError::JointLengthMismatch { name, expected, found } => write!(
                f,
                "Joint member '{name}' has {found} observations, expected {expected}"
            ),
            DataError::DuplicateDataset { name } => {
                write!(f, "Joint member '{name}' registered twice")
            }
            DataError::MissingDataset { name } => write!(f, "Joint member '{name}' not found"),

            // ---- Tables ----
            DataError::Csv { text } => write!(f, "CSV error: {text}"),
            DataError::EmptyTable => write!(f, "Table has no rows"),
            DataError::MissingColumn { name } => write!(f, "Column '{name}' not found"),
            DataError::RaggedColumns { name, expected, found } => {
                write!(f, "Column '{name}' has {found} rows, expected {expected}")
            }
            DataError::ParseNumber { column, row, value } => {
                write!(f, "Column '{column}' row {row}: cannot parse '{value}' as a number")
            }
            DataError::DuplicatePivotEntry { dim0, dim1 } => {
                write!(f, "Duplicate pivot entry for ({dim0}, {dim1})")
            }
            DataError::AmbiguousChoice { case, count } => {
                write!(f, "Case '{case}' has {count} chosen alternatives, expected exactly one")
            }
            DataError::UnknownLabel { value } => write!(f, "Unknown label '{value}'"),

            // ---- Batching ----
            DataError::InvalidBatchSize { batch_size } => {
                write!(f, "Invalid batch size {batch_size}: must be at least one")
            }
        }
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::Csv { text: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl From<DataError> for PyErr {
    fn from(err: DataError) -> PyErr {
        PyValueError::new_err(format!("DataError: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Display messages for representative variants.
    // - Conversion of CSV reader failures into `DataError::Csv`.
    //
    // They intentionally DO NOT cover:
    // - The validation logic that raises these errors (tested next to it).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure index errors name the offending array, position and bound.
    //
    // Given
    // -----
    // - An `IndexOutOfRange` error for `item_index`.
    //
    // Expect
    // ------
    // - The rendered message contains every field.
    fn index_out_of_range_message_names_all_fields() {
        // Arrange
        let err = DataError::IndexOutOfRange {
            name: "item_index",
            position: 3,
            value: 9,
            bound: 4,
        };

        // Act
        let msg = err.to_string();

        // Assert
        assert_eq!(msg, "item_index[3] = 9 is out of range (must be < 4)");
    }

    #[test]
    // Purpose
    // -------
    // Verify that a CSV parse failure is carried as text.
    //
    // Given
    // -----
    // - A CSV reader over a ragged record set.
    //
    // Expect
    // ------
    // - Converting the reader error yields `DataError::Csv`.
    fn csv_error_converts_to_text_variant() {
        // Arrange
        let raw = "a,b\n1,2\n3\n";
        let mut reader = csv::Reader::from_reader(raw.as_bytes());

        // Act
        let err = reader
            .records()
            .find_map(|r| r.err())
            .map(DataError::from)
            .expect("ragged CSV should fail");

        // Assert
        assert!(matches!(err, DataError::Csv { .. }));
    }
}
