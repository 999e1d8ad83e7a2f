//! data — choice observations, feature tables, batching and tabular input.
//!
//! Purpose
//! -------
//! Own everything the models read: validated choice datasets, joint datasets
//! for multi-level models, mini-batch index generation, and the long-table
//! utilities that turn CSV survey data into dense feature tensors.
//!
//! Key behaviors
//! -------------
//! - [`ChoiceDataset`] validates indices, feature shapes and availability once
//!   at construction; models can then index without re-checking bounds.
//! - [`JointDataset`] keeps several datasets over the same observations in
//!   lock-step.
//! - [`DataLoader`] yields per-epoch index batches; [`ChoiceData`] lets the
//!   training loop subset either dataset type.
//! - [`table`] loads long-format CSV and pivots it.
//!
//! Invariants & assumptions
//! ------------------------
//! - Datasets are immutable after construction; subsets share feature
//!   storage with their parent.
//! - Feature values are finite; missing pivot cells (`NaN`) must be filled or
//!   masked through availability before a dataset is built.
//!
//! Downstream usage
//! ----------------
//! - `models` expands features through [`ChoiceDataset::feature_x`].
//! - `training` batches any [`ChoiceData`] with [`DataLoader`].
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its validation rules; the
//!   integration test builds datasets from a CSV long table end to end.

pub mod dataset;
pub mod errors;
pub mod features;
pub mod joint;
pub mod loader;
pub mod table;
pub mod traits;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::dataset::{ChoiceDataset, ChoiceDatasetBuilder};
pub use self::errors::{DataError, DataResult};
pub use self::features::{Feature, FeatureKind, FeatureTensor};
pub use self::joint::JointDataset;
pub use self::loader::{DataLoader, create_data_loader};
pub use self::table::{
    LongTable, chosen_alternatives, encode_labels, group_first, pivot3d, pivot_availability,
};
pub use self::traits::ChoiceData;

pub mod prelude {
    pub use super::dataset::ChoiceDataset;
    pub use super::errors::{DataError, DataResult};
    pub use super::features::FeatureTensor;
    pub use super::joint::JointDataset;
    pub use super::loader::DataLoader;
    pub use super::table::{LongTable, pivot3d};
    pub use super::traits::ChoiceData;
}
