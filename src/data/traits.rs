//! Observation-level access shared by every dataset type.
use crate::data::errors::DataResult;

/// A collection of choice observations that can be cut into batches.
///
/// Implemented by [`ChoiceDataset`](crate::data::ChoiceDataset) and
/// [`JointDataset`](crate::data::JointDataset); the training loop and the
/// data loader are generic over it.
pub trait ChoiceData: Sized {
    /// Number of observations.
    fn num_obs(&self) -> usize;

    /// Dataset restricted to the observations at `indices`.
    fn select(&self, indices: &[usize]) -> DataResult<Self>;
}
