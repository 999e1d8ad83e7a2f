//! training::options — configuration of a training run.
//!
//! Purpose
//! -------
//! Bundle everything [`run`](super::run) needs besides the model and the
//! data: which algorithm fits the coefficients, the mini-batch schedule for
//! Adam, and which covariance the report uses.
//!
//! Key behaviors
//! -------------
//! - [`TrainingAlgorithm::Adam`] reproduces the classic template: mini-batch
//!   Adam on the mean negative log-likelihood for a fixed number of epochs.
//! - [`TrainingAlgorithm::Lbfgs`] replaces the epoch loop by one full-batch
//!   L-BFGS fit with the given [`MLEOptions`].
//! - [`RunOptions::default`]: full batch, learning rate 0.01, 5000 epochs,
//!   shuffled, unseeded, Adam, classical standard errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`RunOptions::new`] validates the learning rate (through
//!   [`AdamOptions`]), the epoch count and the batch size; fields set by hand
//!   are validated again when the run starts.
use crate::{
    data::errors::DataError,
    inference::scores::CovarianceType,
    optimization::{adam::AdamOptions, loglik_optimizer::MLEOptions},
    training::errors::{RunError, RunResult},
};
use std::{fmt, str::FromStr};

/// Optimizer used by [`run`](super::run).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TrainingAlgorithm {
    #[default]
    Adam,
    Lbfgs(MLEOptions),
}

impl FromStr for TrainingAlgorithm {
    type Err = RunError;

    /// `"adam"`, or `"lbfgs"` / `"l-bfgs"` with default [`MLEOptions`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "adam" => Ok(TrainingAlgorithm::Adam),
            "lbfgs" => Ok(TrainingAlgorithm::Lbfgs(MLEOptions::default())),
            _ => Err(RunError::InvalidAlgorithm { name: s.to_string() }),
        }
    }
}

impl fmt::Display for TrainingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingAlgorithm::Adam => write!(f, "Adam"),
            TrainingAlgorithm::Lbfgs(opts) => write!(f, "L-BFGS ({:?})", opts.line_searcher),
        }
    }
}

/// Options for one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Mini-batch size; `None` trains on the full data every step.
    pub batch_size: Option<usize>,
    pub learning_rate: f64,
    pub num_epochs: usize,
    pub shuffle: bool,
    /// Seed for batch shuffling.
    pub seed: Option<u64>,
    pub algorithm: TrainingAlgorithm,
    pub covariance: CovarianceType,
}

impl RunOptions {
    /// Validated constructor.
    ///
    /// # Errors
    /// - [`RunError::Data`] with `InvalidBatchSize` for `Some(0)`.
    /// - [`RunError::Opt`] with `InvalidLearningRate`.
    /// - [`RunError::InvalidNumEpochs`] for zero epochs.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        batch_size: Option<usize>, learning_rate: f64, num_epochs: usize, shuffle: bool,
        seed: Option<u64>, algorithm: TrainingAlgorithm, covariance: CovarianceType,
    ) -> RunResult<Self> {
        let opts =
            Self { batch_size, learning_rate, num_epochs, shuffle, seed, algorithm, covariance };
        opts.validate()?;
        Ok(opts)
    }

    /// Adam hyper-parameters for this run.
    ///
    /// # Errors
    /// [`RunError::Opt`] for an invalid learning rate.
    pub fn adam_options(&self) -> RunResult<AdamOptions> {
        Ok(AdamOptions::with_learning_rate(self.learning_rate)?)
    }

    pub(crate) fn validate(&self) -> RunResult<()> {
        if self.batch_size == Some(0) {
            return Err(DataError::InvalidBatchSize { batch_size: 0 }.into());
        }
        if self.num_epochs == 0 {
            return Err(RunError::InvalidNumEpochs { value: 0 });
        }
        self.adam_options()?;
        Ok(())
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            batch_size: None,
            learning_rate: 0.01,
            num_epochs: 5000,
            shuffle: true,
            seed: None,
            algorithm: TrainingAlgorithm::Adam,
            covariance: CovarianceType::Classical,
        }
    }
}
