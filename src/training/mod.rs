//! training — one-call training loop with standard errors and a report.
//!
//! Purpose
//! -------
//! Provide [`run`], which trains a copy of any [`ChoiceModel`] with Adam or
//! L-BFGS, computes standard errors at the estimate, and returns the trained
//! model with a [`CoefficientReport`].
//!
//! Downstream usage
//! ----------------
//! - Build a model and a dataset, pick [`RunOptions`] (or the defaults) and
//!   call [`run`]. Progress is reported through the `log` facade; install a
//!   logger to see it.
//!
//! [`ChoiceModel`]: crate::models::ChoiceModel
//! [`CoefficientReport`]: crate::inference::CoefficientReport

pub mod errors;
pub mod options;
pub mod run;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{RunError, RunResult};
pub use self::options::{RunOptions, TrainingAlgorithm};
pub use self::run::{RunOutcome, run};

pub mod prelude {
    pub use super::errors::{RunError, RunResult};
    pub use super::options::{RunOptions, TrainingAlgorithm};
    pub use super::run::{RunOutcome, run};
}
