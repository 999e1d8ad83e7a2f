//! models — utility specifications and the logit family built on them.
//!
//! Purpose
//! -------
//! Describe how observed features enter utilities ([`Coefficient`],
//! [`UtilitySpec`]) and turn utilities into choice probabilities and
//! log-likelihoods ([`ConditionalLogitModel`], [`NestedLogitModel`]).
//!
//! Key behaviors
//! -------------
//! - A coefficient's [`CoefVariation`] decides whether it is shared, or
//!   varies by item, by user, or by both.
//! - Every model implements `LogLikelihood` with an analytic gradient, so
//!   L-BFGS and Adam can drive it, and [`ChoiceModel`] for the training
//!   loop and standard errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - θ is one flat vector; blocks follow the order in which coefficients
//!   were declared.
//! - Item-varying coefficients pin item 0 to zero, except the `-full`
//!   variants.
//!
//! Downstream usage
//! ----------------
//! - `training::run` is generic over [`ChoiceModel`].
//! - The Python bindings wrap [`ConditionalLogitModel`].

pub mod coefficient;
pub mod conditional_logit;
pub mod errors;
pub mod nested_logit;
pub mod spec;
pub mod traits;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::coefficient::{CoefVariation, Coefficient};
pub use self::conditional_logit::ConditionalLogitModel;
pub use self::errors::{ModelError, ModelResult};
pub use self::nested_logit::NestedLogitModel;
pub use self::spec::{INTERCEPT, UtilitySpec};
pub use self::traits::ChoiceModel;

pub mod prelude {
    pub use super::coefficient::CoefVariation;
    pub use super::conditional_logit::ConditionalLogitModel;
    pub use super::errors::{ModelError, ModelResult};
    pub use super::nested_logit::NestedLogitModel;
    pub use super::spec::UtilitySpec;
    pub use super::traits::ChoiceModel;
}
