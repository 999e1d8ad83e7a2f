//! loglik_optimizer::types — numeric aliases and pre-wired L-BFGS solvers.
//!
//! Purpose
//! -------
//! Give the rest of the optimizer one vocabulary for parameter vectors,
//! gradients, Hessians and costs so model code never spells out `ndarray`
//! or argmin generics.
//!
//! Conventions
//! -----------
//! - `Theta` is the flat coefficient vector of a choice model, laid out in
//!   the order the model's utility specification registers coefficients.
//! - `Cost` is the solver-side objective `-ℓ(θ)`.
//! - `Hessian` is dense `P × P` with `P = theta.len()`.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Flat coefficient vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient of `ℓ(θ)` or of the cost; same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Dense second-derivative matrix, `P × P`.
pub type Hessian = Array2<f64>;

/// Scalar objective seen by the solver.
pub type Cost = f64;

/// argmin's evaluation counters keyed by name (`"cost_count"`, ...).
pub type FnEvalMap = HashMap<String, u64>;

/// L-BFGS history size used when [`MLEOptions::lbfgs_mem`](super::MLEOptions) is `None`.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
