//! Numerically guarded scalar maps and log-space reductions.
//!
//! - [`safe_softplus`] / [`safe_softplus_inv`]: ℝ ↔ (0, ∞), used for nest
//!   dissimilarity parameters.
//! - [`safe_logistic`]: derivative of softplus, and the Jacobian factor for
//!   delta-method standard errors on the softplus scale.
//! - [`log_sum_exp`] / [`log_softmax_inplace`]: max-shifted reductions that
//!   treat `-∞` entries as unavailable alternatives.
//!
//! The cutoff `|x| > 20` keeps `exp` away from overflow while losing less
//! than one ulp of accuracy at the switch point.
use ndarray::ArrayViewMut1;

/// Eigenvalues at or below this are dropped when inverting information
/// matrices.
pub const EIGEN_EPS: f64 = 1e-8;

/// Lower bound on strictly positive quantities such as nest parameters.
pub const GENERAL_TOL: f64 = 1e-12;

const SOFTPLUS_CUTOFF: f64 = 20.0;

/// `ln(1 + e^x)` without overflow.
pub fn safe_softplus(x: f64) -> f64 {
    if x > SOFTPLUS_CUTOFF { x } else { x.exp().ln_1p() }
}

/// Inverse of [`safe_softplus`] on `(0, ∞)`: `ln(e^y - 1)`.
///
/// Inputs below [`GENERAL_TOL`] are clamped to it.
pub fn safe_softplus_inv(y: f64) -> f64 {
    let y = y.max(GENERAL_TOL);
    if y > SOFTPLUS_CUTOFF { y } else { y.exp_m1().ln() }
}

/// `1 / (1 + e^{-x})`, evaluated on the side that cannot overflow.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `ln Σ e^{v}` over `values`, skipping `-∞` entries.
///
/// Returns `-∞` when every entry is `-∞` or the iterator is empty.
pub fn log_sum_exp<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64> + Clone,
{
    let max = values.clone().into_iter().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = values
        .into_iter()
        .filter(|v| *v > f64::NEG_INFINITY)
        .map(|v| (v - max).exp())
        .sum();
    max + sum.ln()
}

/// Replace a row of utilities by log-probabilities, in place.
///
/// Masked entries (`-∞`) stay `-∞`. Returns the normalizer `ln Σ e^{u}`.
pub fn log_softmax_inplace(mut row: ArrayViewMut1<'_, f64>) -> f64 {
    let lse = log_sum_exp(row.iter().copied());
    if lse.is_finite() {
        row.mapv_inplace(|u| if u == f64::NEG_INFINITY { u } else { u - lse });
    }
    lse
}
