//! inference::scores — score covariance for robust standard errors.
//!
//! Purpose
//! -------
//! Aggregate per-observation scores `s_n = ∇ℓ_n(θ̂)` (rows of an `n × p`
//! matrix) into the middle matrix `S` of the sandwich `J⁺ S J⁺`:
//!
//! ```text
//! Robust:     S = Σ_n s_n s_nᵀ
//! Clustered:  S = G/(G−1) · Σ_g (Σ_{n∈g} s_n)(Σ_{n∈g} s_n)ᵀ
//! ```
//!
//! Conventions
//! -----------
//! - Scores are on the summed log-likelihood scale, matching the observed
//!   information from `inference::hessian`.
//! - Scores are not centered; at an interior MLE they sum to zero anyway.
//! - Cluster ids are arbitrary `usize` labels; only equality matters.
use crate::inference::errors::{InferenceError, InferenceResult};
use ndarray::{Array1, Array2, ArrayView1};
use std::{collections::BTreeMap, fmt};

/// Which covariance `training::run` reports.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CovarianceType {
    /// Inverse observed information.
    #[default]
    Classical,
    /// Sandwich with independent observations.
    Robust,
    /// Sandwich with scores summed within clusters (one id per observation).
    Clustered(Array1<usize>),
}

impl CovarianceType {
    /// Whether per-observation scores are needed.
    pub fn needs_scores(&self) -> bool {
        !matches!(self, CovarianceType::Classical)
    }
}

impl fmt::Display for CovarianceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CovarianceType::Classical => write!(f, "classical"),
            CovarianceType::Robust => write!(f, "robust"),
            CovarianceType::Clustered(ids) => {
                write!(f, "clustered ({} clusters)", count_clusters(ids.view()))
            }
        }
    }
}

/// Score covariance `S` for `cov_type`; `None` for [`CovarianceType::Classical`].
///
/// # Errors
/// - [`InferenceError::EmptyScores`] for a score matrix without rows.
/// - [`InferenceError::ClusterLengthMismatch`] when cluster ids do not have
///   one entry per row.
/// - [`InferenceError::TooFewClusters`] with fewer than two clusters.
pub fn score_covariance(
    scores: &Array2<f64>, cov_type: &CovarianceType,
) -> InferenceResult<Option<Array2<f64>>> {
    if !cov_type.needs_scores() {
        return Ok(None);
    }
    if scores.nrows() == 0 {
        return Err(InferenceError::EmptyScores);
    }
    match cov_type {
        CovarianceType::Classical => Ok(None),
        CovarianceType::Robust => Ok(Some(scores.t().dot(scores))),
        CovarianceType::Clustered(ids) => {
            if ids.len() != scores.nrows() {
                return Err(InferenceError::ClusterLengthMismatch {
                    expected: scores.nrows(),
                    found: ids.len(),
                });
            }
            let mut sums: BTreeMap<usize, Array1<f64>> = BTreeMap::new();
            for (row, &id) in scores.outer_iter().zip(ids.iter()) {
                sums.entry(id)
                    .and_modify(|acc| *acc += &row)
                    .or_insert_with(|| row.to_owned());
            }
            let g = sums.len();
            if g < 2 {
                return Err(InferenceError::TooFewClusters { found: g });
            }
            let p = scores.ncols();
            let mut s = Array2::<f64>::zeros((p, p));
            for sum in sums.values() {
                add_outer(&mut s, sum.view());
            }
            s *= g as f64 / (g as f64 - 1.0);
            Ok(Some(s))
        }
    }
}

// ---- Helper methods ----

fn add_outer(acc: &mut Array2<f64>, v: ArrayView1<'_, f64>) {
    for (i, &vi) in v.iter().enumerate() {
        for (j, &vj) in v.iter().enumerate() {
            acc[[i, j]] += vi * vj;
        }
    }
}

fn count_clusters(ids: ArrayView1<'_, usize>) -> usize {
    let mut seen: Vec<usize> = ids.to_vec();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}
