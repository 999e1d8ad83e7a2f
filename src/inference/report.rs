//! inference::report — coefficient tables for fitted models.
//!
//! Purpose
//! -------
//! Collect estimates, standard errors, z-values and two-sided normal
//! p-values into a [`CoefficientReport`], together with the facts of the
//! training run that produced them, and render it as a markdown table or
//! CSV.
//!
//! Conventions
//! -----------
//! - `z = estimate / std_err`; a zero or non-finite standard error yields
//!   `NaN` for both `z` and the p-value.
//! - CSV column names match the markdown headers (`Coefficient`,
//!   `Estimation`, `Std. Err.`, `z-value`, `Pr(>|z|)`).
use crate::inference::errors::{InferenceError, InferenceResult};
use ndarray::Array1;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use std::{fmt, io::Write};

/// One row of the coefficient table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientRow {
    #[serde(rename = "Coefficient")]
    pub coefficient: String,
    #[serde(rename = "Estimation")]
    pub estimate: f64,
    #[serde(rename = "Std. Err.")]
    pub std_err: f64,
    #[serde(rename = "z-value")]
    pub z_value: f64,
    #[serde(rename = "Pr(>|z|)")]
    pub p_value: f64,
}

/// Facts about the run printed above the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub algorithm: String,
    pub num_epochs: usize,
    /// `None` for solvers without a learning rate.
    pub learning_rate: Option<f64>,
    pub batch_size: usize,
    pub num_obs: usize,
    pub final_mean_loglik: f64,
    pub covariance: String,
}

/// Coefficient table plus run summary.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientReport {
    pub summary: TrainingSummary,
    pub rows: Vec<CoefficientRow>,
}

impl CoefficientReport {
    /// Build rows from parallel label / estimate / standard-error vectors.
    ///
    /// # Errors
    /// - [`InferenceError::ReportLengthMismatch`] when the lengths differ.
    /// - [`InferenceError::Distribution`] if the standard normal cannot be
    ///   constructed.
    pub fn new(
        labels: Vec<String>, estimates: &Array1<f64>, std_errs: &Array1<f64>,
        summary: TrainingSummary,
    ) -> InferenceResult<Self> {
        if labels.len() != estimates.len() || labels.len() != std_errs.len() {
            return Err(InferenceError::ReportLengthMismatch {
                labels: labels.len(),
                estimates: estimates.len(),
                std_errs: std_errs.len(),
            });
        }
        let normal =
            Normal::new(0.0, 1.0).map_err(|e| InferenceError::Distribution(e.to_string()))?;
        let rows = labels
            .into_iter()
            .zip(estimates.iter().zip(std_errs.iter()))
            .map(|(coefficient, (&estimate, &std_err))| {
                let z_value = if std_err > 0.0 && std_err.is_finite() {
                    estimate / std_err
                } else {
                    f64::NAN
                };
                let p_value = if z_value.is_finite() {
                    2.0 * normal.cdf(-z_value.abs())
                } else {
                    f64::NAN
                };
                CoefficientRow { coefficient, estimate, std_err, z_value, p_value }
            })
            .collect();
        Ok(Self { summary, rows })
    }

    /// Row by coefficient label.
    pub fn row(&self, label: &str) -> Option<&CoefficientRow> {
        self.rows.iter().find(|r| r.coefficient == label)
    }

    /// Pipe-delimited table with a header row.
    pub fn to_markdown(&self) -> String {
        let header = ["Coefficient", "Estimation", "Std. Err.", "z-value", "Pr(>|z|)"];
        let body: Vec<[String; 5]> = self
            .rows
            .iter()
            .map(|r| {
                [
                    r.coefficient.clone(),
                    format!("{:.6}", r.estimate),
                    format!("{:.6}", r.std_err),
                    format!("{:.4}", r.z_value),
                    format!("{:.4}", r.p_value),
                ]
            })
            .collect();
        let mut widths = header.map(str::len);
        for cells in &body {
            for (w, cell) in widths.iter_mut().zip(cells) {
                *w = (*w).max(cell.len());
            }
        }

        let mut out = String::new();
        let line = |cells: &[&str], out: &mut String| {
            out.push('|');
            for (i, (cell, w)) in cells.iter().zip(widths).enumerate() {
                if i == 0 {
                    out.push_str(&format!(" {cell:<w$} |"));
                } else {
                    out.push_str(&format!(" {cell:>w$} |"));
                }
            }
            out.push('\n');
        };
        line(&header, &mut out);
        out.push('|');
        for (i, w) in widths.iter().enumerate() {
            let dashes = "-".repeat(*w);
            if i == 0 {
                out.push_str(&format!(":{dashes}-|"));
            } else {
                out.push_str(&format!("-{dashes}:|"));
            }
        }
        out.push('\n');
        for cells in &body {
            let refs: Vec<&str> = cells.iter().map(String::as_str).collect();
            line(&refs, &mut out);
        }
        out
    }

    /// Write the table as CSV with a header row.
    ///
    /// # Errors
    /// [`InferenceError::Io`] on serialization or IO failure.
    pub fn write_csv<W: Write>(&self, writer: W) -> InferenceResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl fmt::Display for CoefficientReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        writeln!(f, "Algorithm: {}", s.algorithm)?;
        writeln!(f, "Training Epochs: {}", s.num_epochs)?;
        match s.learning_rate {
            Some(lr) => writeln!(f, "Learning Rate: {lr}")?,
            None => writeln!(f, "Learning Rate: n/a")?,
        }
        writeln!(
            f,
            "Batch Size: {} out of {} observations in total",
            s.batch_size, s.num_obs
        )?;
        writeln!(f, "Final Log-likelihood: {}", s.final_mean_loglik)?;
        writeln!(f, "Standard Errors: {}", s.covariance)?;
        writeln!(f, "Coefficients:")?;
        write!(f, "{}", self.to_markdown())
    }
}
