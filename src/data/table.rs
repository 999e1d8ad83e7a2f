//! data::table — long-format tables and pivoting into model tensors.
//!
//! Purpose
//! -------
//! Survey and revealed-preference data usually arrive in long format: one
//! row per (case, alternative) with the case id, the alternative label, a
//! choice flag and attribute columns. This module loads such tables from CSV
//! and reshapes them into the dense arrays [`ChoiceDataset`] consumes.
//!
//! Key behaviors
//! -------------
//! - [`LongTable`] stores columns as text and parses numbers on demand.
//! - [`pivot3d`] builds a `(cases, alternatives, values)` tensor; missing
//!   cells become `NaN`.
//! - [`pivot_availability`] marks which pivot cells were present. Passed as
//!   the dataset's item availability, it lets unbalanced choice sets reach a
//!   model: the builder stores the masked `NaN` cells as `0.0`.
//! - [`group_first`] takes the first value of a column per case, for
//!   case-level covariates such as income.
//! - [`chosen_alternatives`] turns the choice flag into item indices.
//!
//! Conventions
//! -----------
//! - Group keys are sorted numerically when every key parses as a number,
//!   lexicographically otherwise, so `"10"` sorts after `"9"` for numeric ids.
//!
//! [`ChoiceDataset`]: crate::data::ChoiceDataset
use crate::data::errors::{DataError, DataResult};
use ndarray::{Array1, Array2, Array3, Axis};
use std::{collections::HashMap, io::Read, path::Path};

/// Column-oriented table of text cells.
#[derive(Debug, Clone, PartialEq)]
pub struct LongTable {
    columns: Vec<(String, Vec<String>)>,
    num_rows: usize,
}

impl LongTable {
    /// Build from in-memory columns.
    ///
    /// # Errors
    /// - [`DataError::RaggedColumns`] if column lengths differ.
    pub fn from_columns(columns: Vec<(String, Vec<String>)>) -> DataResult<Self> {
        let num_rows = columns.first().map_or(0, |(_, c)| c.len());
        for (name, col) in &columns {
            if col.len() != num_rows {
                return Err(DataError::RaggedColumns {
                    name: name.clone(),
                    expected: num_rows,
                    found: col.len(),
                });
            }
        }
        Ok(Self { columns, num_rows })
    }

    /// Read a headed CSV stream.
    pub fn from_reader<R: Read>(reader: R) -> DataResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut columns: Vec<(String, Vec<String>)> =
            headers.iter().map(|h| (h.trim().to_string(), Vec::new())).collect();
        for record in csv_reader.records() {
            let record = record?;
            for ((_, col), cell) in columns.iter_mut().zip(record.iter()) {
                col.push(cell.trim().to_string());
            }
        }
        Self::from_columns(columns)
    }

    /// Read a headed CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> DataResult<Self> {
        let file = std::fs::File::open(path.as_ref())
            .map_err(|e| DataError::Csv { text: format!("{}: {e}", path.as_ref().display()) })?;
        Self::from_reader(file)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Raw text cells of a column.
    pub fn column(&self, name: &str) -> DataResult<&[String]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_slice())
            .ok_or_else(|| DataError::MissingColumn { name: name.to_string() })
    }

    /// Column parsed as `f64`.
    pub fn numeric_column(&self, name: &str) -> DataResult<Vec<f64>> {
        self.column(name)?
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.parse::<f64>().map_err(|_| DataError::ParseNumber {
                    column: name.to_string(),
                    row,
                    value: cell.clone(),
                })
            })
            .collect()
    }

    /// Keep the rows whose `column` equals `value`.
    ///
    /// Cells are compared as numbers when both sides parse, so `"4"` matches
    /// `"4.0"`.
    pub fn filter_eq(&self, column: &str, value: &str) -> DataResult<Self> {
        let keep: Vec<bool> = self.column(column)?.iter().map(|c| cells_equal(c, value)).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| {
                let kept = col.iter().zip(&keep).filter(|(_, k)| **k).map(|(c, _)| c.clone());
                (name.clone(), kept.collect())
            })
            .collect();
        Self::from_columns(columns)
    }
}

/// Pivot a long table into `(|dim0 keys|, |dim1 keys|, values.len())`.
///
/// Keys of `dim0` (cases) and `dim1` (alternatives) are sorted as described
/// in the module docs. Cells without a row stay `NaN`.
///
/// # Errors
/// - [`DataError::EmptyTable`], [`DataError::MissingColumn`],
///   [`DataError::ParseNumber`].
/// - [`DataError::DuplicatePivotEntry`] if a `(dim0, dim1)` pair repeats.
pub fn pivot3d(table: &LongTable, dim0: &str, dim1: &str, values: &[&str]) -> DataResult<Array3<f64>> {
    if table.num_rows() == 0 {
        return Err(DataError::EmptyTable);
    }
    let keys0 = table.column(dim0)?;
    let keys1 = table.column(dim1)?;
    let (pos0, n0) = key_positions(keys0);
    let (pos1, n1) = key_positions(keys1);
    let value_cols = values.iter().map(|v| table.numeric_column(v)).collect::<DataResult<Vec<_>>>()?;

    let mut out = Array3::<f64>::from_elem((n0, n1, values.len()), f64::NAN);
    let mut seen = vec![false; n0 * n1];
    for row in 0..table.num_rows() {
        let (i, j) = (pos0[row], pos1[row]);
        if seen[i * n1 + j] {
            return Err(DataError::DuplicatePivotEntry {
                dim0: keys0[row].clone(),
                dim1: keys1[row].clone(),
            });
        }
        seen[i * n1 + j] = true;
        for (k, col) in value_cols.iter().enumerate() {
            out[[i, j, k]] = col[row];
        }
    }
    Ok(out)
}

/// `(cases, alternatives)` mask of pivot cells with every value finite.
pub fn pivot_availability(pivot: &Array3<f64>) -> Array2<bool> {
    pivot.map_axis(Axis(2), |cell| cell.iter().all(|v| v.is_finite()))
}

/// First value of `value` for each sorted key of `by`.
pub fn group_first(table: &LongTable, by: &str, value: &str) -> DataResult<Array1<f64>> {
    if table.num_rows() == 0 {
        return Err(DataError::EmptyTable);
    }
    let (pos, n) = key_positions(table.column(by)?);
    let values = table.numeric_column(value)?;
    let mut out = Array1::<f64>::from_elem(n, f64::NAN);
    let mut filled = vec![false; n];
    for (row, &g) in pos.iter().enumerate() {
        if !filled[g] {
            out[g] = values[row];
            filled[g] = true;
        }
    }
    Ok(out)
}

/// Position (among sorted `dim1` keys) of the chosen alternative per case.
///
/// A row is chosen when its `choice` column is numerically 1.
///
/// # Errors
/// - [`DataError::AmbiguousChoice`] unless every case has exactly one
///   chosen row.
pub fn chosen_alternatives(
    table: &LongTable, dim0: &str, dim1: &str, choice: &str,
) -> DataResult<Array1<usize>> {
    if table.num_rows() == 0 {
        return Err(DataError::EmptyTable);
    }
    let keys0 = table.column(dim0)?;
    let (pos0, n0) = key_positions(keys0);
    let (pos1, _) = key_positions(table.column(dim1)?);
    let flags = table.numeric_column(choice)?;

    let mut chosen: Vec<Option<usize>> = vec![None; n0];
    let mut counts = vec![0usize; n0];
    let mut case_names: Vec<&str> = vec![""; n0];
    for row in 0..table.num_rows() {
        let case = pos0[row];
        case_names[case] = keys0[row].as_str();
        if flags[row] == 1.0 {
            counts[case] += 1;
            chosen[case] = Some(pos1[row]);
        }
    }
    chosen
        .into_iter()
        .zip(counts)
        .zip(case_names)
        .map(|((c, count), case)| match (c, count) {
            (Some(item), 1) => Ok(item),
            _ => Err(DataError::AmbiguousChoice { case: case.to_string(), count }),
        })
        .collect::<DataResult<Vec<_>>>()
        .map(Array1::from)
}

/// Map labels to their position in `names`.
pub fn encode_labels<S: AsRef<str>>(values: &[S], names: &[&str]) -> DataResult<Array1<usize>> {
    values
        .iter()
        .map(|v| {
            let v = v.as_ref();
            names.iter().position(|n| *n == v).ok_or_else(|| DataError::UnknownLabel { value: v.to_string() })
        })
        .collect::<DataResult<Vec<_>>>()
        .map(Array1::from)
}

// ---- Helper methods ----

/// Sorted unique keys, then each row's position among them.
fn key_positions(keys: &[String]) -> (Vec<usize>, usize) {
    let mut unique: Vec<&str> = keys.iter().map(String::as_str).collect();
    let numeric = unique.iter().all(|k| finite_number(k).is_some());
    if numeric {
        unique.sort_by(|a, b| {
            let (x, y) = (finite_number(a).unwrap_or(0.0), finite_number(b).unwrap_or(0.0));
            x.total_cmp(&y)
        });
        unique.dedup_by(|a, b| cells_equal(*a, *b));
    } else {
        unique.sort_unstable();
        unique.dedup();
    }
    let lookup: HashMap<&str, usize> = unique.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let positions = keys
        .iter()
        .map(|k| match lookup.get(k.as_str()) {
            Some(&p) => p,
            None => unique.iter().position(|u| cells_equal(u, k)).unwrap_or(0),
        })
        .collect();
    (positions, unique.len())
}

fn cells_equal(a: &str, b: &str) -> bool {
    match (finite_number(a), finite_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// `Some` only for cells that parse to a finite number; `NaN` and `inf`
/// keys are compared as text.
fn finite_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}
