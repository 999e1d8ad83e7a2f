//! utils — conversions from Python objects for the `python-bindings` feature.
//!
//! Every helper accepts what a Python caller naturally has at hand (numpy
//! arrays, pandas objects exposing `to_numpy`, plain sequences) and returns
//! validated Rust types, mapping failures to `ValueError`/`TypeError`.
//!
//! `numpy` re-exports its own `ndarray` version, so arrays cross the boundary
//! as a shape plus a row-major buffer ([`feature_tensor_from_buffer`],
//! [`availability_from_buffer`]) and are rebuilt with this crate's `ndarray`.
//! Those two helpers are plain Rust and available without the feature.
use crate::data::{DataError, DataResult, FeatureTensor};
use ndarray::{Array2, Array3};

#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    data::ChoiceDataset,
    inference::scores::CovarianceType,
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
};

#[cfg(feature = "python-bindings")]
use numpy::{PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArray3};

/// Rebuild a 2-D or 3-D feature from its shape and row-major values.
///
/// # Errors
/// - [`DataError::FeatureLayout`] for any other dimensionality.
/// - [`DataError::FeatureShapeMismatch`] when `values` does not fill `shape`.
pub fn feature_tensor_from_buffer(
    name: &str, shape: &[usize], values: Vec<f64>,
) -> DataResult<FeatureTensor> {
    let expected: usize = shape.iter().product();
    if values.len() != expected {
        return Err(DataError::FeatureShapeMismatch {
            name: name.to_string(),
            dim: "values",
            expected,
            found: values.len(),
        });
    }
    let layout_err = || DataError::FeatureLayout {
        name: name.to_string(),
        reason: "features must be 2-D (rows, k) or 3-D (rows, num_items, k)",
    };
    match *shape {
        [rows, k] => Array2::from_shape_vec((rows, k), values)
            .map(FeatureTensor::from)
            .map_err(|_| layout_err()),
        [rows, items, k] => Array3::from_shape_vec((rows, items, k), values)
            .map(FeatureTensor::from)
            .map_err(|_| layout_err()),
        _ => Err(layout_err()),
    }
}

/// Rebuild a `(num_sessions, num_items)` availability mask.
///
/// # Errors
/// - [`DataError::IndexLengthMismatch`] when `values` does not fill `shape`.
pub fn availability_from_buffer(
    shape: (usize, usize), values: Vec<bool>,
) -> DataResult<Array2<bool>> {
    let expected = shape.0 * shape.1;
    let found = values.len();
    Array2::from_shape_vec(shape, values).map_err(|_| DataError::IndexLengthMismatch {
        name: "item_availability",
        expected,
        found,
    })
}

/// 1-D integer index array (labels, session or user indices).
///
/// Accepts an int64 numpy array, anything with `to_numpy()`, or a sequence
/// of non-negative integers.
#[cfg(feature = "python-bindings")]
pub fn extract_index_array<'py>(
    raw: &Bound<'py, PyAny>, name: &str,
) -> PyResult<Array1<usize>> {
    let from_signed = |arr: PyReadonlyArray1<i64>| -> PyResult<Array1<usize>> {
        arr.as_array()
            .iter()
            .map(|&v| {
                usize::try_from(v).map_err(|_| {
                    PyValueError::new_err(format!("{name} must be non-negative, found {v}"))
                })
            })
            .collect()
    };

    if let Ok(arr) = raw.extract::<PyReadonlyArray1<i64>>() {
        return from_signed(arr);
    }
    if let Ok(obj) = raw.call_method("to_numpy", (false,), None) {
        if let Ok(arr) = obj.extract::<PyReadonlyArray1<i64>>() {
            return from_signed(arr);
        }
    }
    let vec: Vec<usize> = raw.extract().map_err(|_| {
        PyTypeError::new_err(format!(
            "{name}: expected a 1-D int64 numpy.ndarray, pandas.Series, or sequence of \
             non-negative integers"
        ))
    })?;
    Ok(Array1::from(vec))
}

/// 2-D or 3-D float64 feature array.
#[cfg(feature = "python-bindings")]
pub fn extract_feature_tensor<'py>(raw: &Bound<'py, PyAny>, name: &str) -> PyResult<FeatureTensor> {
    if let Ok(arr) = raw.extract::<PyReadonlyArray3<f64>>() {
        let view = arr.as_array();
        return Ok(feature_tensor_from_buffer(name, view.shape(), view.iter().copied().collect())?);
    }
    if let Ok(arr) = raw.extract::<PyReadonlyArray2<f64>>() {
        let view = arr.as_array();
        return Ok(feature_tensor_from_buffer(name, view.shape(), view.iter().copied().collect())?);
    }
    Err(PyTypeError::new_err(format!(
        "feature {name:?}: expected a 2-D or 3-D float64 numpy.ndarray"
    )))
}

/// Assemble a [`ChoiceDataset`] from Python arguments.
///
/// `features` maps feature names (with their prefix, e.g. `"price_cost"`)
/// to 2-D or 3-D float64 arrays.
#[cfg(feature = "python-bindings")]
pub fn build_choice_dataset<'py>(
    labels: &Bound<'py, PyAny>, features: Option<&Bound<'py, PyDict>>, num_items: usize,
    session_index: Option<&Bound<'py, PyAny>>, user_index: Option<&Bound<'py, PyAny>>,
    item_availability: Option<&Bound<'py, PyAny>>,
) -> PyResult<ChoiceDataset> {
    let mut builder =
        ChoiceDataset::builder(extract_index_array(labels, "labels")?).num_items(num_items);
    if let Some(raw) = session_index {
        builder = builder.session_index(extract_index_array(raw, "session_index")?);
    }
    if let Some(raw) = user_index {
        builder = builder.user_index(extract_index_array(raw, "user_index")?);
    }
    if let Some(raw) = item_availability {
        let avail = raw.extract::<PyReadonlyArray2<bool>>().map_err(|_| {
            PyTypeError::new_err("item_availability must be a 2-D bool numpy.ndarray")
        })?;
        let view = avail.as_array();
        let mask = availability_from_buffer(view.dim(), view.iter().copied().collect())?;
        builder = builder.item_availability(mask);
    }
    if let Some(dict) = features {
        for (key, value) in dict.iter() {
            let name: String = key.extract()?;
            let tensor = extract_feature_tensor(&value, &name)?;
            builder = builder.feature(name, tensor);
        }
    }
    Ok(builder.build()?)
}

/// L-BFGS options from optional keyword arguments.
#[cfg(feature = "python-bindings")]
pub fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
) -> PyResult<MLEOptions> {
    let defaults = MLEOptions::default();
    let tols = if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
        defaults.tols
    } else {
        Tolerances::new(tol_grad, tol_cost, max_iter)?
    };
    let ls = match line_searcher {
        Some(name) => name.parse::<LineSearcher>()?,
        None => defaults.line_searcher,
    };
    Ok(MLEOptions::new(tols, ls, false, lbfgs_mem)?)
}

/// Covariance choice from `covariance` (`"classical"`, `"robust"`,
/// `"clustered"`) and cluster ids.
#[cfg(feature = "python-bindings")]
pub fn extract_covariance<'py>(
    covariance: Option<&str>, clusters: Option<&Bound<'py, PyAny>>,
) -> PyResult<CovarianceType> {
    match covariance.unwrap_or("classical").to_lowercase().as_str() {
        "classical" => Ok(CovarianceType::Classical),
        "robust" => Ok(CovarianceType::Robust),
        "clustered" => {
            let raw = clusters.ok_or_else(|| {
                PyValueError::new_err("clusters must be provided when covariance='clustered'")
            })?;
            Ok(CovarianceType::Clustered(extract_index_array(raw, "clusters")?))
        }
        other => Err(PyValueError::new_err(format!(
            "invalid covariance {other:?} (expected 'classical', 'robust', or 'clustered')"
        ))),
    }
}
