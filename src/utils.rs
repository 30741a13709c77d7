//! Python-side input extraction for the `_rust_stpp` extension module.
//!
//! Everything here converts loosely typed Python objects (NumPy arrays,
//! pandas objects, nested lists) into the owned Rust containers the
//! point-process API expects. Only compiled with `python-bindings`.
#[cfg(feature = "python-bindings")]
use ndarray::{Array2, Array3};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray, PyArrayMethods, PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArray3,
    PyUntypedArrayMethods,
};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::PyAny,
};

#[cfg(feature = "python-bindings")]
use crate::{
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
    point_process::core::events::{RawEvent, Sequence},
};

/// One-dimensional `float64` data from an ndarray, a pandas Series, or any
/// sequence of floats. The result is always contiguous.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// A batch of event sequences, one per entity.
///
/// Each sequence is either a list of `(time, mark)` pairs or anything
/// [`extract_f64_array`] accepts (mark `0` on every event).
#[cfg(feature = "python-bindings")]
pub fn extract_batch<'py>(py: Python<'py>, raw: &Bound<'py, PyAny>) -> PyResult<Vec<Sequence>> {
    if let Ok(marked) = raw.extract::<Vec<Vec<(f64, usize)>>>() {
        return Ok(marked
            .into_iter()
            .map(|seq| seq.into_iter().map(|(t, m)| RawEvent::with_mark(t, m)).collect())
            .collect());
    }
    let items: Vec<Bound<'py, PyAny>> = raw.extract().map_err(|_| {
        PyTypeError::new_err(
            "batch must be a sequence of sequences of float times or (time, mark) pairs",
        )
    })?;
    items
        .iter()
        .map(|item| -> PyResult<Sequence> {
            let times = extract_f64_array(py, item)?;
            let slice = times.as_slice().map_err(|e| PyValueError::new_err(e.to_string()))?;
            Ok(slice.iter().map(|&t| RawEvent::with_mark(t, 0)).collect())
        })
        .collect()
}

/// Dense `N × N` adjacency from a C-contiguous 2-D array or nested lists.
#[cfg(feature = "python-bindings")]
pub fn extract_adjacency(raw: &Bound<'_, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr) = raw.extract::<PyReadonlyArray2<f64>>() {
        if arr.is_c_contiguous() {
            let shape = arr.shape();
            let (rows, cols) = (shape[0], shape[1]);
            let data = arr.as_slice().map_err(|e| PyValueError::new_err(e.to_string()))?;
            return Array2::from_shape_vec((rows, cols), data.to_vec())
                .map_err(|e| PyValueError::new_err(e.to_string()));
        }
    }

    let rows: Vec<Vec<f64>> = raw.extract().map_err(|_| {
        PyTypeError::new_err("adjacency must be a 2-D float64 array or a list of rows")
    })?;
    let cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != cols) {
        return Err(PyValueError::new_err("adjacency rows must all have the same length"));
    }
    let n = rows.len();
    Array2::from_shape_vec((n, cols), rows.into_iter().flatten().collect())
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Intensity trace `[axis, entity, channel]` from a C-contiguous 3-D array.
#[cfg(feature = "python-bindings")]
pub fn extract_trace(raw: &Bound<'_, PyAny>) -> PyResult<Array3<f64>> {
    let arr = raw.extract::<PyReadonlyArray3<f64>>().map_err(|_| {
        PyTypeError::new_err("trace must be a 3-D float64 numpy.ndarray")
    })?;
    if !arr.is_c_contiguous() {
        return Err(PyValueError::new_err("trace must be C-contiguous"));
    }
    let shape = arr.shape();
    let dims = (shape[0], shape[1], shape[2]);
    let data = arr.as_slice().map_err(|e| PyValueError::new_err(e.to_string()))?;
    Array3::from_shape_vec(dims, data.to_vec()).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Optimizer options from keyword arguments; unset values fall back to
/// [`MLEOptions::default`].
#[cfg(feature = "python-bindings")]
pub fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, verbose: bool,
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
    Ok(MLEOptions::new(tols, ls, verbose, lbfgs_mem)?)
}
