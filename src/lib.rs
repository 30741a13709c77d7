//! rust_stpp — point-process likelihoods with latent ODE intensity traces.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the point-process likelihood to Python via the `_rust_stpp` extension
//! module when the `python-bindings` feature is enabled.
//!
//! Key behaviors
//! -------------
//! - Re-export the core modules: `point_process` (events, grid, kernel,
//!   dynamics, forward pass, calibration) and `optimization` (L-BFGS driver,
//!   stable transforms).
//! - Define the `_rust_stpp.point_process` Python submodule with
//!   `excitation_loglik`, `calibrate_kernel`, `parse_corpus`, and the
//!   `KernelFit` result class.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file only converts
//!   inputs, dispatches, and maps errors to `ValueError`.
//! - The latent-state dynamics and readout are Rust traits; Python callers
//!   supply a pre-computed intensity trace instead.
//!
//! Downstream usage
//! ----------------
//! - Rust code should depend on `point_process::prelude` and ignore the PyO3
//!   items.
//! - The Python package imports `_rust_stpp` and wraps it in thin facades.

pub mod optimization;
pub mod point_process;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    optimization::loglik_optimizer::OptimOutcome,
    point_process::{
        core::{events, grid::GridSpec, kernel::ExcitationKernel, options::validate_lag_offsets},
        models::{calibration, forward::PreparedBatch},
    },
    utils::{extract_adjacency, extract_batch, extract_mle_opts, extract_trace},
};

/// KernelFit — fitted excitation kernel and optimizer diagnostics.
///
/// Returned by `calibrate_kernel`; not constructed from Python.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_stpp.point_process")]
pub struct KernelFit {
    kernel: ExcitationKernel,
    outcome: OptimOutcome,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl KernelFit {
    #[getter]
    pub fn base(&self) -> f64 {
        self.kernel.base
    }

    #[getter]
    pub fn beta(&self) -> f64 {
        self.kernel.beta
    }

    /// Log-likelihood at the fitted kernel.
    #[getter]
    pub fn loglik(&self) -> f64 {
        self.outcome.value
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.outcome.converged
    }

    #[getter]
    pub fn status(&self) -> String {
        self.outcome.status.clone()
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.outcome.iterations
    }

    #[getter]
    pub fn grad_norm(&self) -> Option<f64> {
        self.outcome.grad_norm
    }

    #[getter]
    pub fn fn_evals(&self) -> Vec<(String, u64)> {
        self.outcome.fn_evals.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}

/// Negative log-likelihood and per-lag type-prediction mismatch rates.
///
/// `batch` is one sequence per entity (float times, or `(time, mark)`
/// pairs). `trace`, when given, is a `[axis, entity, channel]` float64 array
/// on the merged time axis; without it every rate is `-1.0`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (
        batch,
        adjacency,
        t_min,
        t_max,
        dt,
        align = false,
        base = 0.1,
        beta = 2.5,
        type_forecast = None,
        predict_first = true,
        trace = None,
    ),
    text_signature = "(batch, adjacency, t_min, t_max, dt, /, align=False, base=0.1, beta=2.5, \
                      type_forecast=None, predict_first=True, trace=None)"
)]
#[allow(clippy::too_many_arguments)]
pub fn excitation_loglik<'py>(
    py: Python<'py>, batch: &Bound<'py, PyAny>, adjacency: &Bound<'py, PyAny>, t_min: f64,
    t_max: f64, dt: f64, align: bool, base: f64, beta: f64, type_forecast: Option<Vec<f64>>,
    predict_first: bool, trace: Option<&Bound<'py, PyAny>>,
) -> PyResult<(f64, Vec<f64>)> {
    let batch = extract_batch(py, batch)?;
    let adjacency = extract_adjacency(adjacency)?;
    let trace = trace.map(extract_trace).transpose()?;
    let lags = type_forecast.unwrap_or_else(|| vec![0.0]);
    validate_lag_offsets(&lags)?;

    let spec = GridSpec::new(t_min, t_max, dt, align)?;
    let kernel = ExcitationKernel::new(base, beta)?;
    let prepared = PreparedBatch::new(&batch, adjacency.view(), &spec)?;
    let outcome =
        prepared.loglik(&kernel, &lags, predict_first, trace.as_ref().map(|t| t.view()))?;
    Ok((outcome.nll(), outcome.mismatch.rates))
}

/// Fit the kernel base rate and decay by maximum likelihood.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (
        batch,
        adjacency,
        t_min,
        t_max,
        dt,
        align = false,
        base = 0.1,
        beta = 2.5,
        tol_grad = None,
        tol_cost = None,
        max_iter = None,
        line_searcher = None,
        lbfgs_mem = None,
        verbose = false,
    ),
    text_signature = "(batch, adjacency, t_min, t_max, dt, /, align=False, base=0.1, beta=2.5, \
                      tol_grad=None, tol_cost=None, max_iter=None, line_searcher=None, \
                      lbfgs_mem=None, verbose=False)"
)]
#[allow(clippy::too_many_arguments)]
pub fn calibrate_kernel<'py>(
    py: Python<'py>, batch: &Bound<'py, PyAny>, adjacency: &Bound<'py, PyAny>, t_min: f64,
    t_max: f64, dt: f64, align: bool, base: f64, beta: f64, tol_grad: Option<f64>,
    tol_cost: Option<f64>, max_iter: Option<usize>, line_searcher: Option<&str>,
    lbfgs_mem: Option<usize>, verbose: bool,
) -> PyResult<KernelFit> {
    let batch = extract_batch(py, batch)?;
    let adjacency = extract_adjacency(adjacency)?;
    let opts = extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem, verbose)?;

    let spec = GridSpec::new(t_min, t_max, dt, align)?;
    let init = ExcitationKernel::new(base, beta)?;
    let prepared = PreparedBatch::new(&batch, adjacency.view(), &spec)?;
    let (kernel, outcome) = calibration::calibrate_kernel(&prepared, &init, &opts)?;
    Ok(KernelFit { kernel, outcome })
}

/// Parse corpus text (one sequence per line, whitespace-separated times).
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (text, max_sequences = None), text_signature = "(text, /, max_sequences=None)")]
pub fn parse_corpus(text: &str, max_sequences: Option<usize>) -> PyResult<Vec<Vec<f64>>> {
    let sequences = events::parse_corpus(text.as_bytes(), max_sequences)?;
    Ok(sequences.into_iter().map(|seq| seq.into_iter().map(|e| e.time).collect()).collect())
}

/// _rust_stpp — PyO3 module initializer.
///
/// Creates the `point_process` submodule, attaches it to the parent, and
/// registers it in `sys.modules` so dotted imports work from Python.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_stpp<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let point_process_mod = PyModule::new(_py, "point_process")?;
    point_process_module(m, &point_process_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_stpp.point_process", point_process_mod)?;
    m.add("NO_PREDICTION_SENTINEL", point_process::models::NO_PREDICTION_SENTINEL)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn point_process_module<'py>(
    rust_stpp: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<KernelFit>()?;
    m.add_function(wrap_pyfunction!(excitation_loglik, m)?)?;
    m.add_function(wrap_pyfunction!(calibrate_kernel, m)?)?;
    m.add_function(wrap_pyfunction!(parse_corpus, m)?)?;
    rust_stpp.add_submodule(m)?;
    Ok(())
}
