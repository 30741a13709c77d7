//! Errors for the point-process stack (event/grid validation, kernel and
//! adjacency checks, trajectory plumbing, and likelihood preconditions).
//!
//! This module defines the domain error type, [`PPError`], used by every
//! component under `point_process` and, behind the `python-bindings` feature,
//! converted into a Python `ValueError` at the PyO3 boundary.
//!
//! ## Conventions
//! - **Indices are 0-based**. `entity` always refers to the batch-local
//!   position of a sequence; `index` refers to a position inside one sequence
//!   or inside the merged time axis, as documented per variant.
//! - Times must be **finite**. Kernel parameters must be **finite and > 0**.
//! - Failures raised by an external integrator are wrapped in
//!   [`PPError::IntegratorFailed`] without altering the message.
//! - Optimizer/backend errors are normalized to
//!   [`PPError::CalibrationFailed`] with a human-readable status.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Crate-wide result alias for point-process operations that may produce
/// [`PPError`].
pub type PPResult<T> = Result<T, PPError>;

/// Unified error type for point-process likelihood computations.
///
/// Covers input/data validation, grid construction, kernel and adjacency
/// checks, trajectory/readout shape contracts, integrator failures, and the
/// numerical preconditions of the likelihood pass.
#[derive(Debug, Clone, PartialEq)]
pub enum PPError {
    // ---- Input/data validation ----
    /// Batch contains no sequences.
    EmptyBatch,

    /// An event time is NaN/±inf.
    NonFiniteTime { entity: usize, index: usize, value: f64 },

    /// Corpus line could not be parsed.
    MalformedCorpus { line: usize, token: String },

    // ---- Grid ----
    /// Grid bounds must be finite with t_min < t_max.
    InvalidTimeSpan { t_min: f64, t_max: f64 },

    /// Grid step must be finite and > 0.
    InvalidStep { dt: f64 },

    /// A time expected on the merged axis is not present.
    TimeNotOnAxis { time: f64 },

    // ---- Kernel / adjacency ----
    /// Kernel parameters must be finite and > 0.
    InvalidKernelParam { name: &'static str, value: f64 },

    /// Adjacency matrix must be square and match the entity count.
    AdjacencyShapeMismatch { rows: usize, cols: usize, entities: usize },

    /// Adjacency entries must be finite.
    NonFiniteAdjacency { row: usize, col: usize, value: f64 },

    /// Entity id outside the batch.
    EntityOutOfRange { entity: usize, entities: usize },

    // ---- Trajectory / readout / integrator ----
    /// Initial state must hold at least one coordinate.
    EmptyInitialState,

    /// Initial state width differs from the dynamics' declared state size.
    InitialStateMismatch { expected: usize, actual: usize },

    /// Readout declares fewer channels than the requested intensities.
    ReadoutChannelShortfall { output_dim: usize, dim_n: usize },

    /// Integrator output does not match `[time, entity, state]`.
    TrajectoryShapeMismatch { expected: (usize, usize, usize), actual: (usize, usize, usize) },

    /// Readout output does not cover `[time, entity, dim_n]`.
    ReadoutShapeMismatch { expected: (usize, usize, usize), actual: (usize, usize, usize) },

    /// Intensity override cannot be broadcast to the trace shape.
    OverrideShapeMismatch { expected: (usize, usize, usize), actual: Vec<usize> },

    /// Number of intensity channels must be > 0.
    InvalidChannelCount { dim_n: usize },

    /// Tolerances must be finite and > 0; step budget must be > 0.
    InvalidTolerance { name: &'static str, value: f64 },

    /// Requested method is not implemented by the integrator.
    UnsupportedMethod { method: String },

    /// Adaptive step size collapsed below machine resolution.
    IntegratorDiverged { t: f64, step: f64 },

    /// Integration needed more steps than allowed.
    StepBudgetExceeded { t: f64, max_steps: usize },

    /// Integrator or dynamics produced a non-finite state.
    NonFiniteState { t: f64 },

    /// Opaque failure reported by an external integrator/readout.
    IntegratorFailed { reason: String },

    // ---- Likelihood preconditions ----
    /// Intensity fed to the logarithm must be finite and > 0.
    NonPositiveIntensity { entity: usize, time: f64, value: f64 },

    // ---- Prediction ----
    /// Lag offsets must be finite and >= 0.
    InvalidLagOffset { index: usize, value: f64 },

    /// At least one lag offset is required.
    NoLagOffsets,

    /// Event carries no mark to compare against.
    MissingMark { entity: usize, time: f64 },

    // ---- Calibration ----
    /// Optimizer failed; include a human-readable status/reason.
    CalibrationFailed { status: String },
}

impl std::error::Error for PPError {}

impl std::fmt::Display for PPError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Input/data validation ----
            PPError::EmptyBatch => write!(f, "Batch contains no sequences."),
            PPError::NonFiniteTime { entity, index, value } => {
                write!(f, "Event {index} of entity {entity} has a non-finite time: {value}")
            }
            PPError::MalformedCorpus { line, token } => {
                write!(f, "Corpus line {line} contains a non-numeric timestamp: {token:?}")
            }
            // ---- Grid ----
            PPError::InvalidTimeSpan { t_min, t_max } => {
                write!(f, "Time span must be finite with t_min < t_max; got [{t_min}, {t_max}]")
            }
            PPError::InvalidStep { dt } => {
                write!(f, "Grid step must be finite and > 0; got: {dt}")
            }
            PPError::TimeNotOnAxis { time } => {
                write!(f, "Time {time} is not present on the merged time axis.")
            }
            // ---- Kernel / adjacency ----
            PPError::InvalidKernelParam { name, value } => {
                write!(f, "Kernel parameter {name} must be finite and > 0; got: {value}")
            }
            PPError::AdjacencyShapeMismatch { rows, cols, entities } => {
                write!(
                    f,
                    "Adjacency matrix must be {entities}x{entities} (one row per entity); got {rows}x{cols}"
                )
            }
            PPError::NonFiniteAdjacency { row, col, value } => {
                write!(f, "Adjacency entry ({row}, {col}) is non-finite: {value}")
            }
            PPError::EntityOutOfRange { entity, entities } => {
                write!(f, "Entity {entity} is out of range for a batch of {entities} entities.")
            }
            // ---- Trajectory / readout / integrator ----
            PPError::EmptyInitialState => write!(f, "Initial state must not be empty."),
            PPError::InitialStateMismatch { expected, actual } => {
                write!(f, "Initial state has {actual} coordinates; dynamics expect {expected}")
            }
            PPError::ReadoutChannelShortfall { output_dim, dim_n } => {
                write!(
                    f,
                    "Readout provides {output_dim} channels; {dim_n} intensity channels requested"
                )
            }
            PPError::TrajectoryShapeMismatch { expected, actual } => {
                write!(f, "Integrator returned trajectory of shape {actual:?}; expected {expected:?}")
            }
            PPError::ReadoutShapeMismatch { expected, actual } => {
                write!(
                    f,
                    "Readout returned shape {actual:?}; expected at least {expected:?} (time, entity, channels)"
                )
            }
            PPError::OverrideShapeMismatch { expected, actual } => {
                write!(f, "Intensity override of shape {actual:?} cannot broadcast to {expected:?}")
            }
            PPError::InvalidChannelCount { dim_n } => {
                write!(f, "Number of intensity channels must be > 0; got: {dim_n}")
            }
            PPError::InvalidTolerance { name, value } => {
                write!(f, "Integrator setting {name} must be finite and > 0; got: {value}")
            }
            PPError::UnsupportedMethod { method } => {
                write!(f, "Integration method {method:?} is not supported by this integrator.")
            }
            PPError::IntegratorDiverged { t, step } => {
                write!(f, "Adaptive step collapsed to {step:e} at t = {t}; tolerance not reachable.")
            }
            PPError::StepBudgetExceeded { t, max_steps } => {
                write!(f, "Integration exceeded {max_steps} steps before reaching t = {t}")
            }
            PPError::NonFiniteState { t } => {
                write!(f, "Latent state became non-finite at t = {t}")
            }
            PPError::IntegratorFailed { reason } => {
                write!(f, "External integrator failed: {reason}")
            }
            // ---- Likelihood preconditions ----
            PPError::NonPositiveIntensity { entity, time, value } => {
                write!(
                    f,
                    "Intensity of entity {entity} at t = {time} must be finite and > 0; got: {value}"
                )
            }
            // ---- Prediction ----
            PPError::InvalidLagOffset { index, value } => {
                write!(f, "Lag offset {index} must be finite and >= 0; got: {value}")
            }
            PPError::NoLagOffsets => write!(f, "At least one lag offset is required."),
            PPError::MissingMark { entity, time } => {
                write!(f, "Event of entity {entity} at t = {time} carries no mark.")
            }
            // ---- Calibration ----
            PPError::CalibrationFailed { status } => {
                write!(f, "Kernel calibration failed with status: {status}")
            }
        }
    }
}

/// Convert a [`PPError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl std::convert::From<PPError> for PyErr {
    fn from(err: PPError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover `Display` rendering for representative variants.
    //
    // These tests intentionally DO NOT cover:
    // - Conversions to/from `OptError` (see `optimization::errors`).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure the intensity precondition message names the entity, the time,
    // and the offending value.
    fn non_positive_intensity_message_is_descriptive() {
        let err = PPError::NonPositiveIntensity { entity: 3, time: 1.5, value: 0.0 };

        let msg = err.to_string();

        assert!(msg.contains("entity 3"));
        assert!(msg.contains("1.5"));
    }

    #[test]
    // Purpose
    // -------
    // Ensure the adjacency mismatch message reports expected and actual shape.
    fn adjacency_mismatch_message_reports_shapes() {
        let err = PPError::AdjacencyShapeMismatch { rows: 2, cols: 3, entities: 4 };

        assert_eq!(
            err.to_string(),
            "Adjacency matrix must be 4x4 (one row per entity); got 2x3"
        );
    }
}
