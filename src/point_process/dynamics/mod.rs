//! dynamics — latent-state collaborators and the trajectory evaluator.
//!
//! Purpose
//! -------
//! Describe the external capabilities the likelihood core relies on (state
//! evolution, readout, ODE integration) as traits, and drive them over a
//! merged time axis to obtain the latent trajectory and intensity trace.
//!
//! Key behaviors
//! -------------
//! - [`StateDynamics`]: batched right-hand side `dz/dt = f(t, z)` over
//!   `[entity, state]`, with an optional hook receiving the event stream
//!   (jump dynamics).
//! - [`Readout`]: maps a `[time, entity, state]` trajectory to a fixed-width
//!   `[time, entity, channel]` parameter tensor.
//! - [`OdeIntegrator`]: returns a trajectory sampled at exactly the requested
//!   axis points.
//! - [`trajectory::TrajectoryEvaluator`] wires the three together and trims
//!   the readout to the intensity channels.
//! - [`dopri::DormandPrince`] is a small reference integrator (adaptive
//!   Dormand–Prince 5(4) or fixed-step RK4).
//!
//! Conventions
//! -----------
//! - Tensors are `ndarray` arrays over `f64`; axis 0 is always time.
//! - Collaborator failures are reported as [`PPError`] values and propagated
//!   unchanged by the evaluator.
use crate::point_process::{
    core::events::Event,
    errors::{PPError, PPResult},
};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use std::str::FromStr;

pub mod dopri;
pub mod trajectory;

/// Batched state-evolution function.
pub trait StateDynamics {
    /// Dimension of one entity's latent state; the initial state must match.
    fn state_dim(&self) -> usize;

    /// Time derivative of the batched state `z` (`[entity, state]`) at `t`.
    fn derivative(&self, t: f64, z: ArrayView2<f64>) -> PPResult<Array2<f64>>;

    /// Receive the filtered event stream before integration starts.
    fn observe_events(&mut self, _events: &[Event]) {}
}

/// Fixed-width readout from latent state to intensity parameters.
pub trait Readout {
    /// Number of output channels per `(time, entity)`; must cover `dim_n`.
    fn output_dim(&self) -> usize;

    /// Apply the readout to a `[time, entity, state]` trajectory.
    fn apply(&self, trajectory: ArrayView3<f64>) -> PPResult<Array3<f64>>;
}

/// ODE integrator returning samples at exactly the given times.
pub trait OdeIntegrator {
    /// Integrate `dynamics` from `z0` (`[entity, state]`) over `times`.
    ///
    /// Must return a `[times.len(), entity, state]` array whose row `k` is the
    /// state at `times[k]`.
    fn integrate(
        &self, dynamics: &dyn StateDynamics, z0: ArrayView2<f64>, times: &[f64],
        method: IntegratorMethod, tolerances: &OdeTolerances,
    ) -> PPResult<Array3<f64>>;
}

/// Numerical method tag handed to the integrator.
///
/// Parsing is case-insensitive: `"dopri5"`, `"rk4"`, `"jump_adams"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorMethod {
    Dopri5,
    Rk4,
    JumpAdams,
}

impl IntegratorMethod {
    pub fn name(&self) -> &'static str {
        match self {
            IntegratorMethod::Dopri5 => "dopri5",
            IntegratorMethod::Rk4 => "rk4",
            IntegratorMethod::JumpAdams => "jump_adams",
        }
    }
}

impl FromStr for IntegratorMethod {
    type Err = PPError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dopri5" | "dormand_prince" => Ok(IntegratorMethod::Dopri5),
            "rk4" => Ok(IntegratorMethod::Rk4),
            "jump_adams" => Ok(IntegratorMethod::JumpAdams),
            _ => Err(PPError::UnsupportedMethod { method: s.to_string() }),
        }
    }
}

/// Integration tolerances and step budget.
///
/// Fields
/// ------
/// - `rtol`, `atol`: relative / absolute local error tolerances (finite, > 0).
/// - `max_steps`: cap on accepted + rejected steps per call (> 0).
///
/// Default: `rtol = 1e-5`, `atol = 1e-7`, `max_steps = 100_000`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OdeTolerances {
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
}

impl OdeTolerances {
    /// # Errors
    /// - [`PPError::InvalidTolerance`] for a non-finite/non-positive tolerance
    ///   or a zero step budget.
    pub fn new(rtol: f64, atol: f64, max_steps: usize) -> PPResult<OdeTolerances> {
        if !rtol.is_finite() || rtol <= 0.0 {
            return Err(PPError::InvalidTolerance { name: "rtol", value: rtol });
        }
        if !atol.is_finite() || atol <= 0.0 {
            return Err(PPError::InvalidTolerance { name: "atol", value: atol });
        }
        if max_steps == 0 {
            return Err(PPError::InvalidTolerance { name: "max_steps", value: 0.0 });
        }
        Ok(OdeTolerances { rtol, atol, max_steps })
    }
}

impl Default for OdeTolerances {
    fn default() -> Self {
        OdeTolerances { rtol: 1.0e-5, atol: 1.0e-7, max_steps: 100_000 }
    }
}
