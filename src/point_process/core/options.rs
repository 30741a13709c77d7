//! Forward-pass options — one validated bundle for a likelihood evaluation.
//!
//! Purpose
//! -------
//! Collect the knobs of a single forward pass (grid, kernel, type-prediction
//! lags, predict-first policy, integrator method/tolerances, number of
//! intensity channels) so entry points take one explicit, validated value
//! instead of a long list of loose arguments.
//!
//! Invariants & assumptions
//! ------------------------
//! - Component types ([`GridSpec`], [`ExcitationKernel`], [`OdeTolerances`])
//!   are validated by their own constructors; [`ForwardOptions::new`] only
//!   checks the fields it owns (lags and channel count).
//! - `type_forecast` is non-empty and every lag is finite and `>= 0`.
//! - `dim_n > 0`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover lag validation, the channel-count check, and the
//!   documented defaults of [`ForwardOptions::with_defaults`].
use crate::point_process::{
    core::{grid::GridSpec, kernel::ExcitationKernel},
    dynamics::{IntegratorMethod, OdeTolerances},
    errors::{PPError, PPResult},
};

/// ForwardOptions — configuration of one forward pass.
///
/// Fields
/// ------
/// - `grid`: modeling window, step, and alignment policy.
/// - `kernel`: excitation kernel parameters.
/// - `type_forecast`: lag offsets used by type prediction.
/// - `predict_first`: pre-seed every entity as "already happened", so the
///   first event of each entity is scored too.
/// - `method`, `tolerances`: forwarded to the ODE integrator.
/// - `dim_n`: number of leading readout channels treated as intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardOptions {
    pub grid: GridSpec,
    pub kernel: ExcitationKernel,
    pub type_forecast: Vec<f64>,
    pub predict_first: bool,
    pub method: IntegratorMethod,
    pub tolerances: OdeTolerances,
    pub dim_n: usize,
}

impl ForwardOptions {
    /// # Errors
    /// - [`PPError::NoLagOffsets`] when `type_forecast` is empty.
    /// - [`PPError::InvalidLagOffset`] for the first non-finite or negative lag.
    /// - [`PPError::InvalidChannelCount`] when `dim_n == 0`.
    pub fn new(
        grid: GridSpec, kernel: ExcitationKernel, type_forecast: Vec<f64>, predict_first: bool,
        method: IntegratorMethod, tolerances: OdeTolerances, dim_n: usize,
    ) -> PPResult<ForwardOptions> {
        validate_lag_offsets(&type_forecast)?;
        if dim_n == 0 {
            return Err(PPError::InvalidChannelCount { dim_n });
        }
        Ok(ForwardOptions { grid, kernel, type_forecast, predict_first, method, tolerances, dim_n })
    }

    /// Options with the usual defaults around a grid and channel count:
    /// lag `[0.0]`, predict-first on, Dormand–Prince, default tolerances and
    /// kernel.
    ///
    /// # Errors
    /// - [`PPError::InvalidChannelCount`] when `dim_n == 0`.
    pub fn with_defaults(grid: GridSpec, dim_n: usize) -> PPResult<ForwardOptions> {
        ForwardOptions::new(
            grid,
            ExcitationKernel::default(),
            vec![0.0],
            true,
            IntegratorMethod::Dopri5,
            OdeTolerances::default(),
            dim_n,
        )
    }
}

/// Check a list of type-prediction lags.
///
/// # Errors
/// - [`PPError::NoLagOffsets`] when `lags` is empty.
/// - [`PPError::InvalidLagOffset`] for the first non-finite or negative lag.
pub fn validate_lag_offsets(lags: &[f64]) -> PPResult<()> {
    if lags.is_empty() {
        return Err(PPError::NoLagOffsets);
    }
    match lags.iter().position(|&lag| !lag.is_finite() || lag < 0.0) {
        Some(index) => Err(PPError::InvalidLagOffset { index, value: lags[index] }),
        None => Ok(()),
    }
}
