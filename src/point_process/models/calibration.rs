//! Kernel calibration — maximum-likelihood fit of the excitation kernel.
//!
//! Purpose
//! -------
//! Fit the baseline rate and decay of an [`ExcitationKernel`] to a prepared
//! batch by maximizing the closed-form event log-likelihood with the crate's
//! L-BFGS driver.
//!
//! Key behaviors
//! -------------
//! - [`KernelCalibration`] implements [`LogLikelihood`] over the
//!   unconstrained vector `θ = (softplus⁻¹ base, softplus⁻¹ beta)`, so every
//!   trial point maps to a valid kernel.
//! - The objective is the batch log-likelihood without type prediction;
//!   gradients come from finite differences in the optimizer adapter.
//! - [`calibrate_kernel`] returns the fitted kernel together with the
//!   optimizer outcome and logs a warning when the solver did not terminate.
//!
//! Invariants & assumptions
//! ------------------------
//! - The adjacency is held fixed; only `base` and `beta` move.
//! - With no incoming edges anywhere the likelihood is flat in `beta`, and
//!   `beta` stays at its starting value.
//! - The compensator charges `1 - exp(-beta (t_max - t_e))` per neighbor
//!   event, so with edges present `ℓ` can keep rising as `beta → 0`; the fit
//!   then ends on the cost or gradient tolerance at a small decay.
//!
//! Testing notes
//! -------------
//! - The zero-adjacency case has the closed-form optimum `base = n / T`.
//! - With excitation present the fit must not lower the log-likelihood.
use crate::{
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Cost, LogLikelihood, MLEOptions, OptimOutcome, Theta, maximize},
        numerical_stability::{safe_softplus, safe_softplus_inv},
    },
    point_process::{
        core::kernel::ExcitationKernel, errors::PPResult, models::forward::PreparedBatch,
    },
};
use ndarray::array;

/// Number of free kernel parameters.
const KERNEL_PARAMS: usize = 2;

/// Objective for [`maximize`]: `θ ↦ ℓ(softplus(θ₀), softplus(θ₁))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelCalibration;

impl KernelCalibration {
    /// Map an unconstrained vector to a kernel.
    ///
    /// # Errors
    /// - [`OptError::ThetaLengthMismatch`] unless `θ` has two entries.
    /// - [`OptError::Model`] if softplus underflows to zero.
    pub fn kernel_from_theta(theta: &Theta) -> OptResult<ExcitationKernel> {
        if theta.len() != KERNEL_PARAMS {
            return Err(OptError::ThetaLengthMismatch {
                expected: KERNEL_PARAMS,
                actual: theta.len(),
            });
        }
        Ok(ExcitationKernel::new(safe_softplus(theta[0]), safe_softplus(theta[1]))?)
    }

    /// Inverse of [`KernelCalibration::kernel_from_theta`].
    pub fn theta_from_kernel(kernel: &ExcitationKernel) -> Theta {
        array![safe_softplus_inv(kernel.base), safe_softplus_inv(kernel.beta)]
    }
}

impl LogLikelihood for KernelCalibration {
    type Data = PreparedBatch;

    fn value(&self, theta: &Theta, data: &PreparedBatch) -> OptResult<Cost> {
        let kernel = Self::kernel_from_theta(theta)?;
        Ok(data.loglik(&kernel, &[0.0], false, None)?.loglik)
    }

    fn check(&self, theta: &Theta, _data: &PreparedBatch) -> OptResult<()> {
        if theta.len() != KERNEL_PARAMS {
            return Err(OptError::ThetaLengthMismatch {
                expected: KERNEL_PARAMS,
                actual: theta.len(),
            });
        }
        if let Some(index) = theta.iter().position(|v| !v.is_finite()) {
            return Err(OptError::InvalidThetaInput { index, value: theta[index] });
        }
        Ok(())
    }
}

/// Fit `base` and `beta` to `prepared`, starting from `init`.
///
/// # Errors
/// - Point-process errors raised while evaluating the likelihood come back
///   unchanged (for example [`NonPositiveIntensity`](crate::point_process::errors::PPError::NonPositiveIntensity)).
/// - Optimizer failures become
///   [`CalibrationFailed`](crate::point_process::errors::PPError::CalibrationFailed).
pub fn calibrate_kernel(
    prepared: &PreparedBatch, init: &ExcitationKernel, opts: &MLEOptions,
) -> PPResult<(ExcitationKernel, OptimOutcome)> {
    let theta0 = KernelCalibration::theta_from_kernel(init);
    let outcome = maximize(&KernelCalibration, theta0, prepared, opts)?;
    let kernel = KernelCalibration::kernel_from_theta(&outcome.theta_hat)?;
    if !outcome.converged {
        log::warn!(
            "kernel calibration stopped without converging after {} iterations ({})",
            outcome.iterations,
            outcome.status
        );
    }
    log::debug!(
        "kernel calibration: base = {}, beta = {}, loglik = {}",
        kernel.base,
        kernel.beta,
        outcome.value
    );
    Ok((kernel, outcome))
}
