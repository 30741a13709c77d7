//! models — forward pass, likelihood, type prediction, and calibration.
//!
//! Purpose
//! -------
//! Compose the core building blocks and the dynamics collaborators into the
//! operations callers run: the full forward pass, the likelihood-only
//! evaluation, type-prediction scoring against an intensity trace, and the
//! maximum-likelihood fit of the excitation kernel.
//!
//! Key behaviors
//! -------------
//! - [`forward_pass`] integrates the latent state, reads out the intensity,
//!   and returns NLL, mismatch rates, and the trace compensator.
//! - [`excitation_loglik`] / [`PreparedBatch::loglik`] evaluate the
//!   closed-form likelihood without integrating anything.
//! - [`calibrate_kernel`] fits `(base, beta)` by L-BFGS.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests; `tests/` runs the pipeline end to
//!   end with the reference integrator.

pub mod calibration;
pub mod forward;
pub mod likelihood;
pub mod prediction;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::calibration::{KernelCalibration, calibrate_kernel};
pub use self::forward::{ForwardOutput, PreparedBatch, excitation_loglik, forward_pass};
pub use self::likelihood::{LikelihoodAccumulator, LikelihoodOutcome, trapezoid_integral};
pub use self::prediction::{MismatchReport, NO_PREDICTION_SENTINEL, TypePredictionEvaluator};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::calibration::calibrate_kernel;
    pub use super::forward::{ForwardOutput, PreparedBatch, excitation_loglik, forward_pass};
    pub use super::likelihood::LikelihoodOutcome;
    pub use super::prediction::{MismatchReport, NO_PREDICTION_SENTINEL};
}
