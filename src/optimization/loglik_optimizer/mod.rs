//! loglik_optimizer — argmin-backed maximization of log-likelihoods.
//!
//! Purpose
//! -------
//! Fit model parameters by maximizing a log-likelihood `ℓ(θ)` with L-BFGS.
//! Inside this crate the user is excitation-kernel calibration, which maps
//! the summed event log-likelihood onto [`LogLikelihood`].
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ(θ)` into the argmin cost
//!   `c(θ) = -ℓ(θ)` and supplies finite-difference gradients when the model
//!   has no analytic one.
//! - [`maximize`] checks the start point, builds the solver for the chosen
//!   line search ([`builders`]), runs it ([`run::run_lbfgs`]) and returns an
//!   [`OptimOutcome`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Models implement `ℓ(θ)` and optionally `∇ℓ(θ)`, never the cost.
//! - [`Tolerances`] and [`MLEOptions`] are validated on construction.
//! - Objective failures are values, not panics; a point-process error raised
//!   inside `ℓ(θ)` survives the trip through argmin intact.
//!
//! Testing notes
//! -------------
//! - Submodule tests cover the sign convention, builders, validation and
//!   outcome normalization. Full runs are exercised by the calibration tests.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
