//! optimization — likelihood maximization, stable transforms, error surface.
//!
//! Purpose
//! -------
//! Support fitting point-process parameters by maximum likelihood: an
//! argmin-backed L-BFGS driver (`loglik_optimizer`), overflow-safe
//! transforms between unconstrained and positive parameters
//! (`numerical_stability`), and the `OptError` / `OptResult` surface
//! (`errors`).
//!
//! Conventions
//! -----------
//! - Solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; outcomes are
//!   reported in terms of `ℓ`.
//! - Mapping between unconstrained `θ` and model parameters (e.g. kernel
//!   base rate and decay) is done by the model layer with the helpers in
//!   `numerical_stability`.
//! - Raw argmin errors never escape; they are normalized into `OptError`.
//!   Point-process errors raised by an objective are carried in
//!   `OptError::Model` and converted back to `PPError` at the model boundary.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_stpp::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
