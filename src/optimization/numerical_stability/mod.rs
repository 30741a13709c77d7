//! numerical_stability — overflow-safe scalar transforms and reductions.
//!
//! Purpose
//! -------
//! Collect numerically stable transforms used when mapping unconstrained
//! optimizer parameters into strictly positive model parameters, and the
//! max-shifted log-sum-exp reduction for log-space accumulation.
//!
//! Key behaviors
//! -------------
//! - `safe_softplus` / `safe_softplus_inv` map between ℝ and (0, ∞) without
//!   overflow.
//! - `safe_logistic` is the matching derivative (∂ softplus / ∂x).
//! - `logsumexp` / `logsumexp_axis` reduce in log space.
//!
//! Conventions
//! -----------
//! - Pure functions over `f64` and `ndarray` containers; no logging, no I/O.
//! - Inputs are assumed finite unless documented otherwise; validation lives
//!   with the callers.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    logsumexp, logsumexp_axis, safe_logistic, safe_softplus, safe_softplus_inv,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_stpp::optimization::numerical_stability::prelude::*;
//
// to import the main numerical-stability surface in a single line.

pub mod prelude {
    pub use super::transformations::{
        logsumexp, logsumexp_axis, safe_logistic, safe_softplus, safe_softplus_inv,
    };
}
