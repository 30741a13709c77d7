//! loglik_optimizer::types — numeric aliases and pre-wired solver types.
//!
//! Purpose
//! -------
//! Keep the `ndarray` and argmin generics in one place so the rest of the
//! optimizer (and the kernel calibration built on it) speaks in terms of
//! `Theta`, `Grad` and `Cost`.
//!
//! Conventions
//! -----------
//! - `Theta` is the unconstrained parameter vector; for the excitation
//!   kernel it is `(softplus⁻¹ base, softplus⁻¹ beta)`.
//! - `Cost` is a scalar `f64`; the adapter handles the sign flip between
//!   cost and log-likelihood.
//! - Only type aliases and constants live here, so there are no unit tests.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Unconstrained parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient vector, same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Function-evaluation counters as reported by argmin (e.g. `"cost_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Default L-BFGS history size.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
