//! Numerical stability utilities.
//!
//! Provides safe implementations of common nonlinear transforms
//! that are prone to overflow/underflow in naïve form, using explicit
//! cutoffs (`|x| > 20.0`) to keep `f64` arithmetic in a well-conditioned
//! regime.
//!
//! # Provided items
//! - [`safe_softplus(x)`]: stable `ln(1 + exp(x))`, mapping ℝ → (0, ∞).
//! - [`safe_softplus_inv(x)`]: inverse of softplus, mapping (0, ∞) → ℝ.
//! - [`safe_logistic(x)`]: stable `1 / (1 + exp(-x))`, the derivative of
//!   softplus.
//! - [`logsumexp`] / [`logsumexp_axis`]: max-shifted `ln Σ exp(x)` over a
//!   whole array or along one axis.
//!
//! Kernel calibration maps its strictly positive parameters (base rate,
//! decay) through softplus so the optimizer can work in unconstrained space.
use ndarray::{Array, ArrayBase, Axis, Data, Dimension, RemoveAxis};

/// Cutoff beyond which softplus and its inverse are the identity in `f64`.
const SOFTPLUS_CUTOFF: f64 = 20.0;

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// - For `x > 20`, `softplus(x) = x + ln1p(exp(-x)) ≈ x`.
/// - Otherwise `ln1p(exp(x))`, which keeps precision for very negative `x`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > SOFTPLUS_CUTOFF { x } else { x.exp().ln_1p() }
}

/// Stable inverse of softplus on `(0, ∞)`: `t = ln(exp(x) - 1)`.
///
/// - For `x > 20`, `ln(exp(x) - 1) ≈ x`.
/// - Otherwise `ln(expm1(x))`.
///
/// `x` must be finite and `> 0`; callers validate before mapping.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > SOFTPLUS_CUTOFF { x } else { x.exp_m1().ln() }
}

/// Numerically stable logistic function `σ(x) = 1 / (1 + exp(-x))`.
///
/// Branches on the sign of `x` so that `exp` is only ever evaluated at a
/// non-positive argument.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `ln Σ exp(x)` over every element, shifted by the maximum.
///
/// Returns `-∞` for an empty array or one made only of `-∞`, and `+∞` if any
/// element is `+∞`.
pub fn logsumexp<S, D>(x: &ArrayBase<S, D>) -> f64
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let max = x.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    if !max.is_finite() {
        return max;
    }
    max + x.fold(0.0, |acc, &v| acc + (v - max).exp()).ln()
}

/// `ln Σ exp(x)` along `axis`, one value per lane.
pub fn logsumexp_axis<S, D>(x: &ArrayBase<S, D>, axis: Axis) -> Array<f64, D::Smaller>
where
    S: Data<Elem = f64>,
    D: Dimension + RemoveAxis,
{
    x.map_axis(axis, |lane| logsumexp(&lane))
}
