//! Consistency checks shared by the optimizer configuration, the adapter,
//! and outcome construction. Each failure maps to a specific [`OptError`].
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta},
};

/// `None` is accepted; a provided tolerance must be finite and `> 0`.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    match positive_tolerance(tol) {
        Some(reason) => Err(OptError::InvalidTolGrad { tol: tol.unwrap_or(f64::NAN), reason }),
        None => Ok(()),
    }
}

/// Same rule as [`verify_tol_grad`], reported as [`OptError::InvalidTolCost`].
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    match positive_tolerance(tol) {
        Some(reason) => Err(OptError::InvalidTolCost { tol: tol.unwrap_or(f64::NAN), reason }),
        None => Ok(()),
    }
}

fn positive_tolerance(tol: Option<f64>) -> Option<&'static str> {
    match tol {
        Some(t) if !t.is_finite() => Some("Tolerance must be finite."),
        Some(t) if t <= 0.0 => Some("Tolerance must be positive."),
        _ => None,
    }
}

/// Gradient must have length `dim` and finite entries; the first offending
/// entry is reported.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match grad.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(OptError::InvalidGradient {
            index,
            value: grad[index],
            reason: "Gradient elements must be finite.",
        }),
        None => Ok(()),
    }
}

/// Unwrap the best parameter vector reported by the solver.
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if argmin produced none.
/// - [`OptError::InvalidThetaHat`] on the first non-finite entry.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta = theta_hat.ok_or(OptError::MissingThetaHat)?;
    if let Some(index) = theta.iter().position(|v| !v.is_finite()) {
        return Err(OptError::InvalidThetaHat {
            index,
            value: theta[index],
            reason: "Parameter estimates must be finite.",
        });
    }
    Ok(theta)
}

/// A log-likelihood value must be finite (any sign).
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}
