//! Reference ODE integrator — adaptive Dormand–Prince 5(4) and fixed-step RK4.
//!
//! The likelihood core treats integration as an external capability; this
//! integrator exists so the stack can be exercised end to end without binding
//! a host numeric runtime. It restarts at every requested time so each output
//! row is the state at exactly that time.
//!
//! Error control (Dopri5): the local error estimate of each trial step is
//! scaled by `atol + rtol · max(|z|, |z_new|)` and reduced to an RMS norm; the
//! step is accepted when the norm is `<= 1`. The next step is
//! `h · clamp(0.9 · norm^{-1/5}, 0.2, 5.0)`.
use crate::point_process::{
    dynamics::{IntegratorMethod, OdeIntegrator, OdeTolerances, StateDynamics},
    errors::{PPError, PPResult},
};
use ndarray::{Array2, Array3, ArrayView2, Zip, s};

// Dormand–Prince tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Fifth minus fourth order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// Default fixed step for [`IntegratorMethod::Rk4`].
pub const DEFAULT_RK4_STEP: f64 = 1.0e-2;

/// DormandPrince — reference integrator over an explicit list of save times.
///
/// Fields
/// ------
/// - `rk4_step`: maximum sub-step used by the fixed-step RK4 method; each
///   save interval is split into equal sub-steps no longer than this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DormandPrince {
    pub rk4_step: f64,
}

impl DormandPrince {
    pub fn new(rk4_step: f64) -> PPResult<DormandPrince> {
        if !rk4_step.is_finite() || rk4_step <= 0.0 {
            return Err(PPError::InvalidTolerance { name: "rk4_step", value: rk4_step });
        }
        Ok(DormandPrince { rk4_step })
    }
}

impl Default for DormandPrince {
    fn default() -> Self {
        DormandPrince { rk4_step: DEFAULT_RK4_STEP }
    }
}

impl OdeIntegrator for DormandPrince {
    fn integrate(
        &self, dynamics: &dyn StateDynamics, z0: ArrayView2<f64>, times: &[f64],
        method: IntegratorMethod, tolerances: &OdeTolerances,
    ) -> PPResult<Array3<f64>> {
        if method == IntegratorMethod::JumpAdams {
            return Err(PPError::UnsupportedMethod { method: method.name().to_string() });
        }
        let (entities, state) = z0.dim();
        let mut out = Array3::<f64>::zeros((times.len(), entities, state));
        let Some(&first) = times.first() else {
            return Ok(out);
        };
        let mut z = z0.to_owned();
        out.slice_mut(s![0, .., ..]).assign(&z);

        let span = times.last().map_or(0.0, |&last| last - first);
        let mut h = (span / 100.0).max(1e-6);
        let mut steps = 0usize;
        for (k, window) in times.windows(2).enumerate() {
            let (t0, t1) = (window[0], window[1]);
            z = match method {
                IntegratorMethod::Rk4 => {
                    self.rk4_interval(dynamics, z, t0, t1, &mut steps, tolerances.max_steps)?
                }
                _ => dopri_interval(dynamics, z, t0, t1, &mut h, &mut steps, tolerances)?,
            };
            out.slice_mut(s![k + 1, .., ..]).assign(&z);
        }
        Ok(out)
    }
}

impl DormandPrince {
    fn rk4_interval(
        &self, dynamics: &dyn StateDynamics, mut z: Array2<f64>, t0: f64, t1: f64,
        steps: &mut usize, max_steps: usize,
    ) -> PPResult<Array2<f64>> {
        let n_sub = ((t1 - t0) / self.rk4_step).ceil().max(1.0) as usize;
        let h = (t1 - t0) / n_sub as f64;
        for i in 0..n_sub {
            if *steps >= max_steps {
                return Err(PPError::StepBudgetExceeded { t: t1, max_steps });
            }
            let t = t0 + i as f64 * h;
            let k1 = eval(dynamics, t, &z)?;
            let k2 = eval(dynamics, t + 0.5 * h, &(&z + &(&k1 * (0.5 * h))))?;
            let k3 = eval(dynamics, t + 0.5 * h, &(&z + &(&k2 * (0.5 * h))))?;
            let k4 = eval(dynamics, t + h, &(&z + &(&k3 * h)))?;
            z = &z + &((&k1 + &(&k2 * 2.0) + &(&k3 * 2.0) + &k4) * (h / 6.0));
            *steps += 1;
            if z.iter().any(|v| !v.is_finite()) {
                return Err(PPError::NonFiniteState { t: t + h });
            }
        }
        Ok(z)
    }
}

fn dopri_interval(
    dynamics: &dyn StateDynamics, mut z: Array2<f64>, t0: f64, t1: f64, h: &mut f64,
    steps: &mut usize, tolerances: &OdeTolerances,
) -> PPResult<Array2<f64>> {
    let mut t = t0;
    while t < t1 {
        if *steps >= tolerances.max_steps {
            return Err(PPError::StepBudgetExceeded { t: t1, max_steps: tolerances.max_steps });
        }
        let remaining = t1 - t;
        let clipped = *h >= remaining;
        let h_try = if clipped { remaining } else { *h };
        let (z_new, err) = dopri_step(dynamics, t, &z, h_try)?;
        *steps += 1;

        let norm = error_norm(&z, &z_new, &err, tolerances);
        let accepted = norm <= 1.0;
        let factor = if norm == 0.0 {
            MAX_FACTOR
        } else if norm.is_finite() {
            (SAFETY * norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
        } else {
            MIN_FACTOR
        };
        if accepted {
            t = if clipped { t1 } else { t + h_try };
            z = z_new;
            *h = if clipped { h.max(h_try * factor) } else { h_try * factor };
        } else {
            *h = h_try * factor;
        }
        if *h <= f64::EPSILON * t.abs().max(1.0) {
            return Err(PPError::IntegratorDiverged { t, step: *h });
        }
    }
    Ok(z)
}

fn dopri_step(
    dynamics: &dyn StateDynamics, t: f64, z: &Array2<f64>, h: f64,
) -> PPResult<(Array2<f64>, Array2<f64>)> {
    let k1 = eval(dynamics, t, z)?;
    let k2 = eval(dynamics, t + C2 * h, &(z + &(&k1 * (h * A21))))?;
    let k3 = eval(dynamics, t + C3 * h, &(z + &((&k1 * A31 + &k2 * A32) * h)))?;
    let k4 = eval(dynamics, t + C4 * h, &(z + &((&k1 * A41 + &k2 * A42 + &k3 * A43) * h)))?;
    let k5 = eval(
        dynamics,
        t + C5 * h,
        &(z + &((&k1 * A51 + &k2 * A52 + &k3 * A53 + &k4 * A54) * h)),
    )?;
    let k6 = eval(
        dynamics,
        t + h,
        &(z + &((&k1 * A61 + &k2 * A62 + &k3 * A63 + &k4 * A64 + &k5 * A65) * h)),
    )?;
    let z_new = z + &((&k1 * B1 + &k3 * B3 + &k4 * B4 + &k5 * B5 + &k6 * B6) * h);
    let k7 = eval(dynamics, t + h, &z_new)?;
    let err = (&k1 * E1 + &k3 * E3 + &k4 * E4 + &k5 * E5 + &k6 * E6 + &k7 * E7) * h;
    Ok((z_new, err))
}

fn error_norm(
    z: &Array2<f64>, z_new: &Array2<f64>, err: &Array2<f64>, tolerances: &OdeTolerances,
) -> f64 {
    if err.is_empty() {
        return 0.0;
    }
    let mut acc = 0.0;
    Zip::from(z).and(z_new).and(err).for_each(|&a, &b, &e| {
        let scale = tolerances.atol + tolerances.rtol * a.abs().max(b.abs());
        acc += (e / scale).powi(2);
    });
    (acc / err.len() as f64).sqrt()
}

fn eval(dynamics: &dyn StateDynamics, t: f64, z: &Array2<f64>) -> PPResult<Array2<f64>> {
    let dz = dynamics.derivative(t, z.view())?;
    if dz.dim() != z.dim() {
        return Err(PPError::IntegratorFailed {
            reason: format!("dynamics returned shape {:?} for state {:?}", dz.dim(), z.dim()),
        });
    }
    Ok(dz)
}
