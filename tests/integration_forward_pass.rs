//! Integration tests for the point-process forward pass and calibration.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline: corpus text → batch → merged time
//!   axis → latent trajectory (reference integrator) → intensity trace →
//!   likelihood and type prediction → kernel calibration.
//!
//! Coverage
//! --------
//! - `point_process::core`: `parse_corpus`, `GridSpec`, `ForwardOptions`.
//! - `point_process::dynamics`: `DormandPrince` in both supported methods,
//!   rejection of the unsupported jump tag.
//! - `point_process::models`: `forward_pass`, `excitation_loglik`,
//!   `PreparedBatch`, `calibrate_kernel`.
//!
//! Exclusions
//! ----------
//! - Fine-grained checks of the building blocks (grid rounding, kernel
//!   sums, accumulator bookkeeping) live in the unit tests.
//! - Python bindings are exercised from the Python package.
use approx::assert_abs_diff_eq;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, array};
use rust_stpp::{
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
    point_process::{
        core::{
            events::{Sequence, parse_corpus},
            grid::GridSpec,
            kernel::ExcitationKernel,
            options::ForwardOptions,
        },
        dynamics::{IntegratorMethod, OdeTolerances, Readout, StateDynamics, dopri::DormandPrince},
        errors::{PPError, PPResult},
        models::{
            calibration::calibrate_kernel,
            forward::{PreparedBatch, excitation_loglik, forward_pass},
        },
    },
};

const CORPUS: &str = "0.12 0.55 1.30 2.10 2.95\n0.40 1.05 1.90;trailing metadata\n\n0.75 3.40 4.20\n";

/// Exponential decay of every state component: dz/dt = -z.
struct Decay;

impl StateDynamics for Decay {
    fn state_dim(&self) -> usize {
        2
    }

    fn derivative(&self, _t: f64, z: ArrayView2<f64>) -> PPResult<Array2<f64>> {
        Ok(z.mapv(|v| -v))
    }
}

/// Passes the state through as intensity channels.
struct PassThrough;

impl Readout for PassThrough {
    fn output_dim(&self) -> usize {
        2
    }

    fn apply(&self, trajectory: ArrayView3<f64>) -> PPResult<Array3<f64>> {
        Ok(trajectory.to_owned())
    }
}

fn corpus() -> Vec<Sequence> {
    parse_corpus(CORPUS.as_bytes(), None).expect("corpus should parse")
}

fn ring(n: usize, weight: f64) -> Array2<f64> {
    let mut adjacency = Array2::zeros((n, n));
    for i in 0..n {
        adjacency[[(i + 1) % n, i]] = weight;
    }
    adjacency
}

fn options(method: IntegratorMethod) -> ForwardOptions {
    ForwardOptions::new(
        GridSpec::new(0.0, 4.0, 0.25, false).expect("grid should be valid"),
        ExcitationKernel::new(0.4, 1.5).expect("kernel should be valid"),
        vec![0.0, 0.3],
        true,
        method,
        OdeTolerances::new(1e-8, 1e-10, 100_000).expect("tolerances should be valid"),
        2,
    )
    .expect("options should be valid")
}

#[test]
// Purpose
// -------
// Run the full pipeline on a parsed corpus and check every output against
// an independent reference.
//
// Given
// -----
// - 4 entities parsed from text (one blank line → empty sequence).
// - Ring adjacency, window (0, 4), dt 0.25.
// - Decay dynamics from z0 = (1, 0.5) and a pass-through readout.
//
// Expect
// ------
// - Trajectory matches exp(-t) · z0 at every axis point.
// - NLL equals the likelihood-only entry.
// - Channel 0 always dominates, so all in-window events (10; 4.20 lies
//   outside) are predicted correctly at both lags.
fn forward_pass_end_to_end_on_parsed_corpus() {
    let batch = corpus();
    let adjacency = ring(batch.len(), 0.6);
    let opts = options(IntegratorMethod::Dopri5);

    let out = forward_pass(
        &mut Decay,
        &DormandPrince::default(),
        &PassThrough,
        array![1.0, 0.5].view(),
        &batch,
        adjacency.view(),
        &opts,
        None,
    )
    .expect("forward pass should succeed");
    let reference = excitation_loglik(
        &batch,
        adjacency.view(),
        &opts.grid,
        &opts.kernel,
        &opts.type_forecast,
        opts.predict_first,
        None,
    )
    .expect("likelihood should succeed");

    assert_eq!(batch.len(), 4);
    assert_eq!(out.timed_events.len(), 10);
    assert_eq!(out.trajectory.dim(), (out.axis.len(), 4, 2));
    for (k, &t) in out.axis.times().iter().enumerate() {
        for e in 0..4 {
            assert_abs_diff_eq!(out.trajectory[[k, e, 0]], (-t).exp(), epsilon = 1e-6);
            assert_abs_diff_eq!(out.trajectory[[k, e, 1]], 0.5 * (-t).exp(), epsilon = 1e-6);
        }
    }
    assert_abs_diff_eq!(out.nll, reference.nll(), epsilon = 1e-12);
    assert_eq!(out.mismatch.scored, 10);
    assert_eq!(out.mismatch.rates, vec![0.0, 0.0]);
    let exact_compensator = 4.0 * 1.5 * (1.0 - (-4.0f64).exp());
    assert_abs_diff_eq!(out.trace_compensator, exact_compensator, epsilon = 5e-2);
}

#[test]
// Purpose
// -------
// The fixed-step method reproduces the adaptive trajectory and leaves the
// likelihood untouched; the jump tag is rejected by the reference
// integrator.
fn integrator_methods_agree_and_jump_tag_is_rejected() {
    let batch = corpus();
    let adjacency = ring(batch.len(), 0.6);
    let run = |method| {
        forward_pass(
            &mut Decay,
            &DormandPrince::default(),
            &PassThrough,
            array![1.0, 0.5].view(),
            &batch,
            adjacency.view(),
            &options(method),
            None,
        )
    };

    let dopri = run(IntegratorMethod::Dopri5).expect("dopri5 should succeed");
    let rk4 = run(IntegratorMethod::Rk4).expect("rk4 should succeed");
    let jump = run(IntegratorMethod::JumpAdams);

    let max_gap =
        (&dopri.trajectory - &rk4.trajectory).fold(0.0_f64, |acc, &gap| acc.max(gap.abs()));
    assert!(max_gap < 1e-6, "max gap {max_gap}");
    assert_eq!(dopri.nll, rk4.nll);
    assert!(matches!(jump, Err(PPError::UnsupportedMethod { .. })));
}

#[test]
// Purpose
// -------
// Calibrating the kernel on the parsed corpus improves the likelihood, and
// the fitted kernel plugs straight back into the forward pass.
fn calibrated_kernel_lowers_forward_nll() {
    let batch = corpus();
    let adjacency = ring(batch.len(), 0.6);
    let mut opts = options(IntegratorMethod::Dopri5);
    let prepared = PreparedBatch::new(&batch, adjacency.view(), &opts.grid)
        .expect("batch should prepare");
    let mle = MLEOptions::new(
        Tolerances::new(Some(1e-6), Some(1e-10), Some(200)).expect("tolerances should be valid"),
        LineSearcher::HagerZhang,
        false,
        None,
    )
    .expect("options should be valid");

    let (fitted, outcome) =
        calibrate_kernel(&prepared, &opts.kernel, &mle).expect("calibration should succeed");
    let before = prepared.loglik(&opts.kernel, &[0.0], false, None).expect("loglik").nll();
    opts.kernel = fitted;
    let after = forward_pass(
        &mut Decay,
        &DormandPrince::default(),
        &PassThrough,
        array![1.0, 0.5].view(),
        &batch,
        adjacency.view(),
        &opts,
        None,
    )
    .expect("forward pass should succeed");

    assert!(fitted.base > 0.0 && fitted.beta > 0.0);
    assert!(after.nll <= before + 1e-12);
    assert_abs_diff_eq!(after.nll, -outcome.value, epsilon = 1e-9);
}
