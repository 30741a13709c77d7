//! Forward pass — grid, trajectory, likelihood, and type prediction in one call.
//!
//! Purpose
//! -------
//! Orchestrate a complete evaluation of one batch: merge the sequences, build
//! the merged time axis, integrate the latent state over it, derive the
//! intensity trace, accumulate the closed-form log-likelihood, and score type
//! prediction against the trace.
//!
//! Key behaviors
//! -------------
//! - [`PreparedBatch`] holds the trajectory-independent pieces (time grid,
//!   raw histories, neighbor lists) so repeated likelihood evaluations, such
//!   as kernel calibration, build them only once.
//! - [`forward_pass`] runs the full pipeline and returns a [`ForwardOutput`].
//! - [`excitation_loglik`] is the likelihood-only entry point with an optional
//!   pre-computed trace.
//!
//! Invariants & assumptions
//! ------------------------
//! - The likelihood depends only on the kernel, the adjacency, and the raw
//!   sequences; the latent trajectory feeds type prediction and the
//!   numerical trace compensator, never the closed-form terms.
//! - Every error aborts the pass; nothing is returned partially.
//!
//! Downstream usage
//! ----------------
//! - Training loops call [`forward_pass`] with their dynamics/readout.
//! - Python bindings and calibration go through [`PreparedBatch`] /
//!   [`excitation_loglik`].
use crate::point_process::{
    core::{
        adjacency::NeighborList,
        events::{Sequence, merge_sequences},
        grid::{GridSpec, MergedTimeAxis, TimeGrid, TimedEvent, build_time_grid},
        kernel::{EntityHistory, ExcitationKernel},
        options::ForwardOptions,
    },
    dynamics::{
        OdeIntegrator, Readout, StateDynamics,
        trajectory::{TrajectoryEvaluator, TrajectoryOutput},
    },
    errors::PPResult,
    models::{
        likelihood::{LikelihoodAccumulator, LikelihoodOutcome, trapezoid_integral},
        prediction::MismatchReport,
    },
};
use ndarray::{Array3, ArrayView1, ArrayView2, ArrayView3, ArrayViewD};

/// PreparedBatch — trajectory-independent state of one batch.
///
/// Fields
/// ------
/// - `spec`: grid specification the batch was prepared with.
/// - `grid`: merged axis, grid indices, and time-indexed events.
/// - `history`: sorted raw event times per entity.
/// - `neighbors`: incoming edges per entity.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBatch {
    pub spec: GridSpec,
    pub grid: TimeGrid,
    pub history: EntityHistory,
    pub neighbors: NeighborList,
}

impl PreparedBatch {
    /// # Errors
    /// - Batch validation ([`EmptyBatch`](crate::point_process::errors::PPError::EmptyBatch),
    ///   non-finite times) and adjacency validation errors.
    pub fn new(
        batch: &[Sequence], adjacency: ArrayView2<f64>, spec: &GridSpec,
    ) -> PPResult<PreparedBatch> {
        let events = merge_sequences(batch)?;
        let grid = build_time_grid(spec, &events)?;
        let history = EntityHistory::from_batch(batch)?;
        let neighbors = NeighborList::from_adjacency(adjacency, batch.len())?;
        Ok(PreparedBatch { spec: *spec, grid, history, neighbors })
    }

    pub fn entities(&self) -> usize {
        self.history.len()
    }

    /// Closed-form log-likelihood under `kernel`, with type prediction when a
    /// trace is given.
    ///
    /// # Errors
    /// - Any error of [`LikelihoodAccumulator::accumulate`].
    pub fn loglik(
        &self, kernel: &ExcitationKernel, lags: &[f64], predict_first: bool,
        trace: Option<ArrayView3<f64>>,
    ) -> PPResult<LikelihoodOutcome> {
        let acc = LikelihoodAccumulator::new(
            kernel,
            &self.history,
            &self.neighbors,
            self.spec.t_min,
            self.spec.t_max,
        )?;
        acc.accumulate(
            &self.grid.timed_events,
            lags,
            predict_first,
            trace.map(|view| (&self.grid.axis, view)),
        )
    }
}

/// ForwardOutput — everything a forward pass produces.
///
/// Fields
/// ------
/// - `axis`: merged evaluation times.
/// - `trajectory`: latent state `[time, entity, state]`.
/// - `trace`: intensity trace `[time, entity, dim_n]`.
/// - `grid_index`: axis position of every uniform grid point.
/// - `timed_events`: filtered events with their axis positions.
/// - `nll`: negative log-likelihood.
/// - `mismatch`: per-lag type-prediction report.
/// - `trace_compensator`: trapezoid integral of `trace` over `axis`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardOutput {
    pub axis: MergedTimeAxis,
    pub trajectory: Array3<f64>,
    pub trace: Array3<f64>,
    pub grid_index: Vec<usize>,
    pub timed_events: Vec<TimedEvent>,
    pub nll: f64,
    pub mismatch: MismatchReport,
    pub trace_compensator: f64,
}

/// Run the full forward pass over one batch.
///
/// Parameters
/// ----------
/// - `dynamics`, `integrator`, `readout`: external collaborators.
/// - `z0`: initial latent state of one entity.
/// - `batch`: one sequence per entity.
/// - `adjacency`: `N × N` influence matrix.
/// - `opts`: validated forward options.
/// - `intensity_override`: optional ground-truth intensity replacing the
///   readout output.
///
/// Errors
/// ------
/// - Batch, grid, adjacency, trajectory, likelihood, and prediction errors,
///   in pipeline order. Integrator failures propagate unchanged.
#[allow(clippy::too_many_arguments)]
pub fn forward_pass(
    dynamics: &mut dyn StateDynamics, integrator: &dyn OdeIntegrator, readout: &dyn Readout,
    z0: ArrayView1<f64>, batch: &[Sequence], adjacency: ArrayView2<f64>, opts: &ForwardOptions,
    intensity_override: Option<ArrayViewD<f64>>,
) -> PPResult<ForwardOutput> {
    let prepared = PreparedBatch::new(batch, adjacency, &opts.grid)?;
    let evaluator =
        TrajectoryEvaluator::new(integrator, readout, opts.method, opts.tolerances, opts.dim_n)?;
    let TrajectoryOutput { trajectory, intensity } = evaluator.evaluate(
        dynamics,
        z0,
        prepared.entities(),
        &prepared.grid.axis,
        &prepared.grid.events,
        intensity_override,
    )?;

    let outcome = prepared.loglik(
        &opts.kernel,
        &opts.type_forecast,
        opts.predict_first,
        Some(intensity.view()),
    )?;
    let trace_compensator = trapezoid_integral(&prepared.grid.axis, intensity.view())?;
    log::debug!(
        "forward pass: nll = {}, trace compensator = {trace_compensator}, mismatch = {:?}",
        outcome.nll(),
        outcome.mismatch.rates
    );

    let PreparedBatch { grid, .. } = prepared;
    Ok(ForwardOutput {
        axis: grid.axis,
        trajectory,
        trace: intensity,
        grid_index: grid.grid_index,
        timed_events: grid.timed_events,
        nll: outcome.nll(),
        mismatch: outcome.mismatch,
        trace_compensator,
    })
}

/// Likelihood-only evaluation of a batch.
///
/// `trace`, when given, must be `[axis, entity, channel]` on the merged axis
/// that `batch` and `spec` produce; it is only used for type prediction.
///
/// # Errors
/// - Same as [`PreparedBatch::new`] and [`PreparedBatch::loglik`].
pub fn excitation_loglik(
    batch: &[Sequence], adjacency: ArrayView2<f64>, spec: &GridSpec, kernel: &ExcitationKernel,
    lags: &[f64], predict_first: bool, trace: Option<ArrayView3<f64>>,
) -> PPResult<LikelihoodOutcome> {
    PreparedBatch::new(batch, adjacency, spec)?.loglik(kernel, lags, predict_first, trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_process::{
        core::events::RawEvent,
        dynamics::{IntegratorMethod, OdeTolerances, dopri::DormandPrince},
        errors::PPError,
        models::prediction::NO_PREDICTION_SENTINEL,
    };
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Agreement between the full forward pass and the likelihood-only entry.
    // - Output shapes and grid bookkeeping.
    // - The intensity override path.
    // - Error propagation from batch validation.
    // -------------------------------------------------------------------------

    /// Two-channel state relaxing toward (1, 0): dz/dt = target - z.
    struct Relax;

    impl StateDynamics for Relax {
        fn state_dim(&self) -> usize {
            2
        }

        fn derivative(&self, _t: f64, z: ArrayView2<f64>) -> PPResult<Array2<f64>> {
            let mut dz = z.mapv(|v| -v);
            dz.column_mut(0).mapv_inplace(|v| v + 1.0);
            Ok(dz)
        }
    }

    struct Identity;

    impl Readout for Identity {
        fn output_dim(&self) -> usize {
            2
        }

        fn apply(&self, trajectory: ArrayView3<f64>) -> PPResult<Array3<f64>> {
            Ok(trajectory.to_owned())
        }
    }

    fn batch() -> Vec<Sequence> {
        vec![
            vec![RawEvent::with_mark(0.3, 0), RawEvent::with_mark(1.1, 0)],
            vec![RawEvent::with_mark(0.7, 1)],
        ]
    }

    fn options(align: bool) -> ForwardOptions {
        ForwardOptions::new(
            GridSpec::new(0.0, 2.0, 0.5, align).unwrap(),
            ExcitationKernel::default(),
            vec![0.0, 0.5],
            true,
            IntegratorMethod::Dopri5,
            OdeTolerances::default(),
            2,
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // The forward pass reports the same NLL as the likelihood-only entry and
    // lays out trajectory/trace on the merged axis.
    //
    // Given
    // -----
    // - Two entities, mutual excitation, window [0, 2], dt 0.5, no alignment.
    //
    // Expect
    // ------
    // - Axis = 5 grid points + 3 event times.
    // - Trajectory [8, 2, 2], trace [8, 2, 2].
    // - All three events scored (predict-first).
    fn forward_pass_matches_likelihood_only_entry() {
        let adjacency = array![[0.0, 0.8], [0.4, 0.0]];
        let opts = options(false);

        let out = forward_pass(
            &mut Relax,
            &DormandPrince::default(),
            &Identity,
            array![0.0, 1.0].view(),
            &batch(),
            adjacency.view(),
            &opts,
            None,
        )
        .unwrap();
        let reference = excitation_loglik(
            &batch(),
            adjacency.view(),
            &opts.grid,
            &opts.kernel,
            &opts.type_forecast,
            opts.predict_first,
            None,
        )
        .unwrap();

        assert_eq!(out.axis.len(), 8);
        assert_eq!(out.trajectory.dim(), (8, 2, 2));
        assert_eq!(out.trace.dim(), (8, 2, 2));
        assert_eq!(out.grid_index, vec![0, 2, 4, 6, 7]);
        assert!((out.nll - reference.nll()).abs() < 1e-12);
        assert_eq!(reference.mismatch.rates, vec![NO_PREDICTION_SENTINEL; 2]);
        assert_eq!(out.mismatch.scored, 3);
        assert!(out.trace_compensator > 0.0);
    }

    #[test]
    // Purpose
    // -------
    // An override bypasses the readout and drives type prediction.
    //
    // Given
    // -----
    // - Override broadcast from shape [2] = [0.0, 1.0]: channel 1 always wins.
    //
    // Expect
    // ------
    // - Entity 0 events (label 0) miss; entity 1 event (label 1) hits.
    // - Mismatch rate 2/3 for both lags; trace compensator 2 entities × 1 × 2.
    fn override_drives_type_prediction() {
        let truth = array![0.0, 1.0].into_dyn();

        let out = forward_pass(
            &mut Relax,
            &DormandPrince::default(),
            &Identity,
            array![0.0, 0.0].view(),
            &batch(),
            Array2::zeros((2, 2)).view(),
            &options(true),
            Some(truth.view()),
        )
        .unwrap();

        for rate in &out.mismatch.rates {
            assert!((rate - 2.0 / 3.0).abs() < 1e-12);
        }
        assert!((out.trace_compensator - 4.0).abs() < 1e-12);
    }

    #[test]
    fn forward_pass_rejects_empty_batch() {
        let err = forward_pass(
            &mut Relax,
            &DormandPrince::default(),
            &Identity,
            array![0.0, 0.0].view(),
            &[],
            Array2::zeros((0, 0)).view(),
            &options(false),
            None,
        )
        .unwrap_err();

        assert_eq!(err, PPError::EmptyBatch);
    }
}
