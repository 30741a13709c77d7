//! Trajectory evaluation — latent state on the merged axis and its intensity trace.
//!
//! Purpose
//! -------
//! Drive an external integrator over the merged time axis to obtain the
//! per-entity latent trajectory, then map it through the external readout
//! into the intensity trace consumed by type prediction.
//!
//! Key behaviors
//! -------------
//! - Replicate a single initial state across all entities of the batch.
//! - Hand the filtered event stream to the dynamics before integrating.
//! - Enforce the integrator contract: one sample per axis point, in order,
//!   with shape `[time, entity, state]`.
//! - Keep the first `dim_n` readout channels; any remaining channels belong
//!   to other heads.
//! - When an intensity override is supplied, broadcast it to
//!   `[time, entity, dim_n]` and skip the readout entirely.
//!
//! Invariants & assumptions
//! ------------------------
//! - Integrator and readout errors propagate unchanged; nothing is retried.
//! - The evaluator owns no state between calls; it is safe to reuse for
//!   independent batches.
use crate::point_process::{
    core::{events::Event, grid::MergedTimeAxis},
    dynamics::{IntegratorMethod, OdeIntegrator, OdeTolerances, Readout, StateDynamics},
    errors::{PPError, PPResult},
};
use ndarray::{Array2, Array3, ArrayView1, ArrayViewD, s};

/// Latent trajectory `[time, entity, state]` and intensity trace
/// `[time, entity, channel]` on the same axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryOutput {
    pub trajectory: Array3<f64>,
    pub intensity: Array3<f64>,
}

/// TrajectoryEvaluator — binds an integrator, a readout, and their settings.
///
/// Fields
/// ------
/// - `integrator`: external ODE integrator.
/// - `readout`: external state → parameter mapping.
/// - `method`: method tag forwarded to the integrator.
/// - `tolerances`: tolerances forwarded to the integrator.
/// - `dim_n`: number of leading readout channels treated as intensities.
pub struct TrajectoryEvaluator<'a> {
    pub integrator: &'a dyn OdeIntegrator,
    pub readout: &'a dyn Readout,
    pub method: IntegratorMethod,
    pub tolerances: OdeTolerances,
    pub dim_n: usize,
}

impl<'a> TrajectoryEvaluator<'a> {
    /// # Errors
    /// - [`PPError::InvalidChannelCount`] when `dim_n == 0`.
    /// - [`PPError::ReadoutChannelShortfall`] when the readout declares fewer
    ///   than `dim_n` channels.
    pub fn new(
        integrator: &'a dyn OdeIntegrator, readout: &'a dyn Readout, method: IntegratorMethod,
        tolerances: OdeTolerances, dim_n: usize,
    ) -> PPResult<TrajectoryEvaluator<'a>> {
        if dim_n == 0 {
            return Err(PPError::InvalidChannelCount { dim_n });
        }
        let output_dim = readout.output_dim();
        if output_dim < dim_n {
            return Err(PPError::ReadoutChannelShortfall { output_dim, dim_n });
        }
        Ok(TrajectoryEvaluator { integrator, readout, method, tolerances, dim_n })
    }

    /// Integrate the latent state over `axis` and derive the intensity trace.
    ///
    /// Parameters
    /// ----------
    /// - `dynamics`: state-evolution function; receives `events` first.
    /// - `z0`: initial state of one entity, replicated `entities` times.
    /// - `entities`: batch size.
    /// - `axis`: merged time axis.
    /// - `events`: filtered events, forwarded to the dynamics.
    /// - `intensity_override`: optional ground-truth intensity broadcastable
    ///   to `[axis.len(), entities, dim_n]`.
    ///
    /// Errors
    /// ------
    /// - [`PPError::EmptyInitialState`] when `z0` is empty.
    /// - [`PPError::InitialStateMismatch`] when `z0.len()` differs from
    ///   `dynamics.state_dim()`.
    /// - [`PPError::TrajectoryShapeMismatch`] when the integrator breaks its
    ///   contract.
    /// - [`PPError::ReadoutShapeMismatch`] when the readout output does not
    ///   cover `[time, entity, dim_n]`.
    /// - [`PPError::OverrideShapeMismatch`] when the override cannot broadcast.
    /// - Any error returned by the integrator or readout, unchanged.
    pub fn evaluate(
        &self, dynamics: &mut dyn StateDynamics, z0: ArrayView1<f64>, entities: usize,
        axis: &MergedTimeAxis, events: &[Event], intensity_override: Option<ArrayViewD<f64>>,
    ) -> PPResult<TrajectoryOutput> {
        if z0.is_empty() {
            return Err(PPError::EmptyInitialState);
        }
        let state = z0.len();
        let expected_state = dynamics.state_dim();
        if state != expected_state {
            return Err(PPError::InitialStateMismatch { expected: expected_state, actual: state });
        }
        let z0_batch = Array2::from_shape_fn((entities, state), |(_, d)| z0[d]);

        dynamics.observe_events(events);
        let trajectory = self.integrator.integrate(
            &*dynamics,
            z0_batch.view(),
            axis.times(),
            self.method,
            &self.tolerances,
        )?;
        let expected = (axis.len(), entities, state);
        if trajectory.dim() != expected {
            return Err(PPError::TrajectoryShapeMismatch { expected, actual: trajectory.dim() });
        }

        let trace_shape = (axis.len(), entities, self.dim_n);
        let intensity = match intensity_override {
            Some(truth) => truth
                .broadcast(trace_shape)
                .ok_or_else(|| PPError::OverrideShapeMismatch {
                    expected: trace_shape,
                    actual: truth.shape().to_vec(),
                })?
                .to_owned(),
            None => {
                let params = self.readout.apply(trajectory.view())?;
                let (t, n, c) = params.dim();
                if t != axis.len() || n != entities || c < self.dim_n {
                    return Err(PPError::ReadoutShapeMismatch {
                        expected: trace_shape,
                        actual: (t, n, c),
                    });
                }
                params.slice(s![.., .., ..self.dim_n]).to_owned()
            }
        };
        log::debug!(
            "trajectory: {} axis points x {entities} entities, {} intensity channels",
            axis.len(),
            self.dim_n
        );
        Ok(TrajectoryOutput { trajectory, intensity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_process::dynamics::dopri::DormandPrince;
    use ndarray::{Array1, ArrayView2, ArrayView3, array};

    /// dz/dt = 1 for every coordinate; records how many events it saw.
    struct Drift {
        seen: usize,
    }

    impl StateDynamics for Drift {
        fn state_dim(&self) -> usize {
            2
        }

        fn derivative(&self, _t: f64, z: ArrayView2<f64>) -> PPResult<Array2<f64>> {
            Ok(Array2::ones(z.dim()))
        }

        fn observe_events(&mut self, events: &[Event]) {
            self.seen = events.len();
        }
    }

    /// Channels: [z0, z1, z0 + z1].
    struct SumReadout;

    impl Readout for SumReadout {
        fn output_dim(&self) -> usize {
            3
        }

        fn apply(&self, trajectory: ArrayView3<f64>) -> PPResult<Array3<f64>> {
            let (t, n, _) = trajectory.dim();
            Ok(Array3::from_shape_fn((t, n, 3), |(i, j, c)| match c {
                0 | 1 => trajectory[[i, j, c]],
                _ => trajectory[[i, j, 0]] + trajectory[[i, j, 1]],
            }))
        }
    }

    /// Declares two channels but returns only one.
    struct NarrowReadout;

    impl Readout for NarrowReadout {
        fn output_dim(&self) -> usize {
            2
        }

        fn apply(&self, trajectory: ArrayView3<f64>) -> PPResult<Array3<f64>> {
            let (t, n, _) = trajectory.dim();
            Ok(Array3::zeros((t, n, 1)))
        }
    }

    /// Integrator that drops the last sample.
    struct ShortIntegrator;

    impl OdeIntegrator for ShortIntegrator {
        fn integrate(
            &self, _dynamics: &dyn StateDynamics, z0: ArrayView2<f64>, times: &[f64],
            _method: IntegratorMethod, _tolerances: &OdeTolerances,
        ) -> PPResult<Array3<f64>> {
            let (n, s) = z0.dim();
            Ok(Array3::zeros((times.len() - 1, n, s)))
        }
    }

    fn axis() -> MergedTimeAxis {
        MergedTimeAxis::from_times(vec![0.0, 0.5, 1.0])
    }

    #[test]
    // Purpose
    // -------
    // The trace keeps the first `dim_n` readout channels and every entity
    // starts from the same replicated initial state.
    fn evaluate_trims_readout_and_replicates_initial_state() {
        let integrator = DormandPrince::default();
        let eval = TrajectoryEvaluator::new(
            &integrator,
            &SumReadout,
            IntegratorMethod::Dopri5,
            OdeTolerances::default(),
            2,
        )
        .unwrap();
        let mut dynamics = Drift { seen: 0 };
        let events = vec![Event::new(0.5, 1, vec![0])];

        let out =
            eval.evaluate(&mut dynamics, array![1.0, -1.0].view(), 3, &axis(), &events, None).unwrap();

        assert_eq!(dynamics.seen, 1);
        assert_eq!(out.trajectory.dim(), (3, 3, 2));
        assert_eq!(out.intensity.dim(), (3, 3, 2));
        for j in 0..3 {
            assert!((out.intensity[[2, j, 0]] - 2.0).abs() < 1e-9);
            assert!((out.intensity[[2, j, 1]] - 0.0).abs() < 1e-9);
        }
    }

    #[test]
    // Purpose
    // -------
    // An override short-circuits the readout and is broadcast to the trace.
    fn evaluate_broadcasts_intensity_override() {
        let integrator = DormandPrince::default();
        let eval = TrajectoryEvaluator::new(
            &integrator,
            &SumReadout,
            IntegratorMethod::Rk4,
            OdeTolerances::default(),
            2,
        )
        .unwrap();
        let truth = array![0.25, 0.75].into_dyn();

        let out = eval
            .evaluate(&mut Drift { seen: 0 }, array![0.0, 0.0].view(), 2, &axis(), &[], Some(truth.view()))
            .unwrap();

        assert_eq!(out.intensity.dim(), (3, 2, 2));
        assert!(out.intensity.outer_iter().all(|row| row.iter().step_by(2).all(|&v| v == 0.25)));
    }

    #[test]
    fn evaluate_rejects_unbroadcastable_override() {
        let integrator = DormandPrince::default();
        let eval = TrajectoryEvaluator::new(
            &integrator,
            &SumReadout,
            IntegratorMethod::Rk4,
            OdeTolerances::default(),
            2,
        )
        .unwrap();
        let truth = array![1.0, 2.0, 3.0].into_dyn();

        let err = eval
            .evaluate(&mut Drift { seen: 0 }, array![0.0, 0.0].view(), 2, &axis(), &[], Some(truth.view()))
            .unwrap_err();

        assert!(matches!(err, PPError::OverrideShapeMismatch { .. }));
    }

    #[test]
    fn evaluate_enforces_integrator_contract() {
        let eval = TrajectoryEvaluator::new(
            &ShortIntegrator,
            &SumReadout,
            IntegratorMethod::Dopri5,
            OdeTolerances::default(),
            1,
        )
        .unwrap();

        let err = eval
            .evaluate(&mut Drift { seen: 0 }, array![0.0, 0.0].view(), 1, &axis(), &[], None)
            .unwrap_err();

        assert_eq!(err, PPError::TrajectoryShapeMismatch { expected: (3, 1, 2), actual: (2, 1, 2) });
    }

    #[test]
    // Purpose
    // -------
    // A readout that declares too few channels is refused at construction.
    fn new_rejects_readout_without_enough_channels() {
        let integrator = DormandPrince::default();

        let err = TrajectoryEvaluator::new(
            &integrator,
            &SumReadout,
            IntegratorMethod::Dopri5,
            OdeTolerances::default(),
            4,
        )
        .err();

        assert_eq!(err, Some(PPError::ReadoutChannelShortfall { output_dim: 3, dim_n: 4 }));
    }

    #[test]
    // Purpose
    // -------
    // A readout that returns fewer channels than it declares is caught after
    // application.
    fn evaluate_rejects_readout_breaking_its_declared_width() {
        let integrator = DormandPrince::default();
        let eval = TrajectoryEvaluator::new(
            &integrator,
            &NarrowReadout,
            IntegratorMethod::Dopri5,
            OdeTolerances::default(),
            2,
        )
        .unwrap();

        let err = eval
            .evaluate(&mut Drift { seen: 0 }, array![0.0, 0.0].view(), 1, &axis(), &[], None)
            .unwrap_err();

        assert_eq!(err, PPError::ReadoutShapeMismatch { expected: (3, 1, 2), actual: (3, 1, 1) });
    }

    #[test]
    // Purpose
    // -------
    // An initial state of the wrong width is rejected before the dynamics
    // run.
    //
    // Given
    // -----
    // - Dynamics declaring 2 state coordinates, z0 of length 5.
    //
    // Expect
    // ------
    // - `InitialStateMismatch { expected: 2, actual: 5 }`.
    // - The dynamics never observe the event stream.
    fn evaluate_rejects_initial_state_of_wrong_width() {
        let integrator = DormandPrince::default();
        let eval = TrajectoryEvaluator::new(
            &integrator,
            &SumReadout,
            IntegratorMethod::Dopri5,
            OdeTolerances::default(),
            2,
        )
        .unwrap();
        let mut dynamics = Drift { seen: 0 };
        let events = vec![Event::new(0.5, 0, vec![0])];
        let z0 = Array1::zeros(5);

        let err = eval.evaluate(&mut dynamics, z0.view(), 3, &axis(), &events, None).unwrap_err();

        assert_eq!(err, PPError::InitialStateMismatch { expected: 2, actual: 5 });
        assert_eq!(dynamics.seen, 0);
    }
}
