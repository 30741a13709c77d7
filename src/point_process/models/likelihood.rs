//! Likelihood accumulation — event terms, compensators, and type prediction.
//!
//! Purpose
//! -------
//! Walk the time-indexed event stream once per entity, add `ln λ` for every
//! event, subtract each entity's closed-form compensator over the modeling
//! window, and optionally score type prediction against an intensity trace.
//!
//! Key behaviors
//! -------------
//! - Events are grouped by entity id `k = 0..N-1`; inside a group they keep
//!   the order of the time-indexed stream. Group `k` ends with the
//!   subtraction of `Λ_k(t_min, t_max)`, so an entity with no events
//!   contributes only its compensator.
//! - Type prediction runs for an event when its entity is already in the
//!   happened set and a trace was supplied; the entity is inserted after the
//!   event either way.
//! - [`trapezoid_integral`] integrates a trace numerically over the merged
//!   axis; the forward pass reports it next to the closed-form compensator.
//!
//! Invariants & assumptions
//! ------------------------
//! - A non-finite or non-positive intensity aborts the pass with
//!   [`PPError::NonPositiveIntensity`]; no partial likelihood is returned.
//! - Intensities are evaluated at the (possibly aligned) event time against
//!   the raw histories held by [`EntityHistory`].
//! - Histories and neighbor lists describe the same batch (equal lengths).
//!
//! Testing notes
//! -------------
//! - Unit tests cover the empty-batch reduction to `Σ base·(t_max - t_min)`,
//!   a hand-computed two-entity likelihood, both predict-first policies,
//!   coincident aligned events, the intensity precondition, and the
//!   trapezoid rule on a linear trace.
use crate::point_process::{
    core::{
        adjacency::NeighborList,
        grid::{MergedTimeAxis, TimedEvent},
        kernel::{EntityHistory, ExcitationKernel},
        workspace::AccumulatorState,
    },
    errors::{PPError, PPResult},
    models::prediction::{MismatchReport, TypePredictionEvaluator},
};
use ndarray::ArrayView3;

/// Result of one accumulation pass.
///
/// Fields
/// ------
/// - `loglik`: total log-likelihood (event terms minus compensators).
/// - `mismatch`: per-lag type-prediction report.
#[derive(Debug, Clone, PartialEq)]
pub struct LikelihoodOutcome {
    pub loglik: f64,
    pub mismatch: MismatchReport,
}

impl LikelihoodOutcome {
    /// Negative log-likelihood, the quantity the pass reports.
    pub fn nll(&self) -> f64 {
        -self.loglik
    }
}

/// LikelihoodAccumulator — kernel, histories, and neighbor lists of one batch.
#[derive(Debug, Clone, Copy)]
pub struct LikelihoodAccumulator<'a> {
    kernel: &'a ExcitationKernel,
    history: &'a EntityHistory,
    neighbors: &'a NeighborList,
    t_min: f64,
    t_max: f64,
}

impl<'a> LikelihoodAccumulator<'a> {
    /// # Errors
    /// - [`PPError::AdjacencyShapeMismatch`] when the neighbor lists do not
    ///   cover the same entities as the histories.
    pub fn new(
        kernel: &'a ExcitationKernel, history: &'a EntityHistory, neighbors: &'a NeighborList,
        t_min: f64, t_max: f64,
    ) -> PPResult<LikelihoodAccumulator<'a>> {
        if neighbors.len() != history.len() {
            return Err(PPError::AdjacencyShapeMismatch {
                rows: neighbors.len(),
                cols: neighbors.len(),
                entities: history.len(),
            });
        }
        Ok(LikelihoodAccumulator { kernel, history, neighbors, t_min, t_max })
    }

    pub fn entities(&self) -> usize {
        self.history.len()
    }

    /// Run the pass.
    ///
    /// Parameters
    /// ----------
    /// - `timed_events`: filtered events with their axis positions.
    /// - `lags`: type-prediction lag offsets.
    /// - `predict_first`: pre-seed every entity into the happened set.
    /// - `trace`: optional `(axis, intensity trace)`; without it no event is
    ///   scored and the report carries the sentinel.
    ///
    /// Errors
    /// ------
    /// - [`PPError::EntityOutOfRange`] for an event outside the batch.
    /// - [`PPError::NonPositiveIntensity`] when `λ` is not finite and > 0.
    /// - Lag, trace-shape, and missing-mark errors from type prediction.
    pub fn accumulate(
        &self, timed_events: &[TimedEvent], lags: &[f64], predict_first: bool,
        trace: Option<(&MergedTimeAxis, ArrayView3<f64>)>,
    ) -> PPResult<LikelihoodOutcome> {
        let entities = self.entities();
        let predictor = match &trace {
            Some((axis, view)) => Some(TypePredictionEvaluator::new(axis, view.view(), lags)?),
            None => None,
        };

        let mut groups: Vec<Vec<&TimedEvent>> = vec![Vec::new(); entities];
        for timed in timed_events {
            let entity = timed.event.entity;
            groups
                .get_mut(entity)
                .ok_or(PPError::EntityOutOfRange { entity, entities })?
                .push(timed);
        }

        let mut state = AccumulatorState::new(entities, lags.len(), predict_first);
        for (entity, group) in groups.iter().enumerate() {
            for timed in group {
                let time = timed.event.time;
                let lambda = self.kernel.intensity(self.history, self.neighbors, entity, time);
                if !lambda.is_finite() || lambda <= 0.0 {
                    return Err(PPError::NonPositiveIntensity { entity, time, value: lambda });
                }
                state.add_log_intensity(lambda.ln());

                if let Some(predictor) = &predictor {
                    if state.has_happened(entity)? {
                        state.record_mismatches(&predictor.score(timed)?);
                    }
                }
                state.mark_happened(entity)?;
            }
            state.subtract_compensator(self.kernel.compensator(
                self.history,
                self.neighbors,
                entity,
                self.t_min,
                self.t_max,
            ));
        }

        let mismatch = MismatchReport::from_log(lags, state.mismatch_log());
        log::debug!(
            "likelihood: {} events over {entities} entities, loglik = {}, {} scored",
            timed_events.len(),
            state.loglik(),
            mismatch.scored
        );
        Ok(LikelihoodOutcome { loglik: state.loglik(), mismatch })
    }
}

/// Trapezoid-rule integral of a `[time, entity, channel]` trace over `axis`,
/// summed over every entity and channel.
///
/// # Errors
/// - [`PPError::ReadoutShapeMismatch`] when the trace's time dimension
///   differs from the axis length.
pub fn trapezoid_integral(axis: &MergedTimeAxis, trace: ArrayView3<f64>) -> PPResult<f64> {
    let (t, n, c) = trace.dim();
    if t != axis.len() {
        return Err(PPError::ReadoutShapeMismatch { expected: (axis.len(), n, c), actual: (t, n, c) });
    }
    let row_sums: Vec<f64> = trace.outer_iter().map(|row| row.sum()).collect();
    Ok(axis
        .times()
        .windows(2)
        .zip(row_sums.windows(2))
        .map(|(ts, ys)| 0.5 * (ys[0] + ys[1]) * (ts[1] - ts[0]))
        .sum())
}
