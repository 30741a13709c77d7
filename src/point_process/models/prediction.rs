//! Type prediction — next-mark accuracy read off the intensity trace.
//!
//! Purpose
//! -------
//! Score how well the learned intensity trace predicts the categorical label
//! of each event: for every lag offset, look up the trace at the first axis
//! point at or after `t - lag`, take the most intense channel, and record
//! whether it disagrees with the event's label.
//!
//! Key behaviors
//! -------------
//! - [`TypePredictionEvaluator::score`] returns one mismatch indicator
//!   (`1.0` miss / `0.0` hit) per lag for one event.
//! - [`MismatchReport::from_log`] averages the indicators per lag and falls
//!   back to [`NO_PREDICTION_SENTINEL`] when nothing was scored.
//!
//! Invariants & assumptions
//! ------------------------
//! - Lag offsets are finite and `>= 0`, so the looked-up position never lies
//!   after the event on the axis.
//! - The trace's time dimension equals the axis length.
//! - Ties in the argmax resolve to the lowest channel index; NaN channels
//!   never win (an all-NaN row predicts channel 0).
//!
//! Conventions
//! -----------
//! - Position lookup is `searchsorted(axis, axis[tid] - lag, side="left")`,
//!   i.e. the first axis point `>= t - lag`.
use crate::point_process::{
    core::{grid::MergedTimeAxis, grid::TimedEvent, options::validate_lag_offsets},
    errors::{PPError, PPResult},
};
use ndarray::{ArrayView1, ArrayView3, s};

/// Rate reported for every lag when no event was eligible for scoring.
pub const NO_PREDICTION_SENTINEL: f64 = -1.0;

/// TypePredictionEvaluator — borrows the axis, the trace, and the lags.
#[derive(Debug, Clone)]
pub struct TypePredictionEvaluator<'a> {
    axis: &'a MergedTimeAxis,
    trace: ArrayView3<'a, f64>,
    lags: &'a [f64],
}

impl<'a> TypePredictionEvaluator<'a> {
    /// # Errors
    /// - [`PPError::NoLagOffsets`] / [`PPError::InvalidLagOffset`] for bad lags.
    /// - [`PPError::ReadoutShapeMismatch`] when the trace does not have one row
    ///   per axis point or has no channels.
    pub fn new(
        axis: &'a MergedTimeAxis, trace: ArrayView3<'a, f64>, lags: &'a [f64],
    ) -> PPResult<TypePredictionEvaluator<'a>> {
        validate_lag_offsets(lags)?;
        let (t, n, c) = trace.dim();
        if t != axis.len() || c == 0 {
            return Err(PPError::ReadoutShapeMismatch {
                expected: (axis.len(), n, c.max(1)),
                actual: (t, n, c),
            });
        }
        Ok(TypePredictionEvaluator { axis, trace, lags })
    }

    pub fn lags(&self) -> &[f64] {
        self.lags
    }

    /// Mismatch indicators of `timed`, one per lag.
    ///
    /// # Errors
    /// - [`PPError::MissingMark`] when the event has no label.
    /// - [`PPError::EntityOutOfRange`] when the entity has no trace column.
    /// - [`PPError::TimeNotOnAxis`] when the time index is past the axis end.
    pub fn score(&self, timed: &TimedEvent) -> PPResult<Vec<f64>> {
        let event = &timed.event;
        let label = event
            .label()
            .ok_or(PPError::MissingMark { entity: event.entity, time: event.time })?;
        let entities = self.trace.dim().1;
        if event.entity >= entities {
            return Err(PPError::EntityOutOfRange { entity: event.entity, entities });
        }
        let now = self
            .axis
            .time_at(timed.time_index)
            .ok_or(PPError::TimeNotOnAxis { time: event.time })?;

        Ok(self
            .lags
            .iter()
            .map(|&lag| {
                let pos = self.axis.search_sorted(now - lag);
                let predicted = argmax(self.trace.slice(s![pos, event.entity, ..]));
                if predicted == label { 0.0 } else { 1.0 }
            })
            .collect())
    }
}

/// First index of the largest non-NaN value; `0` when every value is NaN.
fn argmax(values: ArrayView1<f64>) -> usize {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, top)| v > top) {
            best = Some((idx, v));
        }
    }
    best.map_or(0, |(idx, _)| idx)
}

/// MismatchReport — per-lag mismatch rates over all scored events.
///
/// Fields
/// ------
/// - `lags`: lag offsets, in the order they were requested.
/// - `rates`: mean mismatch per lag, or [`NO_PREDICTION_SENTINEL`] for every
///   lag when `scored == 0`.
/// - `scored`: number of events that went through type prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct MismatchReport {
    pub lags: Vec<f64>,
    pub rates: Vec<f64>,
    pub scored: usize,
}

impl MismatchReport {
    /// Aggregate a mismatch log (one row per lag).
    pub fn from_log(lags: &[f64], log: &[Vec<f64>]) -> MismatchReport {
        let scored = log.first().map_or(0, Vec::len);
        let rates = if scored == 0 {
            vec![NO_PREDICTION_SENTINEL; lags.len()]
        } else {
            log.iter().map(|row| row.iter().sum::<f64>() / row.len() as f64).collect()
        };
        MismatchReport { lags: lags.to_vec(), rates, scored }
    }

    /// Report for a pass that had no trace to predict from.
    pub fn unscored(lags: &[f64]) -> MismatchReport {
        MismatchReport::from_log(lags, &[])
    }

    pub fn is_scored(&self) -> bool {
        self.scored > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_process::core::events::Event;
    use ndarray::{Array3, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Position lookup with zero and positive lags.
    // - First-max tie breaking and NaN channels.
    // - Report aggregation and the no-prediction sentinel.
    // - Missing labels and bad trace shapes.
    // -------------------------------------------------------------------------

    /// Axis [0, 1, 2, 3]; entity 0 favors channel 1 until t = 2, channel 0 after.
    fn fixture() -> (MergedTimeAxis, Array3<f64>) {
        let axis = MergedTimeAxis::from_times(vec![0.0, 1.0, 2.0, 3.0]);
        let trace = Array3::from_shape_fn((4, 1, 2), |(t, _, c)| match (t < 2, c) {
            (true, 1) | (false, 0) => 1.0,
            _ => 0.0,
        });
        (axis, trace)
    }

    fn timed(time_index: usize, time: f64, mark: usize) -> TimedEvent {
        TimedEvent { time_index, event: Event::new(time, 0, vec![3, mark]) }
    }

    #[test]
    // Purpose
    // -------
    // The lagged lookup uses the first axis point at or after `t - lag`, and
    // the label is the last mark.
    //
    // Given
    // -----
    // - Event at t = 3 (index 3) with label 0; lags 0.0, 1.5, 2.5.
    //
    // Expect
    // ------
    // - lag 0.0: position 3, predicted 0, hit.
    // - lag 1.5: t - lag = 1.5, position 2, predicted 0, hit.
    // - lag 2.5: t - lag = 0.5, position 1, predicted 1, miss.
    fn score_uses_lagged_positions() {
        let (axis, trace) = fixture();
        let lags = [0.0, 1.5, 2.5];
        let eval = TypePredictionEvaluator::new(&axis, trace.view(), &lags).unwrap();

        let flags = eval.score(&timed(3, 3.0, 0)).unwrap();

        assert_eq!(flags, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn argmax_breaks_ties_toward_first_channel() {
        let axis = MergedTimeAxis::from_times(vec![0.0]);
        let trace = Array3::from_elem((1, 1, 3), 0.5);
        let lags = [0.0];
        let eval = TypePredictionEvaluator::new(&axis, trace.view(), &lags).unwrap();

        assert_eq!(eval.score(&timed(0, 0.0, 0)).unwrap(), vec![0.0]);
        assert_eq!(eval.score(&timed(0, 0.0, 2)).unwrap(), vec![1.0]);
    }

    #[test]
    // Purpose
    // -------
    // A NaN channel is skipped even when it comes first.
    fn argmax_skips_nan_channels() {
        assert_eq!(argmax(array![f64::NAN, 5.0, 1.0].view()), 1);
        assert_eq!(argmax(array![2.0, f64::NAN, 3.0].view()), 2);
        assert_eq!(argmax(array![f64::NAN, f64::NAN].view()), 0);
    }

    #[test]
    fn score_requires_a_label() {
        let (axis, trace) = fixture();
        let lags = [0.0];
        let eval = TypePredictionEvaluator::new(&axis, trace.view(), &lags).unwrap();
        let unmarked = TimedEvent { time_index: 1, event: Event::new(1.0, 0, vec![]) };

        assert_eq!(
            eval.score(&unmarked).unwrap_err(),
            PPError::MissingMark { entity: 0, time: 1.0 }
        );
    }

    #[test]
    fn new_rejects_trace_with_wrong_time_dimension() {
        let (axis, _) = fixture();
        let trace = Array3::<f64>::zeros((3, 1, 2));
        let lags = [0.0];

        assert!(matches!(
            TypePredictionEvaluator::new(&axis, trace.view(), &lags),
            Err(PPError::ReadoutShapeMismatch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Rates are per-lag means; an empty log yields the sentinel for every lag.
    fn report_averages_or_falls_back_to_sentinel() {
        let lags = [0.0, 1.0];
        let report = MismatchReport::from_log(&lags, &[vec![1.0, 0.0, 0.0, 1.0], vec![1.0; 4]]);
        let empty = MismatchReport::from_log(&lags, &[vec![], vec![]]);

        assert_eq!(report.rates, vec![0.5, 1.0]);
        assert_eq!(report.scored, 4);
        assert_eq!(empty.rates, vec![NO_PREDICTION_SENTINEL; 2]);
        assert!(!empty.is_scored());
        assert_eq!(MismatchReport::unscored(&lags), empty);
    }
}
