//! Time grid — merge event times with a uniform grid into one axis.
//!
//! Purpose
//! -------
//! Build the common set of evaluation points for the latent trajectory: the
//! union of a uniform grid over `[t_min, t_max]` and all event times that fall
//! strictly inside the window, with exact index bookkeeping for both.
//!
//! Key behaviors
//! -------------
//! - [`GridSpec`] validates the window and step and optionally aligns event
//!   times up to the next grid point ([`GridSpec::align_time`]).
//! - [`build_time_grid`] filters events to the open window, merges and
//!   de-duplicates grid and event times into a [`MergedTimeAxis`], and maps
//!   grid points and events to axis indices.
//! - [`MergedTimeAxis::search_sorted`] performs the leftmost insertion-point
//!   lookup used by type prediction.
//!
//! Invariants & assumptions
//! ------------------------
//! - The merged axis is strictly increasing; duplicate times (including those
//!   produced by rounding) collapse to one position.
//! - Every grid point and every surviving event time is present on the axis,
//!   so index lookups on them cannot fail for a well-formed [`TimeGrid`].
//! - Aligned times and grid points are rounded to [`ROUND_DECIMALS`] digits so
//!   floating-point near-duplicates coincide exactly.
//!
//! Conventions
//! -----------
//! - Events with time `<= t_min` or `>= t_max` (after alignment) are dropped.
//! - Rounding uses ties-to-even, matching NumPy's `round`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the unaligned union property, alignment and boundary
//!   exclusion, collapse of coincident events, index round-trips, and
//!   `search_sorted` semantics.
use crate::point_process::{
    core::events::Event,
    errors::{PPError, PPResult},
};
use std::cmp::Ordering;

/// Number of decimal digits kept for aligned event times and grid points.
pub const ROUND_DECIMALS: i32 = 8;

/// Round `x` to [`ROUND_DECIMALS`] decimal digits (ties to even).
#[inline]
pub fn round_decimals(x: f64) -> f64 {
    let scale = 10f64.powi(ROUND_DECIMALS);
    (x * scale).round_ties_even() / scale
}

/// GridSpec — validated modeling window, step, and alignment policy.
///
/// Fields
/// ------
/// - `t_min`, `t_max`: `f64`
///   Modeling window; finite with `t_min < t_max`.
/// - `dt`: `f64`
///   Uniform grid step; finite and > 0.
/// - `align`: `bool`
///   Whether event times are rounded up to the next grid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub t_min: f64,
    pub t_max: f64,
    pub dt: f64,
    pub align: bool,
}

impl GridSpec {
    /// Construct a validated [`GridSpec`].
    ///
    /// # Errors
    /// - [`PPError::InvalidTimeSpan`] if a bound is non-finite or `t_min >= t_max`.
    /// - [`PPError::InvalidStep`] if `dt` is non-finite or `<= 0`.
    pub fn new(t_min: f64, t_max: f64, dt: f64, align: bool) -> PPResult<GridSpec> {
        if !t_min.is_finite() || !t_max.is_finite() || t_min >= t_max {
            return Err(PPError::InvalidTimeSpan { t_min, t_max });
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(PPError::InvalidStep { dt });
        }
        Ok(GridSpec { t_min, t_max, dt, align })
    }

    /// Length of the modeling window.
    pub fn horizon(&self) -> f64 {
        self.t_max - self.t_min
    }

    /// Map a raw event time onto the axis convention of this grid.
    ///
    /// With alignment: `round8(ceil((t - t_min) / dt) * dt + t_min)`.
    /// Without alignment: `t` unchanged.
    pub fn align_time(&self, t: f64) -> f64 {
        if self.align {
            round_decimals(((t - self.t_min) / self.dt).ceil() * self.dt + self.t_min)
        } else {
            t
        }
    }

    /// Uniform grid `t_min, t_min + dt, …` with `ceil((horizon + dt) / dt)`
    /// points.
    ///
    /// A window that is not a multiple of `dt` overshoots: the last point is
    /// the first multiple past `t_max`. The ceiling tolerates a tiny relative
    /// error so that windows that are an exact multiple of `dt` in decimal
    /// still end on `t_max`.
    pub fn grid_points(&self) -> Vec<f64> {
        let count = ((self.horizon() + self.dt) / self.dt * (1.0 - 1e-12)).ceil() as usize;
        (0..count).map(|k| round_decimals(self.t_min + k as f64 * self.dt)).collect()
    }

    fn contains_open(&self, t: f64) -> bool {
        self.t_min < t && t < self.t_max
    }
}

/// MergedTimeAxis — strictly increasing union of grid and event times.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTimeAxis {
    times: Vec<f64>,
}

impl MergedTimeAxis {
    /// Sort, de-duplicate, and wrap a set of finite times.
    pub fn from_times(mut times: Vec<f64>) -> MergedTimeAxis {
        times.sort_by(f64::total_cmp);
        times.dedup_by(|a, b| a == b);
        MergedTimeAxis { times }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time stored at axis position `index`.
    pub fn time_at(&self, index: usize) -> Option<f64> {
        self.times.get(index).copied()
    }

    /// Exact position of `time` on the axis.
    ///
    /// # Errors
    /// - [`PPError::TimeNotOnAxis`] when `time` is not an axis point.
    pub fn index_of(&self, time: f64) -> PPResult<usize> {
        self.times
            .binary_search_by(|probe| probe.partial_cmp(&time).unwrap_or(Ordering::Less))
            .map_err(|_| PPError::TimeNotOnAxis { time })
    }

    /// Leftmost insertion point keeping the axis sorted
    /// (`numpy.searchsorted(axis, t, side="left")`).
    pub fn search_sorted(&self, time: f64) -> usize {
        self.times.partition_point(|&probe| probe < time)
    }
}

/// TimedEvent — an event expressed on the merged axis.
///
/// Fields
/// ------
/// - `time_index`: position of the event time on the [`MergedTimeAxis`].
/// - `event`: the filtered (and possibly aligned) event.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub time_index: usize,
    pub event: Event,
}

/// TimeGrid — everything the grid builder hands downstream.
///
/// Fields
/// ------
/// - `axis`: merged, de-duplicated evaluation times.
/// - `grid_index`: axis position of every uniform grid point, in grid order.
/// - `events`: surviving events with aligned times, in input order.
/// - `timed_events`: the same events with their axis positions.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    pub axis: MergedTimeAxis,
    pub grid_index: Vec<usize>,
    pub events: Vec<Event>,
    pub timed_events: Vec<TimedEvent>,
}

/// Build the merged time axis for a sorted event stream.
///
/// Parameters
/// ----------
/// - `spec`: `&GridSpec`
///   Window, step, and alignment policy.
/// - `raw_events`: `&[Event]`
///   Events as produced by [`merge_sequences`](crate::point_process::core::events::merge_sequences).
///
/// Returns
/// -------
/// `PPResult<TimeGrid>`
///   Axis, grid indices, filtered events, and time-indexed events.
///
/// Errors
/// ------
/// - [`PPError::TimeNotOnAxis`] only if the axis invariants are broken, which
///   cannot happen for finite inputs.
///
/// Notes
/// -----
/// - Events on or outside the window boundaries are excluded; a debug log
///   line reports how many were dropped.
pub fn build_time_grid(spec: &GridSpec, raw_events: &[Event]) -> PPResult<TimeGrid> {
    let events: Vec<Event> = raw_events
        .iter()
        .filter_map(|e| {
            let t = spec.align_time(e.time);
            spec.contains_open(t).then(|| Event::new(t, e.entity, e.marks.clone()))
        })
        .collect();
    let dropped = raw_events.len() - events.len();
    if dropped > 0 {
        log::debug!("time grid: dropped {dropped} event(s) outside ({}, {})", spec.t_min, spec.t_max);
    }

    let grid = spec.grid_points();
    let mut all_times = grid.clone();
    all_times.extend(events.iter().map(|e| e.time));
    let axis = MergedTimeAxis::from_times(all_times);

    let grid_index = grid.iter().map(|&t| axis.index_of(t)).collect::<PPResult<Vec<_>>>()?;
    let timed_events = events
        .iter()
        .map(|e| Ok(TimedEvent { time_index: axis.index_of(e.time)?, event: e.clone() }))
        .collect::<PPResult<Vec<_>>>()?;

    log::debug!(
        "time grid: {} grid points, {} events, {} axis points",
        grid.len(),
        events.len(),
        axis.len()
    );
    Ok(TimeGrid { axis, grid_index, events, timed_events })
}
