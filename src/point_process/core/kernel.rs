//! Exponential excitation kernel — pointwise intensity and compensator.
//!
//! Purpose
//! -------
//! Evaluate the graph-modulated, mutually exciting intensity of one target
//! entity at an arbitrary time, and its closed-form integral over an interval,
//! using an exponential decay kernel `g(Δt) = exp(-β·Δt)` on rectified edge
//! weights.
//!
//! Key behaviors
//! -------------
//! - [`ExcitationKernel::intensity`]:
//!   `λ_i(t) = base + Σ_j relu(A[i,j]) · Σ_{t_e ∈ j, t_e < t} exp(-β (t - t_e))`.
//! - [`ExcitationKernel::compensator`]:
//!   `Λ_i = base·(t_end - t_start) + Σ_j relu(A[i,j]) · Σ_{t_e ∈ j} (1 - exp(-β (t_end - t_e)))`.
//! - [`EntityHistory`] stores every entity's raw event times, sorted, so the
//!   strictly-past prefix is a binary search away.
//!
//! Invariants & assumptions
//! ------------------------
//! - `base > 0` and `β > 0`, both finite; with non-negative excitation this
//!   keeps `λ_i(t) >= base > 0`.
//! - Histories hold the RAW sequence times of the batch: no window filtering
//!   and no grid alignment are applied to the exciting events.
//! - The compensator sums over each neighbor's ENTIRE history, including
//!   events after `t_end` (for which `1 - exp(...)` is negative) and events
//!   before `t_start`. This reproduces the reference likelihood exactly and is
//!   not the causal integral of `λ_i` over the interval.
//!
//! Conventions
//! -----------
//! - Neighbor enumeration goes through a precomputed [`NeighborList`].
//! - Only strictly past events excite (`t_e < t`); a neighbor event at exactly
//!   `t` does not contribute to `λ_i(t)`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the isolated-entity degenerate case, a hand-computed
//!   single-edge intensity, strict causality, compensator monotonicity in the
//!   interval length, and the full-history compensator behavior.
use crate::point_process::{
    core::{adjacency::NeighborList, events::Sequence},
    errors::{PPError, PPResult},
};

/// Default baseline rate.
pub const DEFAULT_BASE: f64 = 0.1;

/// Default exponential decay rate.
pub const DEFAULT_BETA: f64 = 2.5;

/// EntityHistory — sorted raw event times of every entity in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityHistory {
    times: Vec<Vec<f64>>,
}

impl EntityHistory {
    /// Collect and sort each entity's raw event times.
    ///
    /// # Errors
    /// - [`PPError::EmptyBatch`] when `batch` is empty.
    /// - [`PPError::NonFiniteTime`] for any NaN/±inf time.
    pub fn from_batch(batch: &[Sequence]) -> PPResult<EntityHistory> {
        if batch.is_empty() {
            return Err(PPError::EmptyBatch);
        }
        let mut times = Vec::with_capacity(batch.len());
        for (entity, sequence) in batch.iter().enumerate() {
            let mut entity_times = Vec::with_capacity(sequence.len());
            for (index, raw) in sequence.iter().enumerate() {
                if !raw.time.is_finite() {
                    return Err(PPError::NonFiniteTime { entity, index, value: raw.time });
                }
                entity_times.push(raw.time);
            }
            entity_times.sort_by(f64::total_cmp);
            times.push(entity_times);
        }
        Ok(EntityHistory { times })
    }

    /// Sorted event times of `entity` (empty when out of range).
    pub fn times(&self, entity: usize) -> &[f64] {
        self.times.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Events of `entity` strictly before `t`.
    pub fn before(&self, entity: usize, t: f64) -> &[f64] {
        let times = self.times(entity);
        &times[..times.partition_point(|&s| s < t)]
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// ExcitationKernel — baseline rate and exponential decay.
///
/// Fields
/// ------
/// - `base`: `f64`
///   Baseline intensity shared by all entities; finite and > 0.
/// - `beta`: `f64`
///   Decay rate of the exponential kernel; finite and > 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExcitationKernel {
    pub base: f64,
    pub beta: f64,
}

impl ExcitationKernel {
    /// Construct a validated kernel.
    ///
    /// # Errors
    /// - [`PPError::InvalidKernelParam`] naming the first offending parameter.
    pub fn new(base: f64, beta: f64) -> PPResult<ExcitationKernel> {
        if !base.is_finite() || base <= 0.0 {
            return Err(PPError::InvalidKernelParam { name: "base", value: base });
        }
        if !beta.is_finite() || beta <= 0.0 {
            return Err(PPError::InvalidKernelParam { name: "beta", value: beta });
        }
        Ok(ExcitationKernel { base, beta })
    }

    /// Pointwise intensity of `entity` at `cur_time`.
    ///
    /// Sums, over every incoming edge, the rectified weight times the decayed
    /// contributions of the neighbor's strictly past events.
    pub fn intensity(
        &self, history: &EntityHistory, neighbors: &NeighborList, entity: usize, cur_time: f64,
    ) -> f64 {
        neighbors.neighbors(entity).iter().fold(self.base, |acc, edge| {
            let excitation: f64 = history
                .before(edge.entity, cur_time)
                .iter()
                .map(|&t_e| (-self.beta * (cur_time - t_e)).exp())
                .sum();
            acc + edge.weight * excitation
        })
    }

    /// Closed-form compensator of `entity` over `[t_start, t_end]`.
    ///
    /// Every event of every neighbor contributes `1 - exp(-β (t_end - t_e))`,
    /// whether or not it lies inside the interval.
    pub fn compensator(
        &self, history: &EntityHistory, neighbors: &NeighborList, entity: usize, t_start: f64,
        t_end: f64,
    ) -> f64 {
        neighbors.neighbors(entity).iter().fold(self.base * (t_end - t_start), |acc, edge| {
            let excitation: f64 = history
                .times(edge.entity)
                .iter()
                .map(|&t_e| 1.0 - (-self.beta * (t_end - t_e)).exp())
                .sum();
            acc + edge.weight * excitation
        })
    }
}

impl Default for ExcitationKernel {
    fn default() -> Self {
        ExcitationKernel { base: DEFAULT_BASE, beta: DEFAULT_BETA }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_process::core::events::RawEvent;
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Kernel parameter validation.
    // - Pointwise intensity: degenerate, hand-computed, and causal cases.
    // - Compensator: zero-adjacency reduction, monotonicity, full-history sum.
    // -------------------------------------------------------------------------

    fn history(times: &[&[f64]]) -> EntityHistory {
        let batch: Vec<Sequence> = times
            .iter()
            .map(|ts| ts.iter().map(|&t| RawEvent::with_mark(t, 0)).collect())
            .collect();
        EntityHistory::from_batch(&batch).unwrap()
    }

    #[test]
    fn kernel_new_rejects_non_positive_parameters() {
        assert_eq!(
            ExcitationKernel::new(0.0, 1.0).unwrap_err(),
            PPError::InvalidKernelParam { name: "base", value: 0.0 }
        );
        assert!(matches!(
            ExcitationKernel::new(0.1, f64::NAN),
            Err(PPError::InvalidKernelParam { name: "beta", .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // With an all-zero adjacency, intensity is the base rate and the
    // compensator is `base * interval length`, for every entity.
    //
    // Given
    // -----
    // - Two empty entities, zero 2x2 adjacency, window [0, 2].
    fn zero_adjacency_reduces_to_base_rate() {
        let kernel = ExcitationKernel::default();
        let hist = history(&[&[], &[]]);
        let nl = NeighborList::from_adjacency(Array2::zeros((2, 2)).view(), 2).unwrap();

        for entity in 0..2 {
            assert_eq!(kernel.intensity(&hist, &nl, entity, 0.5), kernel.base);
            let comp = kernel.compensator(&hist, &nl, entity, 0.0, 2.0);
            assert!((comp - kernel.base * 2.0).abs() < 1e-15);
        }
    }

    #[test]
    // Purpose
    // -------
    // Hand-computed single-edge intensity.
    //
    // Given
    // -----
    // - Entity 0 listens to entity 1 with weight 1.0.
    // - Entity 1 has one event at t = 0.
    // - β = 2.5, query at t = 1.0.
    //
    // Expect
    // ------
    // - λ_0(1.0) = base + exp(-2.5).
    fn single_edge_intensity_matches_closed_form() {
        let kernel = ExcitationKernel::new(0.1, 2.5).unwrap();
        let hist = history(&[&[], &[0.0]]);
        let nl = NeighborList::from_adjacency(array![[0.0, 1.0], [0.0, 0.0]].view(), 2).unwrap();

        let lambda = kernel.intensity(&hist, &nl, 0, 1.0);

        assert!((lambda - (0.1 + (-2.5f64).exp())).abs() < 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Only strictly past events excite; an event at exactly `t` or later
    // leaves the intensity at the base rate.
    fn intensity_is_strictly_causal() {
        let kernel = ExcitationKernel::default();
        let hist = history(&[&[], &[1.0, 3.0]]);
        let nl = NeighborList::from_adjacency(array![[0.0, 0.7], [0.0, 0.0]].view(), 2).unwrap();

        assert_eq!(kernel.intensity(&hist, &nl, 0, 1.0), kernel.base);
        assert!(kernel.intensity(&hist, &nl, 0, 1.0 + 1e-9) > kernel.base);
        let between = kernel.intensity(&hist, &nl, 0, 2.0);
        assert!((between - (kernel.base + 0.7 * (-kernel.beta).exp())).abs() < 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Negative edge weights are rectified and never excite.
    fn negative_weights_do_not_excite() {
        let kernel = ExcitationKernel::default();
        let hist = history(&[&[], &[0.5]]);
        let nl = NeighborList::from_adjacency(array![[0.0, -3.0], [0.0, 0.0]].view(), 2).unwrap();

        assert_eq!(kernel.intensity(&hist, &nl, 0, 1.0), kernel.base);
    }

    #[test]
    // Purpose
    // -------
    // For a fixed history, the compensator grows with the interval length.
    fn compensator_is_monotone_in_interval_length() {
        let kernel = ExcitationKernel::default();
        let hist = history(&[&[0.2, 0.9], &[0.1, 0.4, 0.8]]);
        let nl = NeighborList::from_adjacency(array![[0.3, 1.2], [0.5, 0.0]].view(), 2).unwrap();

        let mut previous = f64::NEG_INFINITY;
        for k in 1..20 {
            let comp = kernel.compensator(&hist, &nl, 0, 0.0, 1.0 + 0.25 * k as f64);
            assert!(comp > previous);
            previous = comp;
        }
    }

    #[test]
    // Purpose
    // -------
    // The compensator sums over the neighbor's whole history, so an event
    // after `t_end` contributes `1 - exp(-β (t_end - t_e)) < 0`.
    //
    // Given
    // -----
    // - Neighbor events at 0.5 (inside) and 3.0 (after t_end = 2).
    //
    // Expect
    // ------
    // - Λ = base·2 + (1 - e^{-β·1.5}) + (1 - e^{β·1.0}).
    fn compensator_uses_full_neighbor_history() {
        let kernel = ExcitationKernel::new(0.1, 2.5).unwrap();
        let hist = history(&[&[], &[0.5, 3.0]]);
        let nl = NeighborList::from_adjacency(array![[0.0, 1.0], [0.0, 0.0]].view(), 2).unwrap();

        let comp = kernel.compensator(&hist, &nl, 0, 0.0, 2.0);

        let expected = 0.2 + (1.0 - (-2.5f64 * 1.5).exp()) + (1.0 - (2.5f64).exp());
        assert!((comp - expected).abs() < 1e-12);
    }
}
