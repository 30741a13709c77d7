//! Accumulator workspace — per-pass mutable state of the likelihood scan.
//!
//! Purpose
//! -------
//! Hold everything the likelihood accumulator mutates while it walks the
//! event stream: the set of entities that already produced an event, the
//! running log-likelihood, and the per-lag mismatch log written by type
//! prediction. One value per computation; nothing is shared between passes.
//!
//! Invariants & assumptions
//! ------------------------
//! - The happened set is monotone: entities are inserted, never removed.
//! - The mismatch log has exactly one row per lag offset, and every row has
//!   the same length (one entry per scored event).
//!
//! Conventions
//! -----------
//! - Entity ids index directly into the happened set; ids outside the batch
//!   are reported as [`PPError::EntityOutOfRange`].
use crate::point_process::errors::{PPError, PPResult};

/// AccumulatorState — happened set, running log-likelihood, mismatch log.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorState {
    happened: Vec<bool>,
    loglik: f64,
    mismatches: Vec<Vec<f64>>,
}

impl AccumulatorState {
    /// Fresh state for `entities` entities and `lags` lag offsets.
    ///
    /// With `predict_first`, every entity starts in the happened set.
    pub fn new(entities: usize, lags: usize, predict_first: bool) -> AccumulatorState {
        AccumulatorState {
            happened: vec![predict_first; entities],
            loglik: 0.0,
            mismatches: vec![Vec::new(); lags],
        }
    }

    /// # Errors
    /// - [`PPError::EntityOutOfRange`] for an id outside the batch.
    pub fn has_happened(&self, entity: usize) -> PPResult<bool> {
        self.happened
            .get(entity)
            .copied()
            .ok_or(PPError::EntityOutOfRange { entity, entities: self.happened.len() })
    }

    /// # Errors
    /// - [`PPError::EntityOutOfRange`] for an id outside the batch.
    pub fn mark_happened(&mut self, entity: usize) -> PPResult<()> {
        let entities = self.happened.len();
        let slot =
            self.happened.get_mut(entity).ok_or(PPError::EntityOutOfRange { entity, entities })?;
        *slot = true;
        Ok(())
    }

    /// Add one event term `ln λ`.
    pub fn add_log_intensity(&mut self, log_intensity: f64) {
        self.loglik += log_intensity;
    }

    /// Subtract one entity's compensator.
    pub fn subtract_compensator(&mut self, compensator: f64) {
        self.loglik -= compensator;
    }

    /// Append one scored event: `flags[k]` is the mismatch indicator for lag `k`.
    pub fn record_mismatches(&mut self, flags: &[f64]) {
        for (row, &flag) in self.mismatches.iter_mut().zip(flags) {
            row.push(flag);
        }
    }

    pub fn loglik(&self) -> f64 {
        self.loglik
    }

    /// Number of events scored by type prediction so far.
    pub fn scored(&self) -> usize {
        self.mismatches.first().map_or(0, Vec::len)
    }

    /// Mismatch indicators, one row per lag offset.
    pub fn mismatch_log(&self) -> &[Vec<f64>] {
        &self.mismatches
    }
}
