//! Sparse neighbor lists derived from a dense adjacency matrix.
//!
//! The excitation kernel only needs, for each target entity `i`, the entities
//! `j` with `A[i, j] != 0` and their rectified weights. [`NeighborList`] scans
//! the dense matrix once and stores exactly that, so the per-event hot loop
//! never touches zero entries.
//!
//! Conventions:
//! - Row `i` describes who excites `i` (incoming influence).
//! - Negative weights are kept as neighbors but rectified to `0.0`; they never
//!   contribute excitation.
use crate::point_process::errors::{PPError, PPResult};
use ndarray::ArrayView2;

/// A single incoming edge `j -> i` with rectified weight `max(A[i, j], 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub entity: usize,
    pub weight: f64,
}

/// Per-entity incoming edges, precomputed from an adjacency matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborList {
    rows: Vec<Vec<Neighbor>>,
}

impl NeighborList {
    /// Build neighbor lists from an `n × n` adjacency matrix.
    ///
    /// # Arguments
    /// - `adjacency`: dense matrix; entry `(i, j)` is the influence of `j` on `i`.
    /// - `entities`: number of entities in the batch; must equal both dimensions.
    ///
    /// # Errors
    /// - [`PPError::AdjacencyShapeMismatch`] if the matrix is not `entities × entities`.
    /// - [`PPError::NonFiniteAdjacency`] for the first NaN/±inf entry.
    pub fn from_adjacency(adjacency: ArrayView2<f64>, entities: usize) -> PPResult<NeighborList> {
        let (rows, cols) = adjacency.dim();
        if rows != entities || cols != entities {
            return Err(PPError::AdjacencyShapeMismatch { rows, cols, entities });
        }
        let mut neighbor_rows = Vec::with_capacity(rows);
        for (row, values) in adjacency.outer_iter().enumerate() {
            let mut neighbors = Vec::new();
            for (col, &value) in values.iter().enumerate() {
                if !value.is_finite() {
                    return Err(PPError::NonFiniteAdjacency { row, col, value });
                }
                if value != 0.0 {
                    neighbors.push(Neighbor { entity: col, weight: value.max(0.0) });
                }
            }
            neighbor_rows.push(neighbors);
        }
        Ok(NeighborList { rows: neighbor_rows })
    }

    /// Incoming edges of `entity`; empty for an isolated entity.
    pub fn neighbors(&self, entity: usize) -> &[Neighbor] {
        self.rows.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of entities covered.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
