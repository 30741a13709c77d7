//! core — events, time grid, adjacency, excitation kernel, and pass state.
//!
//! Purpose
//! -------
//! Collect the data-side building blocks of the point-process likelihood:
//! event containers and corpus parsing, the merged time axis with its index
//! bookkeeping, sparse neighbor lists, the exponential excitation kernel,
//! forward-pass options, and the per-pass accumulator state. The models
//! layer composes these into the forward pass.
//!
//! Key behaviors
//! -------------
//! - Merge per-entity sequences into one sorted stream ([`merge_sequences`])
//!   or parse them from text ([`parse_corpus`]).
//! - Build the merged axis of grid points and event times
//!   ([`build_time_grid`]).
//! - Precompute incoming edges from a dense adjacency ([`NeighborList`]).
//! - Evaluate intensity and compensator in closed form
//!   ([`ExcitationKernel`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Times are finite; grid and kernel parameters are validated on
//!   construction and reported as [`PPError`](crate::point_process::errors::PPError).
//! - Entity ids are batch-local positions `0..N-1` everywhere.
//!
//! Downstream usage
//! ----------------
//! - `point_process::models` depends on the re-exports below or the
//!   [`prelude`] rather than reaching into submodules.

pub mod adjacency;
pub mod events;
pub mod grid;
pub mod kernel;
pub mod options;
pub mod workspace;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::adjacency::{Neighbor, NeighborList};
pub use self::events::{Event, RawEvent, Sequence, merge_sequences, parse_corpus};
pub use self::grid::{GridSpec, MergedTimeAxis, TimeGrid, TimedEvent, build_time_grid};
pub use self::kernel::{DEFAULT_BASE, DEFAULT_BETA, EntityHistory, ExcitationKernel};
pub use self::options::{ForwardOptions, validate_lag_offsets};
pub use self::workspace::AccumulatorState;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_stpp::point_process::core::prelude::*;
//
// to import the main core surface in a single line.

pub mod prelude {
    pub use super::adjacency::NeighborList;
    pub use super::events::{Event, RawEvent, Sequence, merge_sequences, parse_corpus};
    pub use super::grid::{GridSpec, MergedTimeAxis, build_time_grid};
    pub use super::kernel::{EntityHistory, ExcitationKernel};
    pub use super::options::ForwardOptions;
}
