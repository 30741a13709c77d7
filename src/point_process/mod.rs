//! point_process — multi-entity temporal point processes driven by a latent
//! ODE state.
//!
//! Purpose
//! -------
//! Evaluate the log-likelihood of a batch of event sequences under an
//! exponential excitation kernel with a fixed entity adjacency, while a
//! latent continuous-time state is integrated on the merged time axis and
//! read out into an intensity trace used for type prediction.
//!
//! Layout
//! ------
//! - `core`: events, time grid, adjacency, kernel, options, accumulator
//!   state.
//! - `dynamics`: collaborator traits and the trajectory evaluator, plus a
//!   reference Dormand–Prince integrator.
//! - `models`: forward pass, likelihood, prediction, calibration.
//! - `errors`: [`PPError`](errors::PPError) and [`PPResult`](errors::PPResult).
//!
//! Conventions
//! -----------
//! - Entities are the batch-local positions `0..N-1` of the input sequences.
//! - All fallible operations return `PPResult`; nothing panics on bad input.

pub mod core;
pub mod dynamics;
pub mod errors;
pub mod models;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_stpp::point_process::prelude::*;
//
// to import the main point-process surface in a single line.

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::dynamics::{
        IntegratorMethod, OdeIntegrator, OdeTolerances, Readout, StateDynamics,
        dopri::DormandPrince,
    };
    pub use super::errors::{PPError, PPResult};
    pub use super::models::prelude::*;
}
