//! # DART SE(3) Trajectory Planner
//!
//! Receding-horizon trajectory generation: given the current state and a
//! goal, produce a reference trajectory the geometric controller can
//! track, staying clear of known obstacles and within the configured
//! workspace and dynamic limits.
//!
//! - [`cost`] — the per-knot and summed cost terms.
//! - [`constraints`] — box clamps and workspace projection.
//! - [`mpc`] — the solve itself, [`Planner::plan`].

pub mod constraints;
pub mod cost;
pub mod mpc;

pub use mpc::Planner;
