//! # DART Units Kernel
//!
//! Coordinate frame conventions, quaternion/rotation algebra, and unit-tagged
//! scalar/vector primitives shared by the planner, controller, and safety
//! core. Everything here is a leaf: no dependency on any other `dart_*`
//! crate.
//!
//! ## Frames
//!
//! World frame is a type-level tag ([`Enu`], [`Ned`]), never a runtime flag.
//! Quantities that carry a frame (positions, velocities) are parameterized
//! over it so mixing ENU and NED values at a call boundary is a compile
//! error, not a runtime bug.
//!
//! ## Units
//!
//! [`Quantity`] tags a scalar with a [`Unit`] so mismatched units are
//! rejected at the boundary before they reach the physics loop.

pub mod attitude;
pub mod error;
pub mod frame;
pub mod quaternion;
pub mod units;

pub use error::UnitsError;
pub use frame::{Enu, Frame, Ned, Vec3};
pub use quaternion::{exp_map, log_map, normalize, slerp};
pub use units::{Unit, Quantity};
