//! # DART Vehicle I/O
//!
//! The boundary between the autonomy core and a vehicle: the
//! [`link::VehicleLink`] trait any transport implements, a
//! [`simulated::SimulatedVehicleLink`] mock for development and tests, a
//! reduced [`telemetry`] snapshot for publishing link state, and the
//! [`mission::upload_mission`] entry point for accepting a new mission.

pub mod link;
pub mod mission;
pub mod simulated;
pub mod telemetry;

pub use link::{LinkError, VehicleLink, VehicleMode};
pub use mission::upload_mission;
pub use simulated::SimulatedVehicleLink;
