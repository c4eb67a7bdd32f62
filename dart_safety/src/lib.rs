//! # DART Safety Core
//!
//! State buffering with transport-delay compensation, lock-free snapshot
//! publication, liveness tracking, and the mission-level failsafe state
//! machine.
//!
//! - [`buffer`] — bounded, time-indexed `DroneState` history.
//! - [`snapshot`] — publish-once/read-many handle swap for the latest
//!   trajectory and other single-writer/multi-reader values.
//! - [`heartbeat`] — per-producer liveness tracking.
//! - [`failsafe`] — the `INIT..EMERGENCY_STOP` state machine.

pub mod buffer;
pub mod failsafe;
pub mod heartbeat;
pub mod snapshot;

pub use buffer::{BufferError, StateBuffer};
pub use failsafe::{Failsafe, FailsafeInputs, FailsafeState, PilotCommand};
pub use heartbeat::{HeartbeatMonitor, Producer};
pub use snapshot::Snapshot;
