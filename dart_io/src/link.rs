//! The vehicle I/O boundary: a small async trait any concrete transport
//! (simulated, or a real autopilot link) implements, and the errors it can
//! raise. A disconnected or stale link is category (4) of the error
//! taxonomy — recoverable by the caller triggering a failsafe transition,
//! not by retrying here.

use async_trait::async_trait;
use dart_common::command::ControlCommand;
use dart_common::error::DartError;
use dart_common::state::DroneState;
use dart_units::Frame;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LinkError {
    #[error("vehicle link is not connected")]
    NotConnected,

    #[error("vehicle link is already connected")]
    AlreadyConnected,

    #[error("vehicle link timed out")]
    Timeout,

    #[error("vehicle rejected request: {0}")]
    Rejected(String),
}

impl From<LinkError> for DartError {
    fn from(e: LinkError) -> Self {
        DartError::Link(e.to_string())
    }
}

/// Flight mode as understood by the vehicle side of the link, distinct
/// from the mission/failsafe state tracked by the autonomy core.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VehicleMode {
    Manual,
    Offboard,
    PositionHold,
    Land,
}

/// A vehicle transport: connect/disconnect, read state, and issue
/// commands. Implementations own their own connection lifetime; callers
/// never retry past a `LinkError` themselves, they hand it to safety.
#[async_trait]
pub trait VehicleLink<F: Frame>: Send + Sync {
    async fn connect(&mut self) -> Result<(), LinkError>;

    async fn disconnect(&mut self) -> Result<(), LinkError>;

    async fn get_state(&self) -> Result<DroneState<F>, LinkError>;

    async fn send_command(&mut self, command: ControlCommand) -> Result<(), LinkError>;

    async fn arm(&mut self) -> Result<(), LinkError>;

    async fn disarm(&mut self) -> Result<(), LinkError>;

    async fn set_mode(&mut self, mode: VehicleMode) -> Result<(), LinkError>;
}
