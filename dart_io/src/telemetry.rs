//! A reduced, serializable view of link state for the telemetry task to
//! publish, mirroring `evo`'s `SystemState` snapshot pattern but scoped to
//! this process's vehicle link rather than a fleet of watched modules.

use dart_common::state::DroneState;
use dart_units::Frame;

use crate::link::VehicleMode;

#[derive(Clone, Debug, PartialEq)]
pub struct LinkTelemetry<F: Frame> {
    pub connected: bool,
    pub armed: bool,
    pub mode: VehicleMode,
    pub state: Option<DroneState<F>>,
}

pub fn sample<F: Frame>(connected: bool, armed: bool, mode: VehicleMode, state: Option<DroneState<F>>) -> LinkTelemetry<F> {
    LinkTelemetry { connected, armed, mode, state }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_units::{Enu, Vec3};

    #[test]
    fn disconnected_sample_carries_no_state() {
        let t = sample::<Enu>(false, false, VehicleMode::Manual, None);
        assert!(t.state.is_none());
        assert!(!t.connected);
    }

    #[test]
    fn connected_sample_carries_state() {
        let state = DroneState::<Enu>::hover_at(Vec3::new(0.0, 0.0, 1.0));
        let t = sample(true, true, VehicleMode::Offboard, Some(state));
        assert!(t.state.is_some());
        assert_eq!(t.mode, VehicleMode::Offboard);
    }
}
