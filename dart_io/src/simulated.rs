//! A point-mass vehicle mock: no hardware, no network, just enough
//! dynamics (gravity plus a commanded thrust vector) to exercise the
//! scheduler/controller/planner chain end to end in tests and sim runs.

use std::time::Instant;

use async_trait::async_trait;
use dart_common::command::{BodyRateCommand, ControlCommand};
use dart_common::state::DroneState;
use dart_units::{quaternion, Frame, Vec3};
use nalgebra::Vector3;
use parking_lot::Mutex;

use crate::link::{LinkError, VehicleLink, VehicleMode};

struct SimInner<F: Frame> {
    connected: bool,
    armed: bool,
    mode: VehicleMode,
    mass_kg: f64,
    thrust_max_n: f64,
    state: DroneState<F>,
    last_command: BodyRateCommand,
    last_tick: Instant,
}

/// A [`VehicleLink`] backed by a double-integrator-with-attitude point
/// mass instead of real hardware. `mass_kg`/`thrust_max_n` mirror
/// `dart_common::config::HardwareConfig`'s vehicle parameters.
pub struct SimulatedVehicleLink<F: Frame> {
    inner: Mutex<SimInner<F>>,
}

impl<F: Frame> SimulatedVehicleLink<F> {
    pub fn new(mass_kg: f64, thrust_max_n: f64, initial: DroneState<F>) -> Self {
        Self {
            inner: Mutex::new(SimInner {
                connected: false,
                armed: false,
                mode: VehicleMode::Manual,
                mass_kg,
                thrust_max_n,
                state: initial,
                last_command: BodyRateCommand::safe_zero(),
                last_tick: Instant::now(),
            }),
        }
    }

    /// Integrate from `last_tick` to now, holding the last received
    /// command constant over the interval. Disarmed vehicles hold
    /// position rather than free-fall, matching a motors-off bench test.
    fn advance(inner: &mut SimInner<F>) {
        let now = Instant::now();
        let dt = (now - inner.last_tick).as_secs_f64();
        inner.last_tick = now;
        if dt <= 0.0 || !inner.armed {
            return;
        }

        let dq = quaternion::exp_map(&inner.last_command.body_rates, dt);
        inner.state.attitude = quaternion::mul(&inner.state.attitude, &dq);
        inner.state.angular_velocity = inner.last_command.body_rates;

        let body_z = inner.state.attitude * Vector3::z();
        let thrust_vec = body_z * (inner.last_command.thrust * inner.thrust_max_n);
        let accel = thrust_vec / inner.mass_kg + F::gravity();

        inner.state.velocity = inner.state.velocity + Vec3::from_nalgebra(accel * dt);
        inner.state.position = inner.state.position + inner.state.velocity.scale(dt);
        inner.state.timestamp += dt;
    }
}

#[async_trait]
impl<F: Frame> VehicleLink<F> for SimulatedVehicleLink<F> {
    async fn connect(&mut self) -> Result<(), LinkError> {
        let mut g = self.inner.lock();
        if g.connected {
            return Err(LinkError::AlreadyConnected);
        }
        g.connected = true;
        g.last_tick = Instant::now();
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        let mut g = self.inner.lock();
        g.connected = false;
        g.armed = false;
        Ok(())
    }

    async fn get_state(&self) -> Result<DroneState<F>, LinkError> {
        let mut g = self.inner.lock();
        if !g.connected {
            return Err(LinkError::NotConnected);
        }
        Self::advance(&mut g);
        Ok(g.state)
    }

    async fn send_command(&mut self, command: ControlCommand) -> Result<(), LinkError> {
        let mut g = self.inner.lock();
        if !g.connected {
            return Err(LinkError::NotConnected);
        }
        if !g.armed {
            return Err(LinkError::Rejected("vehicle is not armed".to_string()));
        }
        Self::advance(&mut g);
        match command {
            ControlCommand::BodyRate(c) => {
                if !c.is_finite() {
                    return Err(LinkError::Rejected("non-finite command".to_string()));
                }
                g.last_command = c;
                Ok(())
            }
            ControlCommand::Motors(_) => {
                Err(LinkError::Rejected("simulated link expects pre-mix body-rate commands".to_string()))
            }
        }
    }

    async fn arm(&mut self) -> Result<(), LinkError> {
        let mut g = self.inner.lock();
        if !g.connected {
            return Err(LinkError::NotConnected);
        }
        g.armed = true;
        g.last_tick = Instant::now();
        Ok(())
    }

    async fn disarm(&mut self) -> Result<(), LinkError> {
        let mut g = self.inner.lock();
        g.armed = false;
        g.last_command = BodyRateCommand::safe_zero();
        Ok(())
    }

    async fn set_mode(&mut self, mode: VehicleMode) -> Result<(), LinkError> {
        let mut g = self.inner.lock();
        if !g.connected {
            return Err(LinkError::NotConnected);
        }
        g.mode = mode;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_units::Enu;

    fn link() -> SimulatedVehicleLink<Enu> {
        SimulatedVehicleLink::new(1.5, 30.0, DroneState::hover_at(Vec3::new(0.0, 0.0, 5.0)))
    }

    #[tokio::test]
    async fn get_state_before_connect_is_rejected() {
        let l = link();
        assert_eq!(l.get_state().await.unwrap_err(), LinkError::NotConnected);
    }

    #[tokio::test]
    async fn commands_before_arming_are_rejected() {
        let mut l = link();
        l.connect().await.unwrap();
        let cmd = ControlCommand::BodyRate(BodyRateCommand { thrust: 0.5, body_rates: Vector3::zeros() });
        assert!(l.send_command(cmd).await.is_err());
    }

    #[tokio::test]
    async fn hover_thrust_roughly_holds_altitude() {
        let mut l = SimulatedVehicleLink::<Enu>::new(1.5, 30.0, DroneState::hover_at(Vec3::new(0.0, 0.0, 5.0)));
        l.connect().await.unwrap();
        l.arm().await.unwrap();
        let hover_thrust = (1.5 * 9.80665) / 30.0;
        let cmd = ControlCommand::BodyRate(BodyRateCommand { thrust: hover_thrust, body_rates: Vector3::zeros() });
        l.send_command(cmd).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let s = l.get_state().await.unwrap();
        assert!((s.position.z() - 5.0).abs() < 0.05);
    }

    #[tokio::test]
    async fn disarm_resets_last_command_to_safe_zero() {
        let mut l = link();
        l.connect().await.unwrap();
        l.arm().await.unwrap();
        let cmd = ControlCommand::BodyRate(BodyRateCommand { thrust: 0.9, body_rates: Vector3::zeros() });
        l.send_command(cmd).await.unwrap();
        l.disarm().await.unwrap();
        assert_eq!(l.inner.lock().last_command, BodyRateCommand::safe_zero());
    }
}
