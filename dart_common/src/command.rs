//! Control commands: the controller's pre-mix output and the mixer's
//! post-mix output.

use nalgebra::Vector3;

/// Collective thrust (normalized `[0, 1]`) plus a body-rate setpoint,
/// rad/s. The controller's direct output.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BodyRateCommand {
    pub thrust: f64,
    pub body_rates: Vector3<f64>,
}

impl BodyRateCommand {
    pub fn is_finite(&self) -> bool {
        self.thrust.is_finite() && self.body_rates.iter().all(|v| v.is_finite())
    }

    /// The safe command emitted on a non-finite-input failure: zero
    /// thrust, zero rates.
    pub fn safe_zero() -> Self {
        Self { thrust: 0.0, body_rates: Vector3::zeros() }
    }
}

/// Four per-rotor thrusts (Newtons) after the motor mixer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MotorThrusts {
    pub motors: [f64; 4],
}

impl MotorThrusts {
    pub fn is_finite(&self) -> bool {
        self.motors.iter().all(|v| v.is_finite())
    }

    pub fn sum(&self) -> f64 {
        self.motors.iter().sum()
    }
}

/// The sum type the vehicle I/O link accepts: a pre-mix body-rate command
/// or an already-mixed set of motor thrusts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ControlCommand {
    BodyRate(BodyRateCommand),
    Motors(MotorThrusts),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_zero_is_finite_and_zero() {
        let c = BodyRateCommand::safe_zero();
        assert!(c.is_finite());
        assert_eq!(c.thrust, 0.0);
    }

    #[test]
    fn motor_thrusts_sum() {
        let m = MotorThrusts { motors: [1.0, 2.0, 3.0, 4.0] };
        assert_eq!(m.sum(), 10.0);
    }
}
