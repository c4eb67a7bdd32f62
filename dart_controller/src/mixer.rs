//! Motor mixer: maps `(thrust_total, body_torques)` to four per-rotor
//! thrusts using vehicle geometry (X/plus, arm length, drag coefficient).
//!
//! The forward allocation — each motor's thrust contribution to total
//! thrust, roll torque, pitch torque, and yaw torque — is assembled as a
//! 4x4 matrix from motor position and spin direction; mixing is that
//! matrix's inverse applied to the commanded `[T, roll, pitch, yaw]`
//! vector. This generalizes cleanly to both geometries rather than
//! special-casing each with its own closed-form coefficients.

use dart_common::command::MotorThrusts;
use dart_common::config::MotorGeometry;
use nalgebra::{Matrix4, Vector3, Vector4};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MixerError {
    #[error("motor allocation matrix is singular for the configured geometry")]
    SingularAllocation,
}

#[derive(Debug, Clone)]
pub struct MotorMixer {
    /// Inverse of the forward allocation matrix: maps `[T, roll, pitch,
    /// yaw]` to per-motor thrusts.
    inverse_allocation: Matrix4<f64>,
    max_motor_thrust: f64,
}

impl MotorMixer {
    pub fn new(
        geometry: MotorGeometry,
        arm_length_m: f64,
        drag_coefficient: f64,
        max_motor_thrust: f64,
    ) -> Result<Self, MixerError> {
        let positions = motor_positions(geometry, arm_length_m);
        // Diagonal pairs spin opposite directions so reaction yaw torque
        // cancels in steady hover; (0, 2) are +1 (CW), (1, 3) are -1 (CCW).
        let spin_signs = [1.0, -1.0, 1.0, -1.0];

        let mut allocation = Matrix4::<f64>::zeros();
        for i in 0..4 {
            let (x, y) = positions[i];
            allocation[(0, i)] = 1.0; // total thrust
            allocation[(1, i)] = y; // roll torque = sum(y_i * f_i)
            allocation[(2, i)] = -x; // pitch torque = sum(-x_i * f_i)
            allocation[(3, i)] = spin_signs[i] * drag_coefficient; // yaw torque
        }

        let inverse_allocation = allocation.try_inverse().ok_or(MixerError::SingularAllocation)?;
        Ok(Self { inverse_allocation, max_motor_thrust })
    }

    /// `thrust_total` Newtons, `body_torques` = (roll, pitch, yaw) Nm.
    /// Output per motor clamped to `[0, max_motor_thrust]`.
    pub fn mix(&self, thrust_total: f64, body_torques: Vector3<f64>) -> MotorThrusts {
        let b = Vector4::new(thrust_total, body_torques.x, body_torques.y, body_torques.z);
        let f = self.inverse_allocation * b;
        let mut motors = [0.0; 4];
        for i in 0..4 {
            motors[i] = f[i].clamp(0.0, self.max_motor_thrust);
        }
        MotorThrusts { motors }
    }
}

fn motor_positions(geometry: MotorGeometry, arm_length_m: f64) -> [(f64, f64); 4] {
    match geometry {
        MotorGeometry::X => {
            let c = std::f64::consts::FRAC_1_SQRT_2 * arm_length_m;
            [(c, c), (-c, c), (-c, -c), (c, -c)]
        }
        MotorGeometry::Plus => {
            let l = arm_length_m;
            [(l, 0.0), (0.0, l), (-l, 0.0), (0.0, -l)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn x_mixer() -> MotorMixer {
        MotorMixer::new(MotorGeometry::X, 0.225, 0.05, 8.0).unwrap()
    }

    fn plus_mixer() -> MotorMixer {
        MotorMixer::new(MotorGeometry::Plus, 0.225, 0.05, 8.0).unwrap()
    }

    #[test]
    fn pure_thrust_splits_evenly_across_motors_x() {
        let m = x_mixer();
        let out = m.mix(4.0, Vector3::zeros());
        for f in out.motors {
            assert_relative_eq!(f, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn motor_sum_reproduces_commanded_thrust_x() {
        let m = x_mixer();
        let out = m.mix(6.0, Vector3::new(0.1, -0.2, 0.05));
        assert_relative_eq!(out.sum(), 6.0, epsilon = 1e-6);
    }

    #[test]
    fn motor_sum_reproduces_commanded_thrust_plus() {
        let m = plus_mixer();
        let out = m.mix(5.0, Vector3::new(0.05, 0.1, -0.02));
        assert_relative_eq!(out.sum(), 5.0, epsilon = 1e-6);
    }

    #[test]
    fn torques_round_trip_through_forward_allocation_x() {
        let geometry = MotorGeometry::X;
        let arm = 0.225;
        let drag = 0.05;
        let m = MotorMixer::new(geometry, arm, drag, 100.0).unwrap();
        let commanded_torque = Vector3::new(0.2, -0.15, 0.1);
        let out = m.mix(8.0, commanded_torque);

        let positions = motor_positions(geometry, arm);
        let spin_signs = [1.0, -1.0, 1.0, -1.0];
        let mut roll = 0.0;
        let mut pitch = 0.0;
        let mut yaw = 0.0;
        let mut total = 0.0;
        for i in 0..4 {
            let (x, y) = positions[i];
            roll += y * out.motors[i];
            pitch += -x * out.motors[i];
            yaw += spin_signs[i] * drag * out.motors[i];
            total += out.motors[i];
        }
        assert_relative_eq!(total, 8.0, epsilon = 1e-6);
        assert_relative_eq!(roll, commanded_torque.x, epsilon = 1e-6);
        assert_relative_eq!(pitch, commanded_torque.y, epsilon = 1e-6);
        assert_relative_eq!(yaw, commanded_torque.z, epsilon = 1e-6);
    }

    #[test]
    fn output_is_clamped_to_motor_limit() {
        let m = MotorMixer::new(MotorGeometry::X, 0.225, 0.05, 2.0).unwrap();
        let out = m.mix(20.0, Vector3::zeros());
        for f in out.motors {
            assert!(f <= 2.0 + 1e-9);
            assert!(f >= 0.0);
        }
    }
}
