//! The instantaneous vehicle configuration, parameterized over the active
//! world frame so a value built under ENU cannot be fed to NED-expecting
//! code by accident.

use dart_units::{Frame, UnitsError, Vec3};
use nalgebra::{UnitQuaternion, Vector3};

/// Quaternion norm tolerance band required of every `DroneState`.
pub const QUATERNION_NORM_TOLERANCE: f64 = 1e-6;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DroneState<F: Frame> {
    /// Monotonic seconds.
    pub timestamp: f64,
    /// Meters, world frame.
    pub position: Vec3<F>,
    /// Meters/second, world frame.
    pub velocity: Vec3<F>,
    /// Unit quaternion, body-to-world rotation.
    pub attitude: UnitQuaternion<f64>,
    /// Radians/second, body frame.
    pub angular_velocity: Vector3<f64>,
}

impl<F: Frame> DroneState<F> {
    pub fn validate(&self) -> Result<(), UnitsError> {
        let norm = self.attitude.norm();
        if (norm - 1.0).abs() > QUATERNION_NORM_TOLERANCE {
            return Err(UnitsError::QuaternionNotNormalized {
                norm,
                lo: 1.0 - QUATERNION_NORM_TOLERANCE,
                hi: 1.0 + QUATERNION_NORM_TOLERANCE,
            });
        }
        if !self.position.is_finite() {
            return Err(UnitsError::NonFinite { where_: "DroneState::position", value: self.position.norm() });
        }
        if !self.velocity.is_finite() {
            return Err(UnitsError::NonFinite { where_: "DroneState::velocity", value: self.velocity.norm() });
        }
        if !self.angular_velocity.iter().all(|v| v.is_finite()) {
            return Err(UnitsError::NonFinite { where_: "DroneState::angular_velocity", value: self.angular_velocity.norm() });
        }
        Ok(())
    }

    pub fn hover_at(position: Vec3<F>) -> Self {
        Self {
            timestamp: 0.0,
            position,
            velocity: Vec3::zero(),
            attitude: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_units::Enu;

    #[test]
    fn fresh_hover_state_validates() {
        let s = DroneState::<Enu>::hover_at(Vec3::new(0.0, 0.0, 5.0));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn denormalized_quaternion_is_rejected() {
        let mut s = DroneState::<Enu>::hover_at(Vec3::zero());
        s.attitude = UnitQuaternion::new_unchecked(s.attitude.into_inner() * 2.0);
        assert!(s.validate().is_err());
    }

    #[test]
    fn non_finite_position_is_rejected() {
        let mut s = DroneState::<Enu>::hover_at(Vec3::zero());
        s.position = Vec3::new(f64::NAN, 0.0, 0.0);
        assert!(s.validate().is_err());
    }
}
