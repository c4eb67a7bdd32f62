//! Box constraints applied to the control sequence and the workspace the
//! solution is expected to stay within. Kept separate from [`crate::cost`]
//! because these are hard clamps, not penalty terms.

use dart_units::{Frame, Vec3};
use nalgebra::Vector3;

/// Clamp an acceleration command to the configured per-axis magnitude
/// bound. A norm clamp rather than per-axis, so diagonal commands are not
/// favored over axis-aligned ones.
pub fn clamp_acceleration(u: Vector3<f64>, a_max: f64) -> Vector3<f64> {
    let n = u.norm();
    if n > a_max && n > 1e-12 {
        u * (a_max / n)
    } else {
        u
    }
}

/// Clamp a velocity to the configured speed bound.
pub fn clamp_velocity<F: Frame>(v: Vec3<F>, v_max: f64) -> Vec3<F> {
    let n = v.norm();
    if n > v_max && n > 1e-12 {
        v.scale(v_max / n)
    } else {
        v
    }
}

/// Project a point into the axis-aligned workspace box, component-wise.
pub fn project_into_workspace<F: Frame>(p: Vec3<F>, min: [f64; 3], max: [f64; 3]) -> Vec3<F> {
    Vec3::new(p.x().clamp(min[0], max[0]), p.y().clamp(min[1], max[1]), p.z().clamp(min[2], max[2]))
}

pub fn outside_workspace<F: Frame>(p: &Vec3<F>, min: [f64; 3], max: [f64; 3]) -> bool {
    p.x() < min[0] || p.x() > max[0] || p.y() < min[1] || p.y() > max[1] || p.z() < min[2] || p.z() > max[2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_units::Enu;

    #[test]
    fn acceleration_within_bound_is_unchanged() {
        let u = Vector3::new(1.0, 0.0, 0.0);
        assert_eq!(clamp_acceleration(u, 6.0), u);
    }

    #[test]
    fn acceleration_over_bound_is_scaled_to_norm() {
        let u = Vector3::new(10.0, 0.0, 0.0);
        let clamped = clamp_acceleration(u, 6.0);
        assert!((clamped.norm() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn workspace_projection_clamps_each_axis() {
        let p = Vec3::<Enu>::new(100.0, -100.0, 10.0);
        let projected = project_into_workspace(p, [-50.0, -50.0, 0.0], [50.0, 50.0, 50.0]);
        assert_eq!(projected.x(), 50.0);
        assert_eq!(projected.y(), -50.0);
        assert_eq!(projected.z(), 10.0);
    }

    #[test]
    fn outside_workspace_detects_violation() {
        let p = Vec3::<Enu>::new(0.0, 0.0, -1.0);
        assert!(outside_workspace(&p, [-50.0, -50.0, 0.0], [50.0, 50.0, 50.0]));
    }
}
