//! Quaternion algebra: multiplication, conjugate, normalize, rotation-matrix
//! conversion, SLERP, and the exponential/log maps used to integrate body
//! rates. Built on `nalgebra::UnitQuaternion` rather than hand-rolled, but
//! every operation the kernel spec calls for gets an explicit named
//! function so call sites read the same regardless of the backing crate.

use nalgebra::{Rotation3, UnitQuaternion, Vector3};

/// Multiply two attitude quaternions: `a` then `b` applied in sequence
/// (`a.mul(b)` rotates by `a`, then by `b`, matching `nalgebra`'s
/// right-to-left composition `b * a`).
pub fn mul(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    b * a
}

pub fn conjugate(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    q.conjugate()
}

/// Re-normalize a quaternion that has drifted from unit norm under repeated
/// composition. `nalgebra::UnitQuaternion` enforces unit norm at
/// construction, so this renormalizes the underlying coefficients and
/// rewraps.
pub fn normalize(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(q.into_inner().normalize())
}

pub fn to_rotation_matrix(q: &UnitQuaternion<f64>) -> Rotation3<f64> {
    q.to_rotation_matrix()
}

pub fn from_rotation_matrix(r: &Rotation3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_rotation_matrix(r)
}

/// Shortest-arc spherical linear interpolation. Guards the numerical edge
/// at `cos θ ≈ ±1` (near-identical or near-antipodal quaternions) by
/// falling back to normalized linear interpolation, which is stable there
/// and converges to the same limit.
pub fn slerp(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>, t: f64) -> UnitQuaternion<f64> {
    let t = t.clamp(0.0, 1.0);

    // Shortest-arc: flip b if the dot product is negative.
    let mut bq = *b;
    let mut dot = a.coords.dot(&b.coords);
    if dot < 0.0 {
        bq = UnitQuaternion::from_quaternion(-b.into_inner());
        dot = -dot;
    }

    const EDGE_EPS: f64 = 1e-6;
    if dot > 1.0 - EDGE_EPS {
        // Near-identical (or antipodal after the flip above): linear blend
        // and renormalize rather than dividing by a near-zero sine.
        let blended = a.into_inner().lerp(&bq.into_inner(), t);
        return UnitQuaternion::from_quaternion(blended);
    }

    a.slerp(&bq, t)
}

/// Exponential map: integrate a constant body-rate `omega` (rad/s) over
/// `dt` seconds into an incremental rotation.
pub fn exp_map(omega: &Vector3<f64>, dt: f64) -> UnitQuaternion<f64> {
    let angle = omega.norm() * dt;
    if angle < 1e-12 {
        return UnitQuaternion::identity();
    }
    let axis = nalgebra::Unit::new_normalize(*omega);
    UnitQuaternion::from_axis_angle(&axis, angle)
}

/// Log map: the rotation vector (axis * angle, rad) that, integrated over
/// one second, produces `q` from identity. Used to derive body rates by
/// finite difference of attitude knots: `omega ≈ log_map(q0.conjugate() *
/// q1) / dt`.
pub fn log_map(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    q.scaled_axis()
}

/// Body rate between two attitude samples spaced `dt` seconds apart,
/// expressed in the body frame of `q0`.
pub fn finite_difference_body_rate(
    q0: &UnitQuaternion<f64>,
    q1: &UnitQuaternion<f64>,
    dt: f64,
) -> Vector3<f64> {
    if dt.abs() < 1e-12 {
        return Vector3::zeros();
    }
    let delta = q0.conjugate() * q1;
    log_map(&delta) / dt
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn slerp_at_zero_returns_start() {
        let a = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let b = UnitQuaternion::from_euler_angles(0.4, -0.2, 1.0);
        let r = slerp(&a, &b, 0.0);
        assert_relative_eq!(r.coords, a.coords, epsilon = 1e-9);
    }

    #[test]
    fn slerp_at_one_returns_end() {
        let a = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let b = UnitQuaternion::from_euler_angles(0.4, -0.2, 1.0);
        let r = slerp(&a, &b, 1.0);
        assert_relative_eq!(r.coords.x, b.coords.x, epsilon = 1e-9);
    }

    #[test]
    fn slerp_near_identical_stays_normalized() {
        let a = UnitQuaternion::identity();
        let b = UnitQuaternion::from_euler_angles(0.0, 0.0, 1e-8);
        let r = slerp(&a, &b, 0.5);
        assert_relative_eq!(r.norm(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn rotation_matrix_roundtrip_is_identity_up_to_sign() {
        let q = UnitQuaternion::from_euler_angles(0.3, -0.7, 1.1);
        let r = to_rotation_matrix(&q);
        let q2 = from_rotation_matrix(&r);
        let same = (q.coords - q2.coords).norm() < 1e-9
            || (q.coords + q2.coords).norm() < 1e-9;
        assert!(same);
    }

    #[test]
    fn exp_log_roundtrip() {
        let omega = Vector3::new(0.1, -0.2, 0.05);
        let dt = 0.01;
        let q = exp_map(&omega, dt);
        let recovered = log_map(&q) / dt;
        assert_relative_eq!(recovered, omega, epsilon = 1e-6);
    }

    #[test]
    fn zero_rate_produces_identity() {
        let q = exp_map(&Vector3::zeros(), 0.01);
        assert_relative_eq!(q.coords, UnitQuaternion::identity().coords, epsilon = 1e-12);
    }
}
