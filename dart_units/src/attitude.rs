//! Thrust-vector to attitude synthesis, shared by the planner (to
//! synthesize each horizon knot's reference attitude) and the controller
//! (to synthesize `R_des` from the desired force). Kept in one place so
//! both components agree on the same convention.

use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

use crate::error::UnitsError;
use crate::quaternion::from_rotation_matrix;

/// Result of synthesizing an attitude from a desired acceleration: the
/// body attitude that realizes it, plus the scalar thrust magnitude
/// (Newtons) a collective-thrust vehicle must produce along its own
/// z-body axis to achieve that acceleration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SynthesizedAttitude {
    pub attitude: UnitQuaternion<f64>,
    pub thrust: f64,
}

/// Steps 1-5 of the attitude/body-rate synthesis: given a desired
/// acceleration, gravity, vehicle mass, and a target yaw, produce the
/// attitude and thrust magnitude a geometric controller (or the planner,
/// synthesizing a horizon knot) must command.
///
/// `accel_des` and `gravity` are in world frame, m/s². `yaw` is radians.
pub fn synthesize(
    accel_des: &Vector3<f64>,
    gravity: &Vector3<f64>,
    mass: f64,
    yaw: f64,
) -> Result<SynthesizedAttitude, UnitsError> {
    // Step 1: desired thrust vector in world frame.
    let thrust_vec = mass * (accel_des - gravity);
    let thrust = thrust_vec.norm();

    if !thrust.is_finite() {
        return Err(UnitsError::NonFinite { where_: "attitude::synthesize thrust", value: thrust });
    }
    // Degenerate: zero commanded thrust has no well-defined direction.
    // Fall back to the previous/level attitude is the caller's
    // responsibility; here we report it as non-finite so callers treat it
    // the same as any other unsynthesizable attitude.
    if thrust < 1e-9 {
        return Err(UnitsError::NonFinite { where_: "attitude::synthesize zero-thrust direction", value: thrust });
    }

    // Step 2: desired z-body axis.
    let z_body = thrust_vec / thrust;

    // Step 3: orthogonalized projection of the yaw heading onto the plane
    // perpendicular to z-body.
    let yaw_heading = Vector3::new(yaw.cos(), yaw.sin(), 0.0);
    let mut x_body = yaw_heading - z_body * z_body.dot(&yaw_heading);
    let x_norm = x_body.norm();
    if x_norm < 1e-6 {
        // Heading is parallel to z-body (near-vertical thrust with a yaw
        // axis aligned to it); pick an arbitrary perpendicular.
        let fallback = if z_body.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
        x_body = fallback - z_body * z_body.dot(&fallback);
    }
    let x_body = x_body.normalize();

    // Step 4: assemble rotation.
    let y_body = z_body.cross(&x_body);
    let rot = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x_body, y_body, z_body]));
    let attitude = from_rotation_matrix(&rot);

    Ok(SynthesizedAttitude { attitude, thrust })
}
