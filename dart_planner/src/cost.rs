//! Cost terms for the receding-horizon solve: position tracking
//! (terminal-weighted), velocity damping, control effort, Δacceleration
//! smoothing, and summed obstacle penalties.

use dart_common::config::PlannerWeights;
use dart_common::obstacle::Obstacle;
use dart_units::{Frame, Vec3};
use nalgebra::Vector3;

use crate::constraints;

pub struct Rollout<F: Frame> {
    pub positions: Vec<Vec3<F>>,
    pub velocities: Vec<Vec3<F>>,
}

/// Integrate the simple double-integrator dynamics `x[k+1] = f(x[k], u[k])`
/// forward from `x0` given a sequence of per-step accelerations. Velocity
/// is clamped to `v_max` after each step, so the rolled-out trajectory the
/// cost and gradient are computed against already respects the speed
/// bound rather than relying on the caller to reject it afterward.
pub fn rollout<F: Frame>(
    p0: Vec3<F>,
    v0: Vec3<F>,
    controls: &[Vector3<f64>],
    dt: f64,
    v_max: f64,
) -> Rollout<F> {
    let mut positions = Vec::with_capacity(controls.len() + 1);
    let mut velocities = Vec::with_capacity(controls.len() + 1);
    positions.push(p0);
    velocities.push(v0);

    let mut p = p0;
    let mut v = v0;
    for u in controls {
        let p_next = p + v.scale(dt) + Vec3::from_nalgebra(u * (0.5 * dt * dt));
        let v_next = constraints::clamp_velocity(v + Vec3::from_nalgebra(u * dt), v_max);
        positions.push(p_next);
        velocities.push(v_next);
        p = p_next;
        v = v_next;
    }
    Rollout { positions, velocities }
}

/// Soft obstacle-clearance penalty: zero when clear by at least
/// `safety_margin`, quadratic in the violation otherwise.
pub fn obstacle_penalty<F: Frame>(point: &Vec3<F>, obstacles: &[Obstacle<F>], safety_margin: f64) -> f64 {
    obstacles
        .iter()
        .map(|o| {
            let clearance = o.clearance(point) - safety_margin;
            if clearance < 0.0 {
                clearance * clearance
            } else {
                0.0
            }
        })
        .sum()
}

/// Total cost of a control sequence: terminal-weighted position tracking,
/// velocity damping, control effort, smoothing, and obstacle penalties.
pub fn total_cost<F: Frame>(
    rollout: &Rollout<F>,
    controls: &[Vector3<f64>],
    goal: Vec3<F>,
    obstacles: &[Obstacle<F>],
    weights: &PlannerWeights,
    safety_margin: f64,
) -> f64 {
    let n = rollout.positions.len();
    let mut cost = 0.0;

    for (k, p) in rollout.positions.iter().enumerate() {
        let terminal = k == n - 1;
        let w_pos = if terminal { weights.q_pos * 5.0 } else { weights.q_pos };
        cost += w_pos * (*p - goal).norm().powi(2);
        cost += weights.w_obstacle * obstacle_penalty(p, obstacles, safety_margin);
    }
    for v in &rollout.velocities {
        cost += weights.q_vel * v.norm().powi(2);
    }
    for u in controls {
        cost += weights.r_u * u.norm_squared();
    }
    for w in controls.windows(2) {
        cost += weights.r_smooth * (w[1] - w[0]).norm_squared();
    }

    cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_units::Enu;

    #[test]
    fn rollout_length_matches_controls_plus_one() {
        let controls = vec![Vector3::zeros(); 5];
        let r = rollout::<Enu>(Vec3::zero(), Vec3::zero(), &controls, 0.1, 10.0);
        assert_eq!(r.positions.len(), 6);
        assert_eq!(r.velocities.len(), 6);
    }

    #[test]
    fn zero_control_holds_position_when_starting_at_rest() {
        let controls = vec![Vector3::zeros(); 3];
        let r = rollout::<Enu>(Vec3::new(1.0, 2.0, 3.0), Vec3::zero(), &controls, 0.1, 10.0);
        for p in &r.positions {
            assert!((p.x() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn rollout_never_exceeds_v_max() {
        let controls = vec![Vector3::new(100.0, 0.0, 0.0); 20];
        let r = rollout::<Enu>(Vec3::zero(), Vec3::zero(), &controls, 0.1, 4.0);
        for v in &r.velocities {
            assert!(v.norm() <= 4.0 + 1e-9);
        }
    }

    #[test]
    fn obstacle_penalty_is_zero_when_clear() {
        let o = Obstacle::<Enu>::new(Vec3::new(10.0, 0.0, 0.0), 1.0);
        let penalty = obstacle_penalty(&Vec3::<Enu>::zero(), &[o], 0.3);
        assert_eq!(penalty, 0.0);
    }

    #[test]
    fn obstacle_penalty_is_positive_when_violated() {
        let o = Obstacle::<Enu>::new(Vec3::new(0.0, 0.0, 0.0), 1.0);
        let penalty = obstacle_penalty(&Vec3::<Enu>::new(1.1, 0.0, 0.0), &[o], 0.3);
        assert!(penalty > 0.0);
    }
}
