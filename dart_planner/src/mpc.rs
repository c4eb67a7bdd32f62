//! Receding-horizon trajectory solve.
//!
//! The decision variables are per-step accelerations `u[0..N)`; position
//! and velocity are not free variables but are produced by rolling the
//! double-integrator dynamics forward from the current state, so the
//! dynamics constraint is satisfied by construction rather than imposed
//! explicitly. Each solve warm-starts from the previous solution shifted
//! by one step, takes a bounded number of gradient steps against
//! [`crate::cost::total_cost`], and stops early once the cost stops
//! moving. The winning iterate (not necessarily the last one) is rolled
//! out once more to produce the published trajectory, with per-knot
//! attitude synthesized the same way the controller synthesizes `R_des`.

use std::time::{Duration, Instant};

use dart_common::config::{PlannerConfig, PlannerWeights};
use dart_common::error::DartError;
use dart_common::obstacle::Obstacle;
use dart_common::state::DroneState;
use dart_common::trajectory::{KnotVec, Trajectory};
use dart_units::{attitude, quaternion, Frame, Vec3};
use nalgebra::Vector3;

use crate::constraints;
use crate::cost::{self, Rollout};

const GOAL_TOLERANCE_M: f64 = 0.05;
const GOAL_VELOCITY_TOLERANCE_MPS: f64 = 0.05;
const LEARNING_RATE: f64 = 0.05;
const GRADIENT_EPSILON: f64 = 1e-4;
const WALL_CLOCK_BUDGET_MS: f64 = 8.0;

pub struct Planner<F: Frame> {
    config: PlannerConfig,
    mass: f64,
    warm_start: Vec<Vector3<f64>>,
    last_trajectory: Option<Trajectory<F>>,
}

impl<F: Frame> Planner<F> {
    pub fn new(config: PlannerConfig, mass: f64) -> Self {
        let horizon = config.prediction_horizon;
        Self { config, mass, warm_start: vec![Vector3::zeros(); horizon], last_trajectory: None }
    }

    pub fn last_trajectory(&self) -> Option<&Trajectory<F>> {
        self.last_trajectory.as_ref()
    }

    /// Solve for a new reference trajectory from `state` toward `goal`,
    /// avoiding `obstacles`. Warm-starts from the previous solve.
    pub fn plan(
        &mut self,
        state: &DroneState<F>,
        goal: Vec3<F>,
        obstacles: &[Obstacle<F>],
    ) -> Result<Trajectory<F>, DartError> {
        if !state.position.is_finite() || !state.velocity.is_finite() {
            return Err(DartError::Numeric { where_: "dart_planner::plan seed state".to_string(), value: f64::NAN });
        }

        for o in obstacles {
            if o.clearance(&goal) < 0.0 {
                return Err(DartError::InfeasiblePlan {
                    reason: format!(
                        "goal ({:.2}, {:.2}, {:.2}) lies inside obstacle at ({:.2}, {:.2}, {:.2}) r={:.2}",
                        goal.x(), goal.y(), goal.z(),
                        o.center.x(), o.center.y(), o.center.z(), o.radius
                    ),
                });
            }
        }

        let goal = if constraints::outside_workspace(&goal, self.config.workspace_min, self.config.workspace_max) {
            tracing::warn!(x = goal.x(), y = goal.y(), z = goal.z(), "goal outside workspace; projecting");
            constraints::project_into_workspace(goal, self.config.workspace_min, self.config.workspace_max)
        } else {
            goal
        };

        let n = self.config.prediction_horizon;
        let dt = self.config.dt;

        let distance = (state.position - goal).norm();
        if distance < GOAL_TOLERANCE_M && state.velocity.norm() < GOAL_VELOCITY_TOLERANCE_MPS {
            let traj = Trajectory::stationary(goal, n + 1, dt, state.attitude);
            self.warm_start = vec![Vector3::zeros(); n];
            self.last_trajectory = Some(traj.clone());
            return Ok(traj);
        }

        let mut controls = self.shifted_warm_start(n);
        let weights = self.config.weights.clone();
        let a_max = self.config.a_max;
        let v_max = self.config.v_max;
        let safety_margin = self.config.safety_margin;

        let mut best_controls = controls.clone();
        let mut best_cost = f64::INFINITY;
        let mut prev_cost = f64::INFINITY;
        let mut converged = false;
        let deadline = Instant::now() + Duration::from_micros((WALL_CLOCK_BUDGET_MS * 1000.0) as u64);

        for _ in 0..self.config.max_iterations {
            if Instant::now() >= deadline {
                break;
            }

            let rollout = cost::rollout(state.position, state.velocity, &controls, dt, v_max);
            let current_cost = cost::total_cost(&rollout, &controls, goal, obstacles, &weights, safety_margin);
            if current_cost.is_finite() && current_cost < best_cost {
                best_cost = current_cost;
                best_controls = controls.clone();
            }
            if (prev_cost - current_cost).abs() < self.config.convergence_tolerance {
                converged = true;
                break;
            }
            prev_cost = current_cost;

            let grad = numerical_gradient(state.position, state.velocity, &controls, goal, obstacles, &weights, safety_margin, v_max, dt);
            for (u, g) in controls.iter_mut().zip(grad.iter()) {
                *u -= g * LEARNING_RATE;
                *u = constraints::clamp_acceleration(*u, a_max);
            }
        }

        if !best_cost.is_finite() {
            if let Some(previous) = &self.last_trajectory {
                tracing::warn!("planner solve produced no finite iterate; reusing last trajectory");
                let mut degraded = previous.clone();
                degraded.degraded = true;
                return Ok(degraded);
            }
            return Err(DartError::InfeasiblePlan { reason: "solver produced no finite cost iterate".to_string() });
        }

        let final_rollout = cost::rollout(state.position, state.velocity, &best_controls, dt, v_max);
        let mut synthesis_degraded = false;
        let traj = build_trajectory(
            &final_rollout,
            &best_controls,
            self.mass,
            yaw_of(&state.attitude),
            dt,
            self.config.thrust_max,
            &mut synthesis_degraded,
        );

        let degraded = !converged || synthesis_degraded;
        let mut traj = traj;
        traj.degraded = degraded;

        self.warm_start = best_controls;
        self.last_trajectory = Some(traj.clone());
        Ok(traj)
    }

    fn shifted_warm_start(&self, n: usize) -> Vec<Vector3<f64>> {
        if self.warm_start.len() != n {
            return vec![Vector3::zeros(); n];
        }
        let mut shifted = self.warm_start.clone();
        if !shifted.is_empty() {
            shifted.remove(0);
            shifted.push(Vector3::zeros());
        }
        shifted
    }
}

fn cost_of<F: Frame>(
    p0: Vec3<F>,
    v0: Vec3<F>,
    controls: &[Vector3<f64>],
    goal: Vec3<F>,
    obstacles: &[Obstacle<F>],
    weights: &PlannerWeights,
    safety_margin: f64,
    v_max: f64,
    dt: f64,
) -> f64 {
    let rollout = cost::rollout(p0, v0, controls, dt, v_max);
    cost::total_cost(&rollout, controls, goal, obstacles, weights, safety_margin)
}

#[allow(clippy::too_many_arguments)]
fn numerical_gradient<F: Frame>(
    p0: Vec3<F>,
    v0: Vec3<F>,
    controls: &[Vector3<f64>],
    goal: Vec3<F>,
    obstacles: &[Obstacle<F>],
    weights: &PlannerWeights,
    safety_margin: f64,
    v_max: f64,
    dt: f64,
) -> Vec<Vector3<f64>> {
    let mut grad = vec![Vector3::zeros(); controls.len()];
    for k in 0..controls.len() {
        for axis in 0..3 {
            let mut plus = controls.to_vec();
            let mut minus = controls.to_vec();
            plus[k][axis] += GRADIENT_EPSILON;
            minus[k][axis] -= GRADIENT_EPSILON;
            let cp = cost_of(p0, v0, &plus, goal, obstacles, weights, safety_margin, v_max, dt);
            let cm = cost_of(p0, v0, &minus, goal, obstacles, weights, safety_margin, v_max, dt);
            grad[k][axis] = (cp - cm) / (2.0 * GRADIENT_EPSILON);
        }
    }
    grad
}

/// Turn a winning control sequence into a published trajectory: attitude
/// and thrust are synthesized per knot from the commanded acceleration,
/// body rates by finite-differencing consecutive attitudes. Synthesized
/// thrust is clamped to `[0, thrust_max]`; a knot that needed clamping
/// marks the trajectory degraded, since the commanded acceleration was
/// not actually achievable by the vehicle.
fn build_trajectory<F: Frame>(
    rollout: &Rollout<F>,
    controls: &[Vector3<f64>],
    mass: f64,
    yaw: f64,
    dt: f64,
    thrust_max: f64,
    synthesis_degraded: &mut bool,
) -> Trajectory<F> {
    let gravity = F::gravity();
    let n_plus_one = rollout.positions.len();

    let mut accelerations = Vec::with_capacity(n_plus_one);
    for k in 0..n_plus_one {
        let u = controls.get(k).copied().unwrap_or_else(|| *controls.last().unwrap_or(&Vector3::zeros()));
        accelerations.push(u);
    }

    let mut attitudes = Vec::with_capacity(n_plus_one);
    let mut thrusts = Vec::with_capacity(n_plus_one);
    for accel in &accelerations {
        match attitude::synthesize(accel, &gravity, mass, yaw) {
            Ok(synth) => {
                attitudes.push(synth.attitude);
                let clamped = synth.thrust.clamp(0.0, thrust_max);
                if (clamped - synth.thrust).abs() > 1e-9 {
                    *synthesis_degraded = true;
                }
                thrusts.push(clamped);
            }
            Err(_) => {
                *synthesis_degraded = true;
                attitudes.push(nalgebra::UnitQuaternion::identity());
                thrusts.push(mass * gravity.norm());
            }
        }
    }

    let mut traj = Trajectory::<F> {
        timestamps: KnotVec::new(),
        positions: KnotVec::new(),
        velocities: KnotVec::new(),
        accelerations: KnotVec::new(),
        attitudes: KnotVec::new(),
        body_rates: KnotVec::new(),
        thrusts: KnotVec::new(),
        degraded: false,
    };

    for k in 0..n_plus_one {
        let _ = traj.timestamps.push(k as f64 * dt);
        let _ = traj.positions.push(rollout.positions[k]);
        let _ = traj.velocities.push(rollout.velocities[k]);
        let _ = traj.accelerations.push(Vec3::from_nalgebra(accelerations[k]));
        let _ = traj.attitudes.push(attitudes[k]);
        let _ = traj.thrusts.push(thrusts[k]);
    }
    for k in 0..n_plus_one {
        let rate = if k + 1 < n_plus_one {
            quaternion::finite_difference_body_rate(&attitudes[k], &attitudes[k + 1], dt)
        } else if k > 0 {
            traj.body_rates[k - 1]
        } else {
            Vector3::zeros()
        };
        let _ = traj.body_rates.push(rate);
    }

    traj
}

fn yaw_of(q: &nalgebra::UnitQuaternion<f64>) -> f64 {
    let (_, _, yaw) = q.euler_angles();
    yaw
}
