//! SE(3) geometric position/attitude controller.
//!
//! `compute()` implements the algorithm steps from the controller
//! contract: sample the reference, run the outer position loop, project
//! thrust and synthesize the desired attitude, run the inner attitude
//! loop, and clamp body rates.

use dart_common::command::BodyRateCommand;
use dart_common::state::DroneState;
use dart_common::trajectory::Trajectory;
use dart_units::{attitude, Frame};
use nalgebra::{Matrix3, Vector3};

use crate::gains::ControllerGains;
use crate::pid::{pid_compute, PidGains, PidState};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControllerOutput {
    pub command: BodyRateCommand,
    /// Set when the requested `t_current` fell outside the trajectory's
    /// timestamp window and the nearest knot was used instead.
    pub stale_reference: bool,
    /// Set when any input was non-finite; `command` is the safe zero
    /// command in that case and the caller must escalate to safety.
    pub non_finite_fallback: bool,
}

pub struct GeometricController<F: Frame> {
    gains: ControllerGains,
    mass: f64,
    integral_x: PidState,
    integral_y: PidState,
    integral_z: PidState,
    _frame: std::marker::PhantomData<F>,
}

impl<F: Frame> GeometricController<F> {
    pub fn new(gains: ControllerGains, mass: f64) -> Self {
        Self {
            gains,
            mass,
            integral_x: PidState::default(),
            integral_y: PidState::default(),
            integral_z: PidState::default(),
            _frame: std::marker::PhantomData,
        }
    }

    pub fn reset_integrators(&mut self) {
        self.integral_x.reset();
        self.integral_y.reset();
        self.integral_z.reset();
    }

    pub fn compute(
        &mut self,
        state: &DroneState<F>,
        trajectory: &Trajectory<F>,
        t_current: f64,
        dt: f64,
    ) -> ControllerOutput {
        let Some(sample) = trajectory.sample_at(t_current) else {
            return safe_fallback();
        };

        if !state.position.is_finite() || !state.velocity.is_finite() || !sample.position.is_finite() {
            return safe_fallback();
        }

        // Step 2: position loop.
        let e_p = state.position - sample.position;
        let e_v = state.velocity - sample.velocity;
        let gravity = *dart_units::Vec3::<F>::gravity().as_nalgebra();

        let integral_gains = PidGains {
            kp: 0.0,
            ki: self.gains.ki,
            kd: 0.0,
            tf: 0.0,
            tt: 0.1,
            out_max: self.gains.i_max,
        };
        let i_x = pid_compute(&mut self.integral_x, &integral_gains, e_p.x(), dt);
        let i_y = pid_compute(&mut self.integral_y, &integral_gains, e_p.y(), dt);
        let i_z = pid_compute(&mut self.integral_z, &integral_gains, e_p.z(), dt);
        let integral_term = Vector3::new(i_x, i_y, i_z);

        let accel_ref = *sample.acceleration.as_nalgebra();
        let e_p_vec = *e_p.as_nalgebra();
        let e_v_vec = *e_v.as_nalgebra();
        let f_des = -self.gains.kp * e_p_vec
            - self.gains.kv * e_v_vec
            + self.mass * (accel_ref - gravity) * self.gains.feedforward_scale
            - integral_term;

        if !f_des.iter().all(|v| v.is_finite()) {
            return safe_fallback();
        }

        // Steps 3-4: desired rotation, synthesized from the desired force
        // direction; thrust is projected separately, onto the *current*
        // body z-axis rather than the desired one, so a large attitude
        // error does not silently substitute the desired-attitude thrust
        // for the thrust the vehicle's actual orientation would produce.
        let accel_des_equiv = f_des / self.mass + gravity;
        let yaw_ref = yaw_of(&sample.attitude);
        let Ok(synth) = attitude::synthesize(&accel_des_equiv, &gravity, self.mass, yaw_ref) else {
            return safe_fallback();
        };

        let r = state.attitude.to_rotation_matrix().into_inner();
        let thrust = f_des.dot(&(r * Vector3::z())).max(0.0);

        let g_norm = gravity.norm().max(1e-9);
        let thrust_normalized = (thrust * self.gains.hover_thrust / (self.mass * g_norm)).clamp(0.0, 1.0);

        // Step 5: attitude loop.
        let r_des = synth.attitude.to_rotation_matrix().into_inner();
        let e_r_matrix: Matrix3<f64> = 0.5 * (r_des.transpose() * r - r.transpose() * r_des);
        let e_r = Vector3::new(e_r_matrix[(2, 1)], e_r_matrix[(0, 2)], e_r_matrix[(1, 0)]);

        let omega_ref = sample.body_rate;
        let e_omega = state.angular_velocity - r.transpose() * r_des * omega_ref;
        let omega_des = omega_ref - self.gains.k_r * e_r - self.gains.k_omega * e_omega;

        if !omega_des.iter().all(|v| v.is_finite()) || !thrust_normalized.is_finite() {
            return safe_fallback();
        }

        // Step 6: clamp.
        let omega_max = self.gains.omega_max;
        let body_rates = Vector3::new(
            omega_des.x.clamp(-omega_max, omega_max),
            omega_des.y.clamp(-omega_max, omega_max),
            omega_des.z.clamp(-omega_max, omega_max),
        );

        ControllerOutput {
            command: BodyRateCommand { thrust: thrust_normalized, body_rates },
            stale_reference: sample.stale,
            non_finite_fallback: false,
        }
    }
}

fn safe_fallback() -> ControllerOutput {
    ControllerOutput {
        command: BodyRateCommand::safe_zero(),
        stale_reference: true,
        non_finite_fallback: true,
    }
}

fn yaw_of(q: &nalgebra::UnitQuaternion<f64>) -> f64 {
    let (_, _, yaw) = q.euler_angles();
    yaw
}
