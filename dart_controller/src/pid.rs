//! Scalar PID with backward-Euler integration, a filtered derivative, and
//! anti-windup via back-calculation. Ported from the axis control loop
//! this workspace's position-loop integral term (`Ki * ∫e_p dt`) is
//! generalized from, applied componentwise to the position error vector.
//!
//! Zero `ki` disables the integral; zero `kd` disables the derivative.

#[derive(Debug, Clone, Copy)]
pub struct PidState {
    integral: f64,
    prev_error: f64,
    derivative_filtered: f64,
    prev_raw_output: f64,
}

impl Default for PidState {
    fn default() -> Self {
        Self { integral: 0.0, prev_error: 0.0, derivative_filtered: 0.0, prev_raw_output: 0.0 }
    }
}

impl PidState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PidGains {
    pub kp: f64,
    /// Integral gain (0 = disabled).
    pub ki: f64,
    /// Derivative gain (0 = disabled).
    pub kd: f64,
    /// Derivative filter time constant, seconds (0 = unfiltered).
    pub tf: f64,
    /// Anti-windup tracking time constant, seconds (0 = disabled).
    pub tt: f64,
    /// Output saturation used by the anti-windup back-calculation.
    pub out_max: f64,
}

/// One PID cycle, backward-Euler integration. Returns the unsaturated
/// output — clamping happens in the caller's output stage.
#[inline]
pub fn pid_compute(state: &mut PidState, gains: &PidGains, error: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }

    let p_term = gains.kp * error;

    let i_term = if gains.ki != 0.0 {
        let anti_windup = if gains.tt > 0.0 && gains.out_max > 0.0 {
            let saturated = state.prev_raw_output.clamp(-gains.out_max, gains.out_max);
            (saturated - state.prev_raw_output) / gains.tt
        } else {
            0.0
        };
        state.integral += (gains.ki * error + anti_windup) * dt;
        state.integral
    } else {
        state.integral = 0.0;
        0.0
    };

    let d_term = if gains.kd != 0.0 {
        let raw_derivative = (error - state.prev_error) / dt;
        if gains.tf > 0.0 {
            let alpha = dt / (gains.tf + dt);
            state.derivative_filtered += alpha * (raw_derivative - state.derivative_filtered);
            gains.kd * state.derivative_filtered
        } else {
            gains.kd * raw_derivative
        }
    } else {
        state.derivative_filtered = 0.0;
        0.0
    };

    state.prev_error = error;
    let raw_output = p_term + i_term + d_term;
    state.prev_raw_output = raw_output;
    raw_output
}
