//! Named tuning profiles. A profile is a plain constructor for
//! [`ControllerGains`], the same shape as the teacher's gain structs built
//! from a config section — here, selected by name or supplied as explicit
//! gains.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerGains {
    pub kp: f64,
    pub kv: f64,
    pub ki: f64,
    pub k_r: f64,
    pub k_omega: f64,
    /// Anti-windup integral clamp, same units as the position-loop error
    /// integral.
    pub i_max: f64,
    /// Componentwise clamp on the commanded body rate, rad/s.
    pub omega_max: f64,
    /// Thrust normalization calibration: the normalized thrust that
    /// produces hover.
    pub hover_thrust: f64,
    pub feedforward_scale: f64,
}

impl ControllerGains {
    pub fn conservative() -> Self {
        Self {
            kp: 4.0,
            kv: 3.0,
            ki: 0.2,
            k_r: 6.0,
            k_omega: 1.0,
            i_max: 1.0,
            omega_max: 3.0,
            hover_thrust: 0.5,
            feedforward_scale: 0.8,
        }
    }

    pub fn sitl_optimized() -> Self {
        Self {
            kp: 8.0,
            kv: 5.0,
            ki: 0.5,
            k_r: 10.0,
            k_omega: 2.0,
            i_max: 2.0,
            omega_max: 6.0,
            hover_thrust: 0.5,
            feedforward_scale: 1.0,
        }
    }

    pub fn tracking_optimized() -> Self {
        Self {
            kp: 12.0,
            kv: 7.0,
            ki: 0.8,
            k_r: 14.0,
            k_omega: 3.0,
            i_max: 2.5,
            omega_max: 8.0,
            hover_thrust: 0.5,
            feedforward_scale: 1.1,
        }
    }

    pub fn precision() -> Self {
        Self {
            kp: 16.0,
            kv: 9.0,
            ki: 1.2,
            k_r: 18.0,
            k_omega: 4.0,
            i_max: 3.0,
            omega_max: 5.0,
            hover_thrust: 0.5,
            feedforward_scale: 1.0,
        }
    }

    /// Resolve a named profile; `None` for an unrecognized name, leaving
    /// the caller free to fall back to an explicit-gains config section.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "conservative" => Some(Self::conservative()),
            "sitl_optimized" => Some(Self::sitl_optimized()),
            "tracking_optimized" => Some(Self::tracking_optimized()),
            "precision" => Some(Self::precision()),
            _ => None,
        }
    }
}
