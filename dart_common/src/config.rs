//! The frozen root configuration. Loaded once at startup from TOML,
//! validated eagerly, and never mutated afterward — the same
//! load-then-validate-then-freeze discipline as the teacher's
//! `SharedConfig`/`load_config_dir`, generalized to DART-Planner's
//! sections.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorldFrame {
    Enu,
    Ned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorGeometry {
    X,
    Plus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerWeights {
    pub q_pos: f64,
    pub q_vel: f64,
    pub r_u: f64,
    pub r_smooth: f64,
    pub w_obstacle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerConfig {
    pub prediction_horizon: usize,
    pub dt: f64,
    pub max_iterations: u32,
    pub convergence_tolerance: f64,
    pub weights: PlannerWeights,
    pub safety_margin: f64,
    pub workspace_min: [f64; 3],
    pub workspace_max: [f64; 3],
    pub v_max: f64,
    pub a_max: f64,
    pub thrust_max: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            prediction_horizon: crate::consts::PLANNER_HORIZON_DEFAULT,
            dt: crate::consts::PLANNER_DT_DEFAULT,
            max_iterations: crate::consts::PLANNER_MAX_ITERATIONS_DEFAULT,
            convergence_tolerance: crate::consts::PLANNER_CONVERGENCE_TOLERANCE_DEFAULT,
            weights: PlannerWeights { q_pos: 10.0, q_vel: 1.0, r_u: 0.1, r_smooth: 0.05, w_obstacle: 500.0 },
            safety_margin: 0.3,
            workspace_min: [-50.0, -50.0, 0.0],
            workspace_max: [50.0, 50.0, 50.0],
            v_max: 4.0,
            a_max: 6.0,
            thrust_max: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    pub tuning_profile: String,
    pub i_max: f64,
    pub omega_max: f64,
    pub hover_thrust: f64,
    pub feedforward_scale: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tuning_profile: "sitl_optimized".to_string(),
            i_max: 2.0,
            omega_max: 6.0,
            hover_thrust: 0.5,
            feedforward_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealTimeConfig {
    pub control_hz: f64,
    pub planner_hz: f64,
    pub safety_hz: f64,
    pub telemetry_hz: f64,
    pub control_loop_period_ms: f64,
    pub deadline_margin_ms: f64,
    pub jitter_bound_ms: f64,
    pub deadline_violation_misses: u32,
    pub deadline_violation_window: u32,
    pub drift_compensation_factor: f64,
}

impl Default for RealTimeConfig {
    fn default() -> Self {
        let (misses, window) = crate::consts::DEADLINE_VIOLATION_THRESHOLD_DEFAULT;
        Self {
            control_hz: crate::consts::CONTROL_HZ_DEFAULT,
            planner_hz: crate::consts::PLANNER_HZ_DEFAULT,
            safety_hz: crate::consts::SAFETY_HZ_DEFAULT,
            telemetry_hz: crate::consts::TELEMETRY_HZ_DEFAULT,
            control_loop_period_ms: 1000.0 / crate::consts::CONTROL_HZ_DEFAULT,
            deadline_margin_ms: 0.1,
            jitter_bound_ms: 0.2,
            deadline_violation_misses: misses,
            deadline_violation_window: window,
            drift_compensation_factor: crate::consts::DRIFT_COMPENSATION_FACTOR_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HardwareConfig {
    pub arm_length_m: f64,
    pub num_arms: u8,
    pub geometry: MotorGeometry,
    pub max_motor_thrust_n: f64,
    pub max_propeller_drag_torque_nm: f64,
    pub transport_delay_ms: f64,
    pub mass_kg: f64,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            arm_length_m: 0.225,
            num_arms: 4,
            geometry: MotorGeometry::X,
            max_motor_thrust_n: 8.0,
            max_propeller_drag_torque_nm: 0.05,
            transport_delay_ms: crate::consts::TRANSPORT_DELAY_DEFAULT_S * 1000.0,
            mass_kg: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SafetyConfig {
    pub plan_timeout_ms: f64,
    pub state_timeout_ms: f64,
    pub geofence_min: [f64; 3],
    pub geofence_max: [f64; 3],
    pub battery_low_threshold: f64,
    pub battery_critical_threshold: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            plan_timeout_ms: crate::consts::PLAN_TIMEOUT_DEFAULT_S * 1000.0,
            state_timeout_ms: crate::consts::STATE_TIMEOUT_DEFAULT_S * 1000.0,
            geofence_min: [-50.0, -50.0, 0.0],
            geofence_max: [50.0, 50.0, 50.0],
            battery_low_threshold: 0.2,
            battery_critical_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FramesConfig {
    pub world_frame: WorldFrame,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self { world_frame: WorldFrame::Enu }
    }
}

/// A static sphere obstacle supplied at startup, before conversion to a
/// frame-tagged `dart_common::obstacle::Obstacle`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObstacleConfig {
    pub center: [f64; 3],
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
    pub service_name: String,
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

/// The frozen configuration root. Created once at startup; shared
/// read-only (behind an `Arc`, typically) by every component thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub real_time: RealTimeConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub frames: FramesConfig,
    /// Static sphere obstacles known at startup; perception-sourced
    /// obstacles are out of scope (§1 Non-goals).
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self { log_level: LogLevel::Info, service_name: "dart-planner".to_string() }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            planner: PlannerConfig::default(),
            controller: ControllerConfig::default(),
            real_time: RealTimeConfig::default(),
            hardware: HardwareConfig::default(),
            safety: SafetyConfig::default(),
            frames: FramesConfig::default(),
            obstacles: Vec::new(),
        }
    }
}

impl Config {
    /// Load a TOML file and validate it; aborts (returns `Err`) rather
    /// than silently repairing an inconsistency, exactly the policy the
    /// CLI surfaces as exit code 2.
    pub fn load_and_validate(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shared.service_name.is_empty() {
            return Err(ConfigError::ValidationError("service_name cannot be empty".to_string()));
        }

        if self.planner.prediction_horizon == 0
            || self.planner.prediction_horizon + 1 > crate::consts::MAX_HORIZON_KNOTS
        {
            return Err(ConfigError::ValidationError(format!(
                "planner.prediction_horizon must be in 1..={}",
                crate::consts::MAX_HORIZON_KNOTS - 1
            )));
        }
        if self.planner.dt <= 0.0 {
            return Err(ConfigError::ValidationError("planner.dt must be positive".to_string()));
        }
        if self.planner.v_max <= 0.0 || self.planner.a_max <= 0.0 || self.planner.thrust_max <= 0.0 {
            return Err(ConfigError::ValidationError("planner velocity/acceleration/thrust limits must be positive".to_string()));
        }

        if self.controller.i_max < 0.0 {
            return Err(ConfigError::ValidationError("controller.i_max must be non-negative".to_string()));
        }
        if self.controller.omega_max <= 0.0 {
            return Err(ConfigError::ValidationError("controller.omega_max must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.controller.hover_thrust) {
            return Err(ConfigError::ValidationError("controller.hover_thrust must be in [0, 1]".to_string()));
        }

        // control_loop_period_ms must match 1000 / control_hz, the
        // inconsistency the boundary-behaviors section calls out by name.
        let expected_period_ms = 1000.0 / self.real_time.control_hz;
        if (self.real_time.control_loop_period_ms - expected_period_ms).abs() > 1e-6 {
            return Err(ConfigError::ValidationError(format!(
                "real_time.control_loop_period_ms ({}) inconsistent with control_hz ({}); expected {}",
                self.real_time.control_loop_period_ms, self.real_time.control_hz, expected_period_ms
            )));
        }
        if self.real_time.control_hz <= self.real_time.planner_hz {
            return Err(ConfigError::ValidationError("real_time.control_hz must exceed planner_hz".to_string()));
        }
        if self.real_time.deadline_violation_misses >= self.real_time.deadline_violation_window {
            return Err(ConfigError::ValidationError("deadline_violation_misses must be less than the window".to_string()));
        }

        if self.hardware.num_arms == 0 {
            return Err(ConfigError::ValidationError("hardware.num_arms must be nonzero".to_string()));
        }
        if self.hardware.mass_kg <= 0.0 {
            return Err(ConfigError::ValidationError("hardware.mass_kg must be positive".to_string()));
        }

        if self.safety.state_timeout_ms >= self.safety.plan_timeout_ms {
            return Err(ConfigError::ValidationError("safety.state_timeout_ms must be less than plan_timeout_ms".to_string()));
        }
        if !(0.0..1.0).contains(&self.safety.battery_critical_threshold)
            || self.safety.battery_critical_threshold >= self.safety.battery_low_threshold
        {
            return Err(ConfigError::ValidationError("safety battery thresholds must satisfy 0 <= critical < low < 1".to_string()));
        }

        for (i, o) in self.obstacles.iter().enumerate() {
            if o.radius <= 0.0 {
                return Err(ConfigError::ValidationError(format!("obstacles[{i}].radius must be positive")));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn mismatched_control_loop_period_is_rejected() {
        let mut c = Config::default();
        c.real_time.control_loop_period_ms = 5.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn empty_service_name_is_rejected() {
        let mut c = Config::default();
        c.shared.service_name = String::new();
        assert!(c.validate().is_err());
    }

    #[test]
    fn load_missing_file_is_file_not_found() {
        let err = Config::load_and_validate(Path::new("/nonexistent/dart.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn load_valid_toml_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dart.toml");
        let cfg = Config::default();
        let text = toml::to_string(&cfg).unwrap();
        std::fs::write(&path, text).unwrap();
        let loaded = Config::load_and_validate(&path).unwrap();
        assert_eq!(loaded, cfg);
    }
}
