//! System-wide constants for the DART-Planner workspace.
//!
//! Single source of truth for numeric defaults used across crates —
//! imported rather than duplicated.

/// Default planner horizon length (number of steps beyond the current
/// state; trajectory length is `N + 1`).
pub const PLANNER_HORIZON_DEFAULT: usize = 6;

/// Default planner knot spacing, seconds.
pub const PLANNER_DT_DEFAULT: f64 = 0.12;

/// Default planner solver iteration cap.
pub const PLANNER_MAX_ITERATIONS_DEFAULT: u32 = 20;

/// Default KKT / cost-delta convergence tolerance.
pub const PLANNER_CONVERGENCE_TOLERANCE_DEFAULT: f64 = 1e-2;

/// Default state buffer capacity, samples.
pub const STATE_BUFFER_CAPACITY_DEFAULT: usize = 1000;

/// Default maximum extrapolation window at the edge of the state buffer,
/// seconds.
pub const MAX_EXTRAPOLATE_DEFAULT_S: f64 = 0.010;

/// Default transport delay compensated for by `compensated_state()`,
/// seconds.
pub const TRANSPORT_DELAY_DEFAULT_S: f64 = 0.025;

/// Default control loop frequency, Hz.
pub const CONTROL_HZ_DEFAULT: f64 = 1000.0;

/// Default planner loop frequency, Hz.
pub const PLANNER_HZ_DEFAULT: f64 = 50.0;

/// Default safety loop frequency, Hz.
pub const SAFETY_HZ_DEFAULT: f64 = 100.0;

/// Default telemetry loop frequency, Hz.
pub const TELEMETRY_HZ_DEFAULT: f64 = 10.0;

/// Default deadline-miss ratio (misses per window) that escalates to the
/// safety component.
pub const DEADLINE_VIOLATION_THRESHOLD_DEFAULT: (u32, u32) = (5, 1000);

/// Default fraction of measured clock drift corrected per period.
pub const DRIFT_COMPENSATION_FACTOR_DEFAULT: f64 = 0.1;

/// Default plan-staleness timeout before `FLYING -> SAFE_HOVER`, seconds.
pub const PLAN_TIMEOUT_DEFAULT_S: f64 = 0.200;

/// Default state-staleness timeout before `* -> EMERGENCY_STOP`, seconds.
pub const STATE_TIMEOUT_DEFAULT_S: f64 = 0.050;

/// Default per-task execution-time sample ring buffer length.
pub const TASK_STATS_WINDOW_DEFAULT: usize = 1000;

/// Default maximum wait for a stopped task's thread to join before it is
/// abandoned with a logged warning, seconds.
pub const TASK_JOIN_TIMEOUT_DEFAULT_S: f64 = 1.0;

/// Compile-time upper bound on trajectory horizon length (`N + 1` knots),
/// sized generously above `PLANNER_HORIZON_DEFAULT` so heapless buffers
/// never reallocate.
pub const MAX_HORIZON_KNOTS: usize = 64;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/dart-planner/config.toml";
