//! The six-category error taxonomy shared across the autonomy core.
//!
//! Component-local errors (e.g. a planner solver's internal iterate
//! rejection) convert into a `DartError` at the boundary a caller actually
//! observes it, the same way `evo_shared_memory`'s segment errors convert
//! into `evo_control_unit::CycleError` rather than leaking their own type
//! across the crate boundary.

use thiserror::Error;

/// Fatal-at-startup configuration problems (category 1).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("configuration validation failed: {0}")]
    ValidationError(String),

    #[error("unknown field in configuration: {0}")]
    UnknownField(String),
}

/// All other error categories from the taxonomy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DartError {
    /// (1) Invalid at startup; fatal.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// (2) Planner cannot produce a trajectory; recoverable by returning
    /// the last good trajectory and flagging degraded state.
    #[error("infeasible plan: {reason}")]
    InfeasiblePlan { reason: String },

    /// (3) Deadline miss or jitter over bound; recoverable with
    /// escalation, persistent misses become fatal via safety.
    #[error("timing violation on task {task_id}: {detail}")]
    Timing { task_id: String, detail: String },

    /// (4) Hardware/IO disconnected or stale; triggers failsafe
    /// transition.
    #[error("link error: {0}")]
    Link(String),

    /// (5) NaN/Inf detected at a boundary; always fatal for the producing
    /// task, a safe command is emitted and safety notified.
    #[error("non-finite value at {where_}: {value}")]
    Numeric { where_: String, value: f64 },

    /// (6) Unit/frame mismatch at a boundary; fatal for the call,
    /// surfaced as a bug.
    #[error("unit/frame error: {0}")]
    UnitsOrFrame(#[from] dart_units::UnitsError),
}

impl DartError {
    /// Whether this error, left unhandled, should escalate to the safety
    /// component rather than be handled locally by the producing task.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DartError::Configuration(_) | DartError::Numeric { .. } | DartError::UnitsOrFrame(_)
        )
    }
}
