use thiserror::Error;

/// Errors raised at a units/frame boundary. Always fatal for the call that
/// raised them — callers reject the value rather than coercing it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitsError {
    #[error("unit mismatch: expected {expected:?}, found {found:?}")]
    UnitMismatch { expected: crate::units::Unit, found: crate::units::Unit },

    #[error("non-finite value at {where_}: {value}")]
    NonFinite { where_: &'static str, value: f64 },

    #[error("quaternion norm {norm} outside tolerance band [{lo}, {hi}]")]
    QuaternionNotNormalized { norm: f64, lo: f64, hi: f64 },
}
