//! Unit-tagged scalars. Component boundaries accept a [`Quantity`] rather
//! than a bare `f64`; conversion between units is explicit via
//! [`Quantity::convert`], and constructing a quantity at a boundary that
//! expects a different unit than the one supplied is a
//! [`UnitsError::UnitMismatch`], not a silent coercion.

use crate::error::UnitsError;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Meters,
    MetersPerSecond,
    MetersPerSecondSquared,
    Radians,
    RadiansPerSecond,
    Newtons,
    /// Dimensionless value in `[0, 1]`, e.g. normalized collective thrust.
    Normalized,
}

/// A scalar value carrying an explicit [`Unit`] tag.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    /// Return the raw value if it carries `expected`; otherwise a
    /// structured error the caller rejects before the value reaches a
    /// physics computation.
    pub fn require(&self, expected: Unit) -> Result<f64, UnitsError> {
        if self.unit == expected {
            Ok(self.value)
        } else {
            Err(UnitsError::UnitMismatch { expected, found: self.unit })
        }
    }

    pub fn checked_finite(&self, where_: &'static str) -> Result<f64, UnitsError> {
        if self.value.is_finite() {
            Ok(self.value)
        } else {
            Err(UnitsError::NonFinite { where_, value: self.value })
        }
    }
}
