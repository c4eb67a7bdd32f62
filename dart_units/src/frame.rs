//! World-frame type tags and a frame-parameterized 3-vector wrapper.
//!
//! ENU and NED differ only in which axis points "up" and the sign of
//! gravity along it; encoding the frame as a type parameter means a value
//! built in one frame cannot silently be fed to an operation expecting the
//! other — the compiler rejects it, there is no runtime tag to forget to
//! check.

use std::marker::PhantomData;
use std::ops::{Add, Sub};

use nalgebra::Vector3;

/// A world-frame convention. Implementors are zero-sized marker types.
pub trait Frame: Copy + Clone + std::fmt::Debug + PartialEq + Eq + Send + Sync + 'static {
    /// Name used in diagnostics and config deserialization.
    const NAME: &'static str;

    /// Gravity vector expressed in this frame, meters/second².
    fn gravity() -> Vector3<f64>;
}

/// East-North-Up. Default world frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Enu;

impl Frame for Enu {
    const NAME: &'static str = "ENU";

    fn gravity() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, -9.80665)
    }
}

/// North-East-Down.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ned;

impl Frame for Ned {
    const NAME: &'static str = "NED";

    fn gravity() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, 9.80665)
    }
}

/// A 3-vector tagged with the world frame it was measured/expressed in.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vec3<F: Frame> {
    inner: Vector3<f64>,
    _frame: PhantomData<F>,
}

impl<F: Frame> Vec3<F> {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { inner: Vector3::new(x, y, z), _frame: PhantomData }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn from_nalgebra(v: Vector3<f64>) -> Self {
        Self { inner: v, _frame: PhantomData }
    }

    pub fn as_nalgebra(&self) -> &Vector3<f64> {
        &self.inner
    }

    pub fn x(&self) -> f64 {
        self.inner.x
    }

    pub fn y(&self) -> f64 {
        self.inner.y
    }

    pub fn z(&self) -> f64 {
        self.inner.z
    }

    pub fn norm(&self) -> f64 {
        self.inner.norm()
    }

    pub fn is_finite(&self) -> bool {
        self.inner.iter().all(|v| v.is_finite())
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.inner.dot(&other.inner)
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self::from_nalgebra(self.inner.cross(&other.inner))
    }

    pub fn scale(&self, s: f64) -> Self {
        Self::from_nalgebra(self.inner * s)
    }

    /// Gravity expressed in this frame, cached as a per-frame constant.
    pub fn gravity() -> Self {
        Self::from_nalgebra(F::gravity())
    }
}

impl<F: Frame> Add for Vec3<F> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_nalgebra(self.inner + rhs.inner)
    }
}

impl<F: Frame> Sub for Vec3<F> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_nalgebra(self.inner - rhs.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_points_down_in_enu() {
        let g = Vec3::<Enu>::gravity();
        assert!(g.z() < 0.0);
    }

    #[test]
    fn gravity_points_down_in_ned_positive_z() {
        let g = Vec3::<Ned>::gravity();
        assert!(g.z() > 0.0);
    }

    #[test]
    fn add_sub_roundtrip() {
        let a = Vec3::<Enu>::new(1.0, 2.0, 3.0);
        let b = Vec3::<Enu>::new(0.5, -1.0, 2.0);
        let c = (a + b) - b;
        assert!((c.x() - a.x()).abs() < 1e-12);
        assert!((c.y() - a.y()).abs() < 1e-12);
        assert!((c.z() - a.z()).abs() < 1e-12);
    }
}
