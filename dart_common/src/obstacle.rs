//! Sphere obstacles: created by mission/perception, owned by the planner,
//! cleared when the mission changes.

use dart_units::{Frame, Vec3};

use crate::config::ObstacleConfig;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Obstacle<F: Frame> {
    pub center: Vec3<F>,
    /// Meters.
    pub radius: f64,
}

impl<F: Frame> Obstacle<F> {
    pub fn new(center: Vec3<F>, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Distance from `point` to the obstacle surface; negative if inside.
    pub fn clearance(&self, point: &Vec3<F>) -> f64 {
        (*point - self.center).norm() - self.radius
    }
}

impl<F: Frame> From<&ObstacleConfig> for Obstacle<F> {
    fn from(c: &ObstacleConfig) -> Self {
        Self { center: Vec3::new(c.center[0], c.center[1], c.center[2]), radius: c.radius }
    }
}
