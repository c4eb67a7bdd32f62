//! Reference trajectory: the planner's output, the controller's input.
//!
//! Fixed-capacity (`heapless`) storage — a trajectory never grows past
//! `MAX_HORIZON_KNOTS` knots, so publishing a new plan never allocates on
//! the hot path, matching the zero-allocation discipline the rest of the
//! real-time pipeline holds to.

use dart_units::{quaternion, Frame, UnitsError, Vec3};
use heapless::Vec as HVec;
use nalgebra::{UnitQuaternion, Vector3};

use crate::consts::MAX_HORIZON_KNOTS;

pub type KnotVec<T> = HVec<T, MAX_HORIZON_KNOTS>;

#[derive(Clone, Debug)]
pub struct Trajectory<F: Frame> {
    pub timestamps: KnotVec<f64>,
    pub positions: KnotVec<Vec3<F>>,
    pub velocities: KnotVec<Vec3<F>>,
    pub accelerations: KnotVec<Vec3<F>>,
    pub attitudes: KnotVec<UnitQuaternion<f64>>,
    pub body_rates: KnotVec<Vector3<f64>>,
    /// Collective thrust, Newtons, per knot.
    pub thrusts: KnotVec<f64>,
    /// Set when the planner returned a previously-computed trajectory
    /// because the current solve failed to converge or was infeasible.
    pub degraded: bool,
}

/// A trajectory sample at an arbitrary time, produced by [`Trajectory::sample_at`].
#[derive(Copy, Clone, Debug)]
pub struct TrajectorySample<F: Frame> {
    pub position: Vec3<F>,
    pub velocity: Vec3<F>,
    pub acceleration: Vec3<F>,
    pub attitude: UnitQuaternion<f64>,
    pub body_rate: Vector3<f64>,
    pub thrust: f64,
    /// Set when `t` fell outside `[t0, tN]` and the nearest knot was used
    /// instead of interpolating.
    pub stale: bool,
}

impl<F: Frame> Trajectory<F> {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn t0(&self) -> Option<f64> {
        self.timestamps.first().copied()
    }

    pub fn t_n(&self) -> Option<f64> {
        self.timestamps.last().copied()
    }

    /// All N+1 sequences must be equal length, non-empty, and mutually
    /// consistent; timestamps strictly monotonic at `dt` spacing (within
    /// 1 microsecond); every attitude is unit norm; every thrust is
    /// non-negative.
    pub fn validate(&self, dt: f64) -> Result<(), UnitsError> {
        let n = self.timestamps.len();
        if n == 0
            || self.positions.len() != n
            || self.velocities.len() != n
            || self.accelerations.len() != n
            || self.attitudes.len() != n
            || self.body_rates.len() != n
            || self.thrusts.len() != n
        {
            return Err(UnitsError::NonFinite { where_: "Trajectory::validate length mismatch", value: n as f64 });
        }

        const SPACING_TOLERANCE_S: f64 = 1e-6;
        for w in self.timestamps.windows(2) {
            let spacing = w[1] - w[0];
            if spacing <= 0.0 || (spacing - dt).abs() > SPACING_TOLERANCE_S {
                return Err(UnitsError::NonFinite { where_: "Trajectory::validate timestamp spacing", value: spacing });
            }
        }

        for (k, q) in self.attitudes.iter().enumerate() {
            let norm = q.norm();
            if (norm - 1.0).abs() > 1e-6 {
                return Err(UnitsError::QuaternionNotNormalized { norm, lo: 1.0 - 1e-6, hi: 1.0 + 1e-6 });
            }
            let _ = k;
        }

        for &thrust in self.thrusts.iter() {
            if thrust < 0.0 || !thrust.is_finite() {
                return Err(UnitsError::NonFinite { where_: "Trajectory::validate thrust", value: thrust });
            }
        }

        Ok(())
    }

    /// A trajectory that holds position `goal` for the entire horizon, used
    /// when the goal is already within tolerance of the current position.
    pub fn stationary(goal: Vec3<F>, n_plus_one: usize, dt: f64, attitude: UnitQuaternion<f64>) -> Self {
        let mut t = Trajectory {
            timestamps: KnotVec::new(),
            positions: KnotVec::new(),
            velocities: KnotVec::new(),
            accelerations: KnotVec::new(),
            attitudes: KnotVec::new(),
            body_rates: KnotVec::new(),
            thrusts: KnotVec::new(),
            degraded: false,
        };
        for k in 0..n_plus_one {
            let _ = t.timestamps.push(k as f64 * dt);
            let _ = t.positions.push(goal);
            let _ = t.velocities.push(Vec3::zero());
            let _ = t.accelerations.push(Vec3::zero());
            let _ = t.attitudes.push(attitude);
            let _ = t.body_rates.push(Vector3::zeros());
            let _ = t.thrusts.push(0.0);
        }
        t
    }

    /// Sample the trajectory at `t`, linearly interpolating
    /// position/velocity/acceleration/body-rate/thrust and SLERPing
    /// attitude between the bracketing knots. `t` is clamped to `[t0, tN]`;
    /// when the caller's `t` falls outside that range the nearest knot is
    /// returned with `stale = true`.
    pub fn sample_at(&self, t: f64) -> Option<TrajectorySample<F>> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        if n == 1 {
            return Some(self.sample_knot(0, t != self.timestamps[0]));
        }

        let t0 = self.timestamps[0];
        let tn = self.timestamps[n - 1];
        if t <= t0 {
            return Some(self.sample_knot(0, t < t0));
        }
        if t >= tn {
            return Some(self.sample_knot(n - 1, t > tn));
        }

        // Binary search for the bracketing segment.
        let idx = match self
            .timestamps
            .binary_search_by(|probe| probe.partial_cmp(&t).unwrap())
        {
            Ok(i) => return Some(self.sample_knot(i, false)),
            Err(i) => i,
        };
        let lo = idx - 1;
        let hi = idx;
        let t_lo = self.timestamps[lo];
        let t_hi = self.timestamps[hi];
        let alpha = (t - t_lo) / (t_hi - t_lo);

        Some(TrajectorySample {
            position: lerp(self.positions[lo], self.positions[hi], alpha),
            velocity: lerp(self.velocities[lo], self.velocities[hi], alpha),
            acceleration: lerp(self.accelerations[lo], self.accelerations[hi], alpha),
            attitude: quaternion::slerp(&self.attitudes[lo], &self.attitudes[hi], alpha),
            body_rate: self.body_rates[lo].lerp(&self.body_rates[hi], alpha),
            thrust: self.thrusts[lo] + (self.thrusts[hi] - self.thrusts[lo]) * alpha,
            stale: false,
        })
    }

    fn sample_knot(&self, k: usize, stale: bool) -> TrajectorySample<F> {
        TrajectorySample {
            position: self.positions[k],
            velocity: self.velocities[k],
            acceleration: self.accelerations[k],
            attitude: self.attitudes[k],
            body_rate: self.body_rates[k],
            thrust: self.thrusts[k],
            stale,
        }
    }
}

fn lerp<F: Frame>(a: Vec3<F>, b: Vec3<F>, alpha: f64) -> Vec3<F> {
    a.scale(1.0 - alpha) + b.scale(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_units::Enu;

    fn sample_trajectory() -> Trajectory<Enu> {
        let mut t = Trajectory::<Enu> {
            timestamps: KnotVec::new(),
            positions: KnotVec::new(),
            velocities: KnotVec::new(),
            accelerations: KnotVec::new(),
            attitudes: KnotVec::new(),
            body_rates: KnotVec::new(),
            thrusts: KnotVec::new(),
            degraded: false,
        };
        for k in 0..4 {
            let _ = t.timestamps.push(k as f64 * 0.1);
            let _ = t.positions.push(Vec3::new(k as f64, 0.0, 5.0));
            let _ = t.velocities.push(Vec3::new(1.0, 0.0, 0.0));
            let _ = t.accelerations.push(Vec3::zero());
            let _ = t.attitudes.push(UnitQuaternion::identity());
            let _ = t.body_rates.push(Vector3::zeros());
            let _ = t.thrusts.push(9.8);
        }
        t
    }

    #[test]
    fn validates_at_correct_spacing() {
        let t = sample_trajectory();
        assert!(t.validate(0.1).is_ok());
    }

    #[test]
    fn interpolation_at_knot_equals_knot() {
        let t = sample_trajectory();
        let s = t.sample_at(0.2).unwrap();
        assert!((s.position.x() - 2.0).abs() < 1e-9);
        assert!(!s.stale);
    }

    #[test]
    fn interpolation_between_knots_is_finite() {
        let t = sample_trajectory();
        let s = t.sample_at(0.15).unwrap();
        assert!(s.position.is_finite());
        assert!((s.position.x() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn query_past_end_uses_last_knot_and_flags_stale() {
        let t = sample_trajectory();
        let s = t.sample_at(10.0).unwrap();
        assert!(s.stale);
        assert!((s.position.x() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn stationary_trajectory_has_zero_velocity_everywhere() {
        let goal = Vec3::<Enu>::new(1.0, 2.0, 3.0);
        let t = Trajectory::stationary(goal, 7, 0.1, UnitQuaternion::identity());
        assert_eq!(t.len(), 7);
        for v in t.velocities.iter() {
            assert!(v.norm() < 1e-12);
        }
    }
}
