//! Bounded, time-indexed `DroneState` history for transport-delay
//! compensation. Single-producer (the estimator/IO task), multi-consumer
//! (planner, controller, safety) — readers take a `parking_lot::RwLock`
//! read guard rather than a full copy, the same single-writer/
//! multi-reader discipline `evo_shared_memory` uses across process
//! boundaries, here in-process.

use std::collections::VecDeque;

use dart_common::state::DroneState;
use dart_units::{quaternion, Frame, Vec3};
use parking_lot::RwLock;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BufferError {
    #[error("state timestamp {new} is a regression from last pushed timestamp {last}")]
    TimestampRegression { new: f64, last: f64 },

    #[error("requested time {t} is outside the buffer range [{start}, {end}] by more than max_extrapolate ({max_extrapolate}s)")]
    OutOfRange { t: f64, start: f64, end: f64, max_extrapolate: f64 },

    #[error("buffer is empty")]
    Empty,
}

pub struct StateBuffer<F: Frame> {
    inner: RwLock<VecDeque<DroneState<F>>>,
    capacity: usize,
    max_extrapolate_s: f64,
}

impl<F: Frame> StateBuffer<F> {
    pub fn new(capacity: usize, max_extrapolate_s: f64) -> Self {
        Self { inner: RwLock::new(VecDeque::with_capacity(capacity)), capacity, max_extrapolate_s }
    }

    /// Push a new state. `timestamp` must be nondecreasing relative to the
    /// most recently pushed state; an equal timestamp is allowed once
    /// (idempotent re-push), a strict regression is rejected.
    pub fn push(&self, state: DroneState<F>) -> Result<(), BufferError> {
        let mut buf = self.inner.write();
        if let Some(last) = buf.back() {
            if state.timestamp < last.timestamp {
                return Err(BufferError::TimestampRegression { new: state.timestamp, last: last.timestamp });
            }
            if state.timestamp == last.timestamp {
                // Idempotent re-push: replace rather than duplicate.
                *buf.back_mut().unwrap() = state;
                return Ok(());
            }
        }
        if buf.len() == self.capacity {
            buf.pop_front();
        }
        buf.push_back(state);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Timestamp of the most recently pushed state, if any.
    pub fn latest_timestamp(&self) -> Option<f64> {
        self.inner.read().back().map(|s| s.timestamp)
    }

    /// State at time `t`, interpolating linearly on position/velocity/
    /// angular_velocity and SLERPing on attitude between the bracketing
    /// samples. Within `max_extrapolate_s` of either end, the nearest
    /// sample is returned; beyond it, `OutOfRange`.
    pub fn get_at(&self, t: f64) -> Result<DroneState<F>, BufferError> {
        let buf = self.inner.read();
        if buf.is_empty() {
            return Err(BufferError::Empty);
        }
        let start = buf.front().unwrap().timestamp;
        let end = buf.back().unwrap().timestamp;

        if t < start - self.max_extrapolate_s || t > end + self.max_extrapolate_s {
            return Err(BufferError::OutOfRange { t, start, end, max_extrapolate: self.max_extrapolate_s });
        }
        if t <= start {
            return Ok(*buf.front().unwrap());
        }
        if t >= end {
            return Ok(*buf.back().unwrap());
        }

        // Linear scan for the bracketing pair; the buffer is small
        // (default 1000 samples) and accessed far less often than it is
        // written, so this stays well within budget.
        let idx = buf.partition_point(|s| s.timestamp <= t);
        let lo = &buf[idx - 1];
        let hi = &buf[idx];
        let span = hi.timestamp - lo.timestamp;
        let alpha = if span > 0.0 { (t - lo.timestamp) / span } else { 0.0 };

        Ok(DroneState {
            timestamp: t,
            position: lerp(lo.position, hi.position, alpha),
            velocity: lerp(lo.velocity, hi.velocity, alpha),
            attitude: quaternion::slerp(&lo.attitude, &hi.attitude, alpha),
            angular_velocity: lo.angular_velocity.lerp(&hi.angular_velocity, alpha),
        })
    }

    /// `get_at(now - transport_delay)`.
    pub fn compensated_state(&self, now: f64, transport_delay_s: f64) -> Result<DroneState<F>, BufferError> {
        self.get_at(now - transport_delay_s)
    }
}

fn lerp<F: Frame>(a: Vec3<F>, b: Vec3<F>, alpha: f64) -> Vec3<F> {
    a.scale(1.0 - alpha) + b.scale(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_units::Enu;
    use nalgebra::{UnitQuaternion, Vector3};

    fn state_at(t: f64, x: f64) -> DroneState<Enu> {
        DroneState {
            timestamp: t,
            position: Vec3::new(x, 0.0, 0.0),
            velocity: Vec3::zero(),
            attitude: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
        }
    }

    #[test]
    fn push_then_get_at_exact_timestamp() {
        let buf = StateBuffer::<Enu>::new(10, 0.01);
        buf.push(state_at(1.0, 1.0)).unwrap();
        buf.push(state_at(2.0, 2.0)).unwrap();
        let s = buf.get_at(1.0).unwrap();
        assert!((s.position.x() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn get_at_interpolates_between_samples() {
        let buf = StateBuffer::<Enu>::new(10, 0.01);
        buf.push(state_at(1.0, 0.0)).unwrap();
        buf.push(state_at(2.0, 10.0)).unwrap();
        let s = buf.get_at(1.5).unwrap();
        assert!((s.position.x() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn regression_is_rejected() {
        let buf = StateBuffer::<Enu>::new(10, 0.01);
        buf.push(state_at(2.0, 0.0)).unwrap();
        assert!(buf.push(state_at(1.0, 0.0)).is_err());
    }

    #[test]
    fn equal_timestamp_is_idempotent() {
        let buf = StateBuffer::<Enu>::new(10, 0.01);
        buf.push(state_at(1.0, 1.0)).unwrap();
        buf.push(state_at(1.0, 2.0)).unwrap();
        assert_eq!(buf.len(), 1);
        let s = buf.get_at(1.0).unwrap();
        assert!((s.position.x() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn far_out_of_range_is_rejected() {
        let buf = StateBuffer::<Enu>::new(10, 0.01);
        buf.push(state_at(1.0, 0.0)).unwrap();
        assert!(buf.get_at(5.0).is_err());
    }

    #[test]
    fn within_extrapolation_window_returns_nearest() {
        let buf = StateBuffer::<Enu>::new(10, 0.01);
        buf.push(state_at(1.0, 0.0)).unwrap();
        let s = buf.get_at(1.005).unwrap();
        assert!((s.position.x() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn capacity_is_bounded() {
        let buf = StateBuffer::<Enu>::new(3, 0.01);
        for i in 0..10 {
            buf.push(state_at(i as f64, i as f64)).unwrap();
        }
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn latest_timestamp_tracks_the_last_push() {
        let buf = StateBuffer::<Enu>::new(10, 0.01);
        assert_eq!(buf.latest_timestamp(), None);
        buf.push(state_at(1.0, 0.0)).unwrap();
        buf.push(state_at(2.0, 10.0)).unwrap();
        assert_eq!(buf.latest_timestamp(), Some(2.0));
    }

    #[test]
    fn compensated_state_applies_delay() {
        let buf = StateBuffer::<Enu>::new(10, 0.01);
        buf.push(state_at(1.0, 0.0)).unwrap();
        buf.push(state_at(2.0, 10.0)).unwrap();
        let s = buf.compensated_state(2.0, 1.0).unwrap();
        assert!((s.position.x() - 0.0).abs() < 1e-9);
    }
}
