//! The core's pull telemetry interface: a consistent snapshot of vehicle
//! state, the active reference trajectory, per-task scheduler timing, and
//! the failsafe state, assembled on demand from the same lock-free
//! snapshots the real-time tasks publish through. Grounded on `evo`'s
//! `EvoSupervisor::get_system_state()`, which aggregates several modules'
//! latest state into one struct a caller can poll.

use std::sync::Arc;

use dart_common::state::DroneState;
use dart_common::task::TaskStats;
use dart_common::trajectory::Trajectory;
use dart_safety::{FailsafeState, Snapshot};
use dart_units::Frame;

#[derive(Clone, Debug)]
pub struct SystemStatus<F: Frame> {
    pub state: DroneState<F>,
    pub trajectory_snapshot: Trajectory<F>,
    pub scheduler_stats: Vec<(String, Arc<TaskStats>)>,
    pub safety_state: FailsafeState,
}

/// Assemble a consistent [`SystemStatus`] from the snapshots the
/// composition root's tasks publish into. Each field is read
/// independently (the snapshots are not read under one lock), matching
/// the "best-effort consistent" semantics of every other pull read of
/// these snapshots in the system.
///
/// `task_stats` is a list of `(task id, stats handle)` pairs captured
/// once at task registration time — the telemetry task reads them
/// directly rather than through the `Scheduler`, since a task closure
/// running on its own thread has no safe way to hold a reference back
/// into the `Scheduler` struct that owns it.
pub fn assemble<F: Frame>(
    state: DroneState<F>,
    trajectory_snapshot: &Snapshot<Trajectory<F>>,
    failsafe_snapshot: &Snapshot<FailsafeState>,
    task_stats: &[(String, Arc<Snapshot<TaskStats>>)],
) -> SystemStatus<F> {
    SystemStatus {
        state,
        trajectory_snapshot: (*trajectory_snapshot.load()).clone(),
        scheduler_stats: task_stats.iter().map(|(id, s)| (id.clone(), s.load())).collect(),
        safety_state: *failsafe_snapshot.load(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_common::consts::TASK_STATS_WINDOW_DEFAULT;
    use dart_units::{Enu, Vec3};

    #[test]
    fn assembles_all_four_fields_from_fresh_snapshots() {
        let state = DroneState::<Enu>::hover_at(Vec3::new(0.0, 0.0, 5.0));
        let trajectory = Snapshot::new(Trajectory::<Enu>::stationary(
            Vec3::new(0.0, 0.0, 5.0),
            4,
            0.02,
            nalgebra::UnitQuaternion::identity(),
        ));
        let failsafe = Snapshot::new(FailsafeState::Init);
        let control_stats = Arc::new(Snapshot::new(TaskStats::new(TASK_STATS_WINDOW_DEFAULT)));

        let status = assemble(state, &trajectory, &failsafe, &[("control".to_string(), control_stats)]);
        assert_eq!(status.safety_state, FailsafeState::Init);
        assert_eq!(status.trajectory_snapshot.len(), 4);
        assert_eq!(status.scheduler_stats.len(), 1);
        assert_eq!(status.scheduler_stats[0].0, "control");
    }

    #[test]
    fn empty_task_stats_list_is_accepted() {
        let state = DroneState::<Enu>::hover_at(Vec3::new(0.0, 0.0, 5.0));
        let trajectory = Snapshot::new(Trajectory::<Enu>::stationary(
            Vec3::new(0.0, 0.0, 5.0),
            4,
            0.02,
            nalgebra::UnitQuaternion::identity(),
        ));
        let failsafe = Snapshot::new(FailsafeState::Init);

        let status = assemble(state, &trajectory, &failsafe, &[]);
        assert!(status.scheduler_stats.is_empty());
    }
}
