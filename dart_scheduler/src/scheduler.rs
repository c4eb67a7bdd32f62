//! Owns the full set of periodic tasks for one process: the composition
//! root registers each task, then a single `start()` call spawns them
//! all as a unit. Registration and start are kept as separate steps so
//! a task's timing-stats handle exists (and can be captured by a
//! later-registered task's closure — e.g. telemetry reading every
//! other task's stats) before any thread actually runs.

use std::sync::Arc;
use std::time::Duration;

use dart_common::config::RealTimeConfig;
use dart_common::consts::{TASK_JOIN_TIMEOUT_DEFAULT_S, TASK_STATS_WINDOW_DEFAULT};
use dart_common::error::DartError;
use dart_common::task::{SchedulerTask, TaskStats};
use dart_safety::Snapshot;

use crate::task::{spawn, TaskHandle, TaskPlacement};

type TaskBody = Box<dyn FnMut() -> Result<(), DartError> + Send>;

struct PendingTask {
    descriptor: SchedulerTask,
    cpu_core: Option<usize>,
    rt_priority: i32,
    stats: Arc<Snapshot<TaskStats>>,
    body: TaskBody,
}

pub struct Scheduler {
    real_time: RealTimeConfig,
    pending: Vec<PendingTask>,
    tasks: Vec<TaskHandle>,
    started: bool,
}

impl Scheduler {
    pub fn new(real_time: RealTimeConfig) -> Self {
        Self { real_time, pending: Vec::new(), tasks: Vec::new(), started: false }
    }

    /// Register a task; it does not run until `start()` is called.
    /// Returns a handle to the task's timing statistics, live (though
    /// empty) immediately — a task registered afterward can capture it
    /// and read it once both are running, with no need to hold a
    /// reference back to the scheduler itself.
    ///
    /// Panics if called after `start()`: registrations are frozen at
    /// start.
    pub fn register<F>(&mut self, descriptor: SchedulerTask, cpu_core: Option<usize>, rt_priority: i32, body: F) -> Arc<Snapshot<TaskStats>>
    where
        F: FnMut() -> Result<(), DartError> + Send + 'static,
    {
        assert!(!self.started, "cannot register a task after the scheduler has started");
        let stats = Arc::new(Snapshot::new(TaskStats::new(TASK_STATS_WINDOW_DEFAULT)));
        self.pending.push(PendingTask { descriptor, cpu_core, rt_priority, stats: stats.clone(), body: Box::new(body) });
        stats
    }

    /// Spawn every registered task's thread. `register()` panics after
    /// this point.
    pub fn start(&mut self) {
        self.started = true;
        let join_timeout = Duration::from_secs_f64(TASK_JOIN_TIMEOUT_DEFAULT_S);
        for pending in self.pending.drain(..) {
            let placement = TaskPlacement {
                cpu_core: pending.cpu_core,
                rt_priority: pending.rt_priority,
                deadline_violation_misses: self.real_time.deadline_violation_misses,
                deadline_violation_window: self.real_time.deadline_violation_window,
                drift_compensation_factor: self.real_time.drift_compensation_factor,
                join_timeout,
            };
            self.tasks.push(spawn(pending.descriptor, placement, pending.stats, pending.body));
        }
    }

    pub fn task_stats(&self, id: &str) -> Option<Arc<TaskStats>> {
        self.tasks.iter().find(|t| t.descriptor.id.as_str() == id).map(|t| t.stats())
    }

    pub fn all_stats(&self) -> Vec<(String, Arc<TaskStats>)> {
        self.tasks.iter().map(|t| (t.descriptor.id.as_str().to_string(), t.stats())).collect()
    }

    /// Stop every running task. Each task's thread is joined up to its
    /// configured timeout and abandoned past that — see `Drop for
    /// TaskHandle`.
    pub fn stop_all(&mut self) {
        self.tasks.clear();
    }
}
