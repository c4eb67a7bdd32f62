//! Periodic task execution: one OS thread per task, each independently
//! clocked, each publishing its own [`TaskStats`] through a lock-free
//! [`Snapshot`] so telemetry can pull timing without blocking the task
//! itself.
//!
//! The per-cycle timing protocol mirrors the teacher's cycle loop (sleep
//! to an absolute deadline on a monotonic clock, measure, detect
//! overrun, record, advance) generalized from one fixed-rate loop to N
//! independently configured ones, and split into named steps so a miss
//! is attributable to exactly one of them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use dart_common::consts::TASK_STATS_WINDOW_DEFAULT;
use dart_common::error::DartError;
use dart_common::task::{SchedulerTask, TaskState, TaskStats};
use dart_safety::Snapshot;

use crate::rt;

/// A spawned task's handle: stop it, or read its descriptor back.
pub struct TaskHandle {
    pub descriptor: SchedulerTask,
    stats: Arc<Snapshot<TaskStats>>,
    stop: Arc<AtomicBool>,
    join: Option<thread::JoinHandle<()>>,
    join_timeout: Duration,
}

impl TaskHandle {
    pub fn stats(&self) -> Arc<TaskStats> {
        self.stats.load()
    }

    pub fn stats_snapshot(&self) -> Arc<Snapshot<TaskStats>> {
        self.stats.clone()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Per-task timing and scheduling parameters not carried on
/// [`SchedulerTask`] itself (those are workload identity; these are
/// placement).
#[derive(Copy, Clone, Debug)]
pub struct TaskPlacement {
    pub cpu_core: Option<usize>,
    pub rt_priority: i32,
    pub deadline_violation_misses: u32,
    pub deadline_violation_window: u32,
    pub drift_compensation_factor: f64,
    /// Maximum time to wait for the task's thread to join on stop before
    /// it is abandoned with a logged warning.
    pub join_timeout: Duration,
}

/// Spawn `body` on its own thread, running it once per `descriptor.period`
/// seconds against an absolute monotonic deadline. `stats` is the
/// snapshot the task publishes its timing into; the caller creates it at
/// registration time (before the task exists) so other, later-registered
/// tasks can already hold a live handle to it. Returns a handle the
/// caller uses to stop the task.
pub fn spawn<F>(descriptor: SchedulerTask, placement: TaskPlacement, stats: Arc<Snapshot<TaskStats>>, mut body: F) -> TaskHandle
where
    F: FnMut() -> Result<(), DartError> + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));

    let thread_stats = stats.clone();
    let thread_stop = stop.clone();
    let id = descriptor.id.clone();
    let period = descriptor.period;
    let deadline_margin = descriptor.deadline_margin;

    let join = thread::Builder::new()
        .name(id.as_str().to_string())
        .spawn(move || {
            if let Err(e) = rt::rt_setup(placement.cpu_core.unwrap_or(0), placement.rt_priority) {
                tracing::warn!(task = id.as_str(), error = %e, "RT setup failed; running unprioritized");
            }
            run_periodic(
                id.as_str(),
                period,
                deadline_margin,
                placement.deadline_violation_misses,
                placement.drift_compensation_factor,
                &thread_stats,
                &thread_stop,
                &mut body,
            );
        })
        .expect("failed to spawn scheduler task thread");

    TaskHandle { descriptor, stats, stop, join: Some(join), join_timeout: placement.join_timeout }
}

impl Drop for TaskHandle {
    /// Signals the task to stop, then waits up to `join_timeout` for its
    /// thread to exit. A thread that is still running past the timeout is
    /// abandoned (detached) with a logged warning rather than blocking
    /// shutdown indefinitely.
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        let Some(j) = self.join.take() else { return };
        if j.is_finished() {
            let _ = j.join();
            return;
        }

        let deadline = Instant::now() + self.join_timeout;
        loop {
            if j.is_finished() {
                let _ = j.join();
                return;
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    task = self.descriptor.id.as_str(),
                    timeout_s = self.join_timeout.as_secs_f64(),
                    "task thread did not stop within join timeout; abandoning"
                );
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }
}

fn run_periodic(
    id: &str,
    period_s: f64,
    deadline_margin_s: f64,
    miss_threshold: u32,
    drift_factor: f64,
    stats: &Snapshot<TaskStats>,
    stop: &AtomicBool,
    body: &mut dyn FnMut() -> Result<(), DartError>,
) {
    let period = Duration::from_secs_f64(period_s.max(0.0));
    let deadline_margin = Duration::from_secs_f64(deadline_margin_s.max(0.0));

    let mut local = TaskStats::new(TASK_STATS_WINDOW_DEFAULT);
    let mut state = TaskState::Idle;
    let mut next_deadline = Instant::now() + period;
    let mut last_start: Option<Instant> = None;

    loop {
        if stop.load(Ordering::Relaxed) {
            state = TaskState::Stopped;
            break;
        }

        // Steps 1-2: next_deadline was already advanced at the end of
        // the previous cycle; sleep to it now (coarse sleep, then a
        // short spin for the final slice).
        sleep_until(next_deadline);

        let start = Instant::now();
        let interval = last_start.map(|p| (start - p).as_secs_f64()).unwrap_or(period_s);
        last_start = Some(start);

        // Step 3: execute and measure.
        let result = body();
        let exec_time = start.elapsed().as_secs_f64();

        // Step 4: deadline-miss detection.
        let missed = Instant::now() > next_deadline + deadline_margin;
        if missed {
            tracing::warn!(task = id, exec_s = exec_time, "deadline miss");
        }

        // Step 5: stats recording.
        local.record(exec_time, interval, missed);
        let (misses, total) = local.miss_ratio();

        state = match (&state, &result) {
            (_, Err(e)) => {
                tracing::error!(task = id, error = %e, "task body returned a fatal error; stopping");
                TaskState::Error
            }
            (TaskState::Error, Ok(())) => TaskState::Error,
            (_, Ok(())) if total > 0 && misses.saturating_mul(1000) >= (miss_threshold as u64).saturating_mul(total) => {
                tracing::error!(task = id, misses, total, "deadline-miss ratio exceeded threshold; degrading");
                TaskState::Degraded
            }
            (_, Ok(())) => TaskState::Running,
        };

        // Step 6: drift compensation — nudge the next deadline toward the
        // measured cadence instead of compounding scheduling error.
        let observed_error_s = interval - period_s;
        let correction = Duration::from_secs_f64((observed_error_s * drift_factor).abs());

        // Step 7: advance by exactly one period regardless of how late
        // this cycle finished — a slow cycle becomes one counted miss,
        // never a compressed catch-up of the schedule.
        next_deadline += period;
        next_deadline = if observed_error_s > 0.0 {
            next_deadline + correction
        } else {
            next_deadline.checked_sub(correction).unwrap_or(next_deadline)
        };

        stats.publish(local.clone());

        if matches!(state, TaskState::Error) {
            break;
        }
    }

    tracing::info!(task = id, ?state, "task loop exited");
}

fn sleep_until(deadline: Instant) {
    const SPIN_THRESHOLD: Duration = Duration::from_micros(200);
    loop {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        let remaining = deadline - now;
        if remaining > SPIN_THRESHOLD {
            thread::sleep(remaining - SPIN_THRESHOLD);
        } else {
            std::hint::spin_loop();
        }
    }
}
