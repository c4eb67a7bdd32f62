//! Scheduler task descriptors and runtime statistics.
//!
//! `TaskStats` mirrors the teacher's cycle-stats pattern: an O(1) running
//! accumulator (no history buffer needed for mean/min/max/stddev), plus a
//! small circular buffer of recent execution times for jitter RMS, bounded
//! to `window` samples so it never grows.

use heapless::Deque;

use crate::consts::TASK_STATS_WINDOW_DEFAULT;

/// A fixed set of periodic tasks, registered before `start()`.
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerTask {
    pub id: heapless::String<32>,
    /// Seconds.
    pub period: f64,
    /// Seconds; how late `start_time` may be past `next_deadline` before a
    /// miss is recorded.
    pub deadline_margin: f64,
    pub priority: TaskPriority,
    /// Wall-clock budget for one execution, seconds.
    pub budget: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskPriority {
    Telemetry,
    Planner,
    Control,
    Safety,
}

/// `Idle -> Running -> {Running, Degraded, Stopped, Error}`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Running,
    Degraded,
    Stopped,
    Error,
}

const JITTER_WINDOW_CAP: usize = 1024;

#[derive(Clone, Debug)]
pub struct TaskStats {
    pub executions: u64,
    pub missed_deadlines: u64,
    last_exec_s: f64,
    min_exec_s: f64,
    max_exec_s: f64,
    sum_exec_s: f64,
    sum_sq_exec_s: f64,
    /// Bounded ring of recent inter-execution intervals, used for jitter
    /// RMS. Default capacity 1000, matching the real-time scheduler spec.
    interval_window: Deque<f64, JITTER_WINDOW_CAP>,
    window: usize,
}

impl TaskStats {
    pub fn new(window: usize) -> Self {
        Self {
            executions: 0,
            missed_deadlines: 0,
            last_exec_s: 0.0,
            min_exec_s: f64::MAX,
            max_exec_s: 0.0,
            sum_exec_s: 0.0,
            sum_sq_exec_s: 0.0,
            interval_window: Deque::new(),
            window: window.min(JITTER_WINDOW_CAP).max(1),
        }
    }

    /// Record one task execution: how long the task body took
    /// (`exec_time_s`) and, separately, the interval since the previous
    /// execution's start (for jitter).
    pub fn record(&mut self, exec_time_s: f64, interval_s: f64, deadline_missed: bool) {
        self.executions += 1;
        if deadline_missed {
            self.missed_deadlines += 1;
        }
        self.last_exec_s = exec_time_s;
        if exec_time_s < self.min_exec_s {
            self.min_exec_s = exec_time_s;
        }
        if exec_time_s > self.max_exec_s {
            self.max_exec_s = exec_time_s;
        }
        self.sum_exec_s += exec_time_s;
        self.sum_sq_exec_s += exec_time_s * exec_time_s;

        if self.interval_window.len() == self.window {
            self.interval_window.pop_front();
        }
        let _ = self.interval_window.push_back(interval_s);
    }

    pub fn mean_exec_s(&self) -> f64 {
        if self.executions == 0 {
            0.0
        } else {
            self.sum_exec_s / self.executions as f64
        }
    }

    pub fn max_exec_s(&self) -> f64 {
        self.max_exec_s
    }

    pub fn min_exec_s(&self) -> f64 {
        if self.executions == 0 {
            0.0
        } else {
            self.min_exec_s
        }
    }

    pub fn stddev_exec_s(&self) -> f64 {
        if self.executions < 2 {
            return 0.0;
        }
        let n = self.executions as f64;
        let mean = self.mean_exec_s();
        ((self.sum_sq_exec_s / n) - mean * mean).max(0.0).sqrt()
    }

    /// RMS jitter of recent inter-execution intervals against `period`.
    pub fn jitter_rms_s(&self, period: f64) -> f64 {
        if self.interval_window.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.interval_window.iter().map(|&iv| (iv - period).powi(2)).sum();
        (sum_sq / self.interval_window.len() as f64).sqrt()
    }

    /// Empirical miss ratio over the window, as `(misses, total)`.
    pub fn miss_ratio(&self) -> (u64, u64) {
        (self.missed_deadlines, self.executions)
    }
}

impl Default for TaskStats {
    fn default() -> Self {
        Self::new(TASK_STATS_WINDOW_DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_stats_report_zero() {
        let s = TaskStats::default();
        assert_eq!(s.mean_exec_s(), 0.0);
        assert_eq!(s.min_exec_s(), 0.0);
    }

    #[test]
    fn min_max_mean_track_recorded_values() {
        let mut s = TaskStats::new(10);
        s.record(0.001, 0.01, false);
        s.record(0.003, 0.01, false);
        s.record(0.002, 0.01, false);
        assert!((s.min_exec_s() - 0.001).abs() < 1e-12);
        assert!((s.max_exec_s() - 0.003).abs() < 1e-12);
        assert!((s.mean_exec_s() - 0.002).abs() < 1e-9);
    }

    #[test]
    fn deadline_misses_are_counted() {
        let mut s = TaskStats::new(10);
        s.record(0.001, 0.01, true);
        s.record(0.001, 0.01, false);
        assert_eq!(s.miss_ratio(), (1, 2));
    }

    #[test]
    fn jitter_is_zero_for_perfectly_periodic_intervals() {
        let mut s = TaskStats::new(10);
        for _ in 0..5 {
            s.record(0.001, 0.01, false);
        }
        assert!(s.jitter_rms_s(0.01) < 1e-12);
    }

    #[test]
    fn window_is_bounded() {
        let mut s = TaskStats::new(3);
        for i in 0..10 {
            s.record(0.001, 0.01 + i as f64 * 1e-4, false);
        }
        assert!(s.interval_window.len() <= 3);
    }
}
