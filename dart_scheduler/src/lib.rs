//! # DART Real-Time Scheduler
//!
//! Independently-clocked periodic task execution: one OS thread per
//! task, each sleeping to an absolute monotonic deadline, measuring its
//! own execution time, and publishing its own [`dart_common::task::TaskStats`]
//! for telemetry to pull without touching the task's hot path.
//!
//! - [`rt`] — the per-thread RT setup sequence (mlockall, affinity, `SCHED_FIFO`).
//! - [`task`] — a single task's periodic loop.
//! - [`scheduler`] — the set of all tasks for one process.

pub mod rt;
pub mod scheduler;
pub mod task;

pub use scheduler::Scheduler;
pub use task::{TaskHandle, TaskPlacement};
