//! Composition root: wires the real-time scheduler, safety core,
//! controller, planner, and vehicle link into one running process,
//! generic over the active world frame so `main` monomorphizes exactly
//! once per loaded config.
//!
//! Grounded on `evo`'s `EvoSupervisor`: a `tokio` heartbeat loop plus a
//! `tokio::signal::ctrl_c` shutdown race, here extended with the
//! real-time tasks running on their own OS threads (`dart_scheduler`)
//! rather than as `tokio` tasks, per the split the concurrency model
//! calls for.
//!
//! `--mode` selects which tasks this process hosts: `edge` runs the
//! controller, scheduler, safety core, and vehicle I/O against a live
//! link; `cloud` runs the planner and mission management. The two are
//! genuinely different task sets, not a shared set with a CPU-affinity
//! hint — see the grounding notes on `run_cloud`/`run_edge` for how a
//! single-binary reference build stands in for the transport a real
//! cloud/edge split would need between them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dart_common::command::{BodyRateCommand, ControlCommand};
use dart_common::config::Config;
use dart_common::consts::{MAX_EXTRAPOLATE_DEFAULT_S, STATE_BUFFER_CAPACITY_DEFAULT};
use dart_common::mission::Waypoint;
use dart_common::obstacle::Obstacle;
use dart_common::state::DroneState;
use dart_common::task::{SchedulerTask, TaskPriority, TaskStats};
use dart_common::trajectory::Trajectory;
use dart_controller::{ControllerGains, GeometricController};
use dart_io::{upload_mission, SimulatedVehicleLink, VehicleLink, VehicleMode};
use dart_planner::Planner;
use dart_safety::{Failsafe, FailsafeInputs, FailsafeState, HeartbeatMonitor, PilotCommand, Producer, Snapshot, StateBuffer};
use dart_scheduler::Scheduler;
use dart_units::{Frame, Vec3};
use heapless::String as HString;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::cli::Mode;
use crate::exit;
use crate::status::{self, SystemStatus};

pub async fn run<F: Frame>(config: Config, mode: Mode, waypoints: Vec<Waypoint<F>>) -> i32 {
    match mode {
        Mode::Cloud => run_cloud::<F>(config, waypoints).await,
        Mode::Edge => run_edge::<F>(config).await,
    }
}

fn initial_state<F: Frame>(config: &Config) -> DroneState<F> {
    let start_altitude = config.planner.workspace_min[2].max(config.planner.workspace_max[2] * 0.1);
    DroneState::<F>::hover_at(Vec3::new(0.0, 0.0, start_altitude))
}

/// Cloud: Planner + mission management, no vehicle I/O. A real cloud/edge
/// deployment bridges vehicle state and the planned trajectory between
/// the two processes over a network transport; none is specified here,
/// so this reference build has the planner plan open-loop against the
/// mission's seeded starting state rather than a live feed from an edge
/// process. That seam is the natural place to plug in such a transport.
async fn run_cloud<F: Frame>(config: Config, mut waypoints: Vec<Waypoint<F>>) -> i32 {
    let mass = config.hardware.mass_kg;
    let start = initial_state::<F>(&config);

    if waypoints.is_empty() {
        waypoints.push(Waypoint { position: start.position, tolerance: 1.0 });
    }

    let workspace_min = Vec3::new(config.planner.workspace_min[0], config.planner.workspace_min[1], config.planner.workspace_min[2]);
    let workspace_max = Vec3::new(config.planner.workspace_max[0], config.planner.workspace_max[1], config.planner.workspace_max[2]);
    let mission = match upload_mission(waypoints, workspace_min, workspace_max) {
        Ok(m) => m,
        Err(e) => {
            error!(%e, "mission rejected");
            return exit::CONFIG_ERROR;
        }
    };
    let goal = mission.waypoints().first().map(|w| w.position).unwrap_or(start.position);
    let obstacles: Vec<Obstacle<F>> = config.obstacles.iter().map(Obstacle::from).collect();

    let state_buffer = Arc::new(StateBuffer::<F>::new(STATE_BUFFER_CAPACITY_DEFAULT, MAX_EXTRAPOLATE_DEFAULT_S));
    state_buffer.push(start).expect("seeding an empty buffer cannot regress");

    let trajectory_snapshot = Arc::new(Snapshot::new(Trajectory::stationary(
        goal,
        config.planner.prediction_horizon + 1,
        config.planner.dt,
        start.attitude,
    )));
    let failsafe_snapshot = Arc::new(Snapshot::new(FailsafeState::Init));
    let running = Arc::new(AtomicBool::new(true));

    let mut scheduler = Scheduler::new(config.real_time.clone());

    let planner_stats = {
        let mut planner = Planner::<F>::new(config.planner.clone(), mass);
        let state_buffer = state_buffer.clone();
        let trajectory_snapshot = trajectory_snapshot.clone();
        let dt = 1.0 / config.real_time.planner_hz;
        scheduler.register(task_descriptor("planner", dt, TaskPriority::Planner), None, 70, move || {
            let state = compensated_or_latest(&state_buffer, 0.0);
            match planner.plan(&state, goal, &obstacles) {
                Ok(trajectory) => trajectory_snapshot.publish(trajectory),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(%e, "planner solve rejected"),
            }
            Ok(())
        })
    };

    register_telemetry_task(
        &mut scheduler,
        config.real_time.telemetry_hz,
        state_buffer.clone(),
        0.0,
        trajectory_snapshot.clone(),
        failsafe_snapshot.clone(),
        vec![("planner".to_string(), planner_stats)],
    );

    scheduler.start();
    info!(mode = ?Mode::Cloud, "dart autonomy core running: planner + mission management");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    running.store(false, Ordering::Relaxed);
    scheduler.stop_all();

    if *failsafe_snapshot.load() == FailsafeState::EmergencyStop { exit::SAFETY_ABORT } else { exit::OK }
}

/// Edge: Controller + Scheduler + Safety + vehicle I/O, no mission
/// management. Absent a transport from a cloud process, the trajectory
/// this process tracks never advances past the initial stationary hold
/// at the starting position — see `run_cloud`'s grounding note.
async fn run_edge<F: Frame>(config: Config) -> i32 {
    let mass = config.hardware.mass_kg;
    let thrust_max_total = config.hardware.max_motor_thrust_n * config.hardware.num_arms as f64;
    let transport_delay_s = config.hardware.transport_delay_ms / 1000.0;
    let start = initial_state::<F>(&config);

    let mut link = SimulatedVehicleLink::<F>::new(mass, thrust_max_total, start);
    if link.connect().await.is_err() {
        error!("vehicle link failed to connect");
        return exit::LINK_FAILURE;
    }
    if link.arm().await.is_err() {
        error!("vehicle link refused to arm");
        return exit::LINK_FAILURE;
    }
    if link.set_mode(VehicleMode::Offboard).await.is_err() {
        error!("vehicle link refused offboard mode");
        return exit::LINK_FAILURE;
    }

    let state_buffer = Arc::new(StateBuffer::<F>::new(STATE_BUFFER_CAPACITY_DEFAULT, MAX_EXTRAPOLATE_DEFAULT_S));
    state_buffer.push(start).expect("seeding an empty buffer cannot regress");

    let trajectory_snapshot = Arc::new(Snapshot::new(Trajectory::stationary(
        start.position,
        config.planner.prediction_horizon + 1,
        config.planner.dt,
        start.attitude,
    )));
    let command_snapshot = Arc::new(Snapshot::new(BodyRateCommand::safe_zero()));
    let failsafe_snapshot = Arc::new(Snapshot::new(FailsafeState::Init));
    let running = Arc::new(AtomicBool::new(true));

    // The only task that talks to the (async) vehicle link; the RT tasks
    // below are plain synchronous closures running on dedicated threads
    // and only ever touch the lock-free snapshots and state buffer.
    let io_period = Duration::from_secs_f64(1.0 / config.real_time.control_hz);
    let io_state_buffer = state_buffer.clone();
    let io_command = command_snapshot.clone();
    let io_running = running.clone();
    let io_task = tokio::spawn(async move {
        let mut link = link;
        let mut ticker = interval(io_period);
        while io_running.load(Ordering::Relaxed) {
            ticker.tick().await;
            match link.get_state().await {
                Ok(state) => {
                    if let Err(e) = io_state_buffer.push(state) {
                        warn!(%e, "state buffer rejected a pushed state");
                    }
                }
                Err(e) => warn!(%e, "vehicle link state read failed"),
            }
            let command = *io_command.load();
            if let Err(e) = link.send_command(ControlCommand::BodyRate(command)).await {
                warn!(%e, "vehicle link command send failed");
            }
        }
        link
    });

    let mut scheduler = Scheduler::new(config.real_time.clone());
    let cpu_pin = |core: usize| Some(core);

    // Control (~1 kHz): track the published trajectory, zero the output
    // outright on EMERGENCY_STOP per the failsafe contract. Reads state
    // compensated for the configured transport delay rather than the
    // latest raw sample.
    let control_stats = {
        let gains = ControllerGains::by_name(&config.controller.tuning_profile).unwrap_or_else(ControllerGains::sitl_optimized);
        let mut controller = GeometricController::<F>::new(gains, mass);
        let state_buffer = state_buffer.clone();
        let trajectory_snapshot = trajectory_snapshot.clone();
        let command_snapshot = command_snapshot.clone();
        let failsafe_snapshot = failsafe_snapshot.clone();
        let dt = 1.0 / config.real_time.control_hz;
        scheduler.register(task_descriptor("control", dt, TaskPriority::Control), cpu_pin(2), 80, move || {
            let state = compensated_or_latest(&state_buffer, transport_delay_s);
            let trajectory = trajectory_snapshot.load();
            let output = controller.compute(&state, &trajectory, state.timestamp, dt);
            let command =
                if *failsafe_snapshot.load() == FailsafeState::EmergencyStop { BodyRateCommand::safe_zero() } else { output.command };
            command_snapshot.publish(command);
            Ok(())
        })
    };

    // Safety (~100 Hz): fuse state/plan liveness and geofence status into
    // the failsafe state machine.
    let safety_stats = {
        let mut failsafe = Failsafe::new(config.safety.plan_timeout_ms / 1000.0, config.safety.state_timeout_ms / 1000.0);
        let mut heartbeat = HeartbeatMonitor::new();
        let state_buffer = state_buffer.clone();
        let trajectory_snapshot = trajectory_snapshot.clone();
        let failsafe_snapshot = failsafe_snapshot.clone();
        let geofence_min = config.safety.geofence_min;
        let geofence_max = config.safety.geofence_max;
        let dt = 1.0 / config.real_time.safety_hz;
        let mut armed_for_flight = false;
        scheduler.register(task_descriptor("safety", dt, TaskPriority::Safety), cpu_pin(0), 90, move || {
            let state = compensated_or_latest(&state_buffer, transport_delay_s);
            let now = state.timestamp;
            heartbeat.beat(Producer::Estimator, now);
            if trajectory_snapshot.load().t0().is_some() {
                heartbeat.beat(Producer::Planner, now);
            }

            let outside_geofence = state.position.x() < geofence_min[0]
                || state.position.x() > geofence_max[0]
                || state.position.y() < geofence_min[1]
                || state.position.y() > geofence_max[1]
                || state.position.z() < geofence_min[2]
                || state.position.z() > geofence_max[2];

            let pilot_command = if !armed_for_flight {
                armed_for_flight = true;
                Some(PilotCommand(FailsafeState::Flying))
            } else {
                None
            };

            let resulting = failsafe.update(FailsafeInputs {
                plan_update_age_s: heartbeat.age(Producer::Planner, now),
                state_update_age_s: heartbeat.age(Producer::Estimator, now),
                deadline_escalation: false,
                geofence_violation: outside_geofence,
                battery_low: false,
                pilot_command,
            });
            failsafe_snapshot.publish(resulting);
            Ok(())
        })
    };

    register_telemetry_task(
        &mut scheduler,
        config.real_time.telemetry_hz,
        state_buffer.clone(),
        transport_delay_s,
        trajectory_snapshot.clone(),
        failsafe_snapshot.clone(),
        vec![("control".to_string(), control_stats), ("safety".to_string(), safety_stats)],
    );

    scheduler.start();
    info!(mode = ?Mode::Edge, "dart autonomy core running: controller + scheduler + safety + vehicle I/O");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    running.store(false, Ordering::Relaxed);
    scheduler.stop_all();
    if let Ok(mut link) = io_task.await {
        let _ = link.disarm().await;
        let _ = link.disconnect().await;
    }

    if *failsafe_snapshot.load() == FailsafeState::EmergencyStop { exit::SAFETY_ABORT } else { exit::OK }
}

/// State at `now - transport_delay_s`, where `now` is the most recently
/// pushed sample's own timestamp. Falls back to that latest sample
/// uncompensated when the delay reaches outside the buffer's
/// extrapolation window (e.g. just after startup, before enough history
/// has accumulated) — the buffer is always seeded with an initial state
/// before any task runs, so this never fails.
fn compensated_or_latest<F: Frame>(buffer: &StateBuffer<F>, transport_delay_s: f64) -> DroneState<F> {
    let now = buffer.latest_timestamp().unwrap_or(0.0);
    buffer
        .compensated_state(now, transport_delay_s)
        .unwrap_or_else(|_| buffer.get_at(now).expect("buffer was seeded at startup and is never emptied"))
}

/// Register the ~10 Hz telemetry task (spec's fourth execution context):
/// assembles a [`SystemStatus`] from the same snapshots the other tasks
/// publish through and exposes it as a pull-style snapshot any in-process
/// caller (e.g. a future RPC surface, out of scope here) can load without
/// blocking. `task_stats` is the set of stats handles captured from this
/// process's other `register()` calls — read directly rather than through
/// the `Scheduler`, since this task's closure cannot hold a reference back
/// into the scheduler that spawns it.
fn register_telemetry_task<F: Frame>(
    scheduler: &mut Scheduler,
    telemetry_hz: f64,
    state_buffer: Arc<StateBuffer<F>>,
    transport_delay_s: f64,
    trajectory_snapshot: Arc<Snapshot<Trajectory<F>>>,
    failsafe_snapshot: Arc<Snapshot<FailsafeState>>,
    task_stats: Vec<(String, Arc<Snapshot<TaskStats>>)>,
) -> Arc<Snapshot<SystemStatus<F>>> {
    let initial = status::assemble(
        compensated_or_latest(&state_buffer, transport_delay_s),
        &trajectory_snapshot,
        &failsafe_snapshot,
        &task_stats,
    );
    let status_snapshot = Arc::new(Snapshot::new(initial));
    let published = status_snapshot.clone();
    let dt = 1.0 / telemetry_hz;
    scheduler.register(task_descriptor("telemetry", dt, TaskPriority::Telemetry), None, 10, move || {
        let state = compensated_or_latest(&state_buffer, transport_delay_s);
        let status = status::assemble(state, &trajectory_snapshot, &failsafe_snapshot, &task_stats);
        debug!(safety_state = ?status.safety_state, tracked_tasks = status.scheduler_stats.len(), "status refreshed");
        published.publish(status);
        Ok(())
    });
    status_snapshot
}

fn task_descriptor(id: &str, period_s: f64, priority: TaskPriority) -> SchedulerTask {
    SchedulerTask {
        id: HString::try_from(id).expect("task id fits in 32 bytes"),
        period: period_s,
        deadline_margin: period_s * 0.2,
        priority,
        budget: period_s,
    }
}
