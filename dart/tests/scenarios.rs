//! # Concrete Scenario Tests
//!
//! End-to-end tests against the `dart_*` components directly — the
//! binary crate itself has no library surface to call into, so these
//! exercise the planner/controller/safety collaboration the composition
//! root wires together, the same way `evo`'s top-level test file
//! exercises its supervisor's building blocks rather than its `main`.

use approx::assert_abs_diff_eq;
use dart_common::command::BodyRateCommand;
use dart_common::config::{ControllerConfig, PlannerConfig};
use dart_common::mission::{Mission, Waypoint};
use dart_common::obstacle::Obstacle;
use dart_common::state::DroneState;
use dart_controller::{ControllerGains, GeometricController};
use dart_io::{SimulatedVehicleLink, VehicleLink, VehicleMode};
use dart_planner::Planner;
use dart_safety::{Failsafe, FailsafeInputs, FailsafeState, HeartbeatMonitor, Producer};
use dart_units::{Enu, Vec3};

const MASS_KG: f64 = 1.5;

fn default_controller() -> GeometricController<Enu> {
    let cfg = ControllerConfig::default();
    let gains = ControllerGains::by_name(&cfg.tuning_profile).unwrap();
    GeometricController::<Enu>::new(gains, MASS_KG)
}

fn default_planner() -> Planner<Enu> {
    Planner::<Enu>::new(PlannerConfig::default(), MASS_KG)
}

/// 1. Hover hold: starting and holding at `[0, 0, 5]` should produce a
/// stationary trajectory and a near-hover thrust command.
#[test]
fn hover_hold_tracks_in_place() {
    let state = DroneState::<Enu>::hover_at(Vec3::new(0.0, 0.0, 5.0));
    let mut planner = default_planner();
    let trajectory = planner.plan(&state, Vec3::new(0.0, 0.0, 5.0), &[]).unwrap();
    assert!(!trajectory.degraded);

    let mut controller = default_controller();
    let output = controller.compute(&state, &trajectory, 0.0, 0.001);
    assert!(!output.non_finite_fallback);
    // A hovering vehicle with a stationary reference should command
    // positive, non-saturated thrust and near-zero body rates.
    assert!(output.command.thrust > 0.0);
    assert!(output.command.body_rates.norm() < 1.0);
}

/// 2. Step to waypoint: solving repeatedly toward a distant goal should
/// monotonically close the distance, not diverge or stall immediately.
#[test]
fn step_to_waypoint_closes_distance() {
    let mut state = DroneState::<Enu>::hover_at(Vec3::new(0.0, 0.0, 5.0));
    let goal = Vec3::new(5.0, 0.0, 5.0);
    let mut planner = default_planner();

    let initial_distance = (goal - state.position).norm();
    for _ in 0..10 {
        let trajectory = planner.plan(&state, goal, &[]).unwrap();
        let sample = trajectory.sample_at(trajectory.t0().unwrap()).unwrap();
        state.position = sample.position;
        state.velocity = sample.velocity;
        state.attitude = sample.attitude;
    }
    let last_distance = (goal - state.position).norm();
    assert!(last_distance < initial_distance, "expected progress toward the goal: {initial_distance} -> {last_distance}");
}

/// 3. Obstacle detour: a sphere between the vehicle and the goal must
/// never be violated by the planned trajectory's knots.
#[test]
fn obstacle_detour_keeps_clearance() {
    let state = DroneState::<Enu>::hover_at(Vec3::new(0.0, 0.0, 5.0));
    let goal = Vec3::new(5.0, 0.0, 5.0);
    let obstacle = Obstacle::new(Vec3::new(2.5, 0.0, 5.0), 0.8);
    let mut planner = default_planner();

    let trajectory = planner.plan(&state, goal, &[obstacle]).unwrap();
    let safety_margin = PlannerConfig::default().safety_margin;
    for p in trajectory.positions.iter() {
        assert!(
            obstacle.clearance(p) >= safety_margin - 1e-6,
            "knot came within {} of the obstacle, less than the required safety margin {safety_margin}",
            obstacle.clearance(p)
        );
    }
}

/// 4. Square mission: four waypoints plus return-to-start must all be
/// accepted by mission upload when inside the configured workspace.
#[test]
fn square_mission_is_accepted() {
    let corners = [(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0), (0.0, 0.0)];
    let waypoints: Vec<Waypoint<Enu>> =
        corners.iter().map(|&(x, y)| Waypoint { position: Vec3::new(x, y, 10.0), tolerance: 2.0 }).collect();

    let mission = Mission::upload(waypoints, Vec3::new(-5.0, -5.0, 0.0), Vec3::new(25.0, 25.0, 20.0)).unwrap();
    assert_eq!(mission.waypoints().len(), 5);
}

/// 5. State starvation: 60 ms without a state update while FLYING must
/// trip EMERGENCY_STOP once the 50 ms threshold is crossed.
#[test]
fn state_starvation_trips_emergency_stop() {
    let mut failsafe = Failsafe::new(0.2, 0.05);
    let mut heartbeat = HeartbeatMonitor::new();
    heartbeat.beat(Producer::Estimator, 0.0);
    heartbeat.beat(Producer::Planner, 0.0);
    failsafe.update(FailsafeInputs {
        pilot_command: Some(dart_safety::PilotCommand(FailsafeState::Flying)),
        ..Default::default()
    });

    let now = 0.060;
    let state = failsafe.update(FailsafeInputs {
        plan_update_age_s: heartbeat.age(Producer::Planner, now),
        state_update_age_s: heartbeat.age(Producer::Estimator, now),
        ..Default::default()
    });
    assert_eq!(state, FailsafeState::EmergencyStop);
}

/// 6. Planner latency: a stalled planner must not corrupt the controller
/// output (no NaNs) and the failsafe must have escalated to SAFE_HOVER
/// by the configured plan timeout.
#[tokio::test]
async fn planner_latency_holds_last_trajectory_without_nans() {
    let state = DroneState::<Enu>::hover_at(Vec3::new(0.0, 0.0, 5.0));
    let mut planner = default_planner();
    let last_good = planner.plan(&state, Vec3::new(3.0, 0.0, 5.0), &[]).unwrap();

    // Simulate a 300 ms planner stall: the controller keeps tracking the
    // last published trajectory, clamped to its timestamp window.
    let mut controller = default_controller();
    let t_current = last_good.t_n().unwrap() + 0.300;
    let output = controller.compute(&state, &last_good, t_current, 0.001);
    assert!(output.command.is_finite());
    assert!(!output.command.thrust.is_nan());

    let mut failsafe = Failsafe::new(0.200, 0.050);
    failsafe.update(FailsafeInputs {
        pilot_command: Some(dart_safety::PilotCommand(FailsafeState::Flying)),
        ..Default::default()
    });
    let resulting = failsafe.update(FailsafeInputs { plan_update_age_s: 0.300, state_update_age_s: 0.0, ..Default::default() });
    assert_eq!(resulting, FailsafeState::SafeHover);
}

/// The simulated vehicle link accepts the zero-thrust, zero-rate safe
/// command EMERGENCY_STOP forces the controller to emit.
#[tokio::test]
async fn emergency_stop_command_is_accepted_by_the_link() {
    let mut link = SimulatedVehicleLink::<Enu>::new(MASS_KG, 30.0, DroneState::hover_at(Vec3::new(0.0, 0.0, 5.0)));
    link.connect().await.unwrap();
    link.arm().await.unwrap();
    link.set_mode(VehicleMode::Offboard).await.unwrap();

    let safe = BodyRateCommand::safe_zero();
    link.send_command(dart_common::command::ControlCommand::BodyRate(safe)).await.unwrap();
    let state = link.get_state().await.unwrap();
    assert_abs_diff_eq!(state.position.z(), 5.0, epsilon = 0.2);
}
