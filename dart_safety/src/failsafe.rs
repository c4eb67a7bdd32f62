//! The watchdog/failsafe state machine: `INIT -> STANDBY -> ARMED ->
//! FLYING -> {FLYING, SAFE_HOVER, LAND, EMERGENCY_STOP}`.
//!
//! Generalizes `evo_control_unit::safety::stop::SafeStopExecutor`'s
//! phase-driven-by-`tick()` shape from a per-axis stop sequence to a
//! mission-level state machine, and
//! `evo_control_unit::safety::flags::evaluate_axis_safety`'s
//! flag-aggregation from per-axis flags to mission-level liveness inputs.

use tracing::{info, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FailsafeState {
    Init,
    Standby,
    Armed,
    Flying,
    SafeHover,
    Land,
    EmergencyStop,
}

/// An explicit, validated pilot-issued state request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PilotCommand(pub FailsafeState);

/// Every input the failsafe state machine evaluates on a given tick. All
/// ages are seconds since the last corresponding heartbeat/update.
#[derive(Copy, Clone, Debug, Default)]
pub struct FailsafeInputs {
    pub plan_update_age_s: f64,
    pub state_update_age_s: f64,
    pub deadline_escalation: bool,
    pub geofence_violation: bool,
    pub battery_low: bool,
    pub pilot_command: Option<PilotCommand>,
}

#[derive(Debug)]
pub struct Failsafe {
    state: FailsafeState,
    plan_timeout_s: f64,
    state_timeout_s: f64,
}

impl Failsafe {
    pub fn new(plan_timeout_s: f64, state_timeout_s: f64) -> Self {
        Self { state: FailsafeState::Init, plan_timeout_s, state_timeout_s }
    }

    pub fn state(&self) -> FailsafeState {
        self.state
    }

    /// Evaluate one tick's worth of inputs and return the (possibly
    /// unchanged) resulting state. Precedence (highest first): explicit
    /// pilot command, state-update loss, deadline escalation, geofence
    /// violation, low battery, plan-update loss — matching the order the
    /// individual transitions are listed in.
    pub fn update(&mut self, inputs: FailsafeInputs) -> FailsafeState {
        let before = self.state;

        if self.state == FailsafeState::EmergencyStop {
            // Terminal within a mission: only an explicit pilot reset
            // leaves EMERGENCY_STOP.
            if let Some(PilotCommand(target)) = inputs.pilot_command {
                self.transition(target, "pilot reset from EMERGENCY_STOP");
            }
            return self.state;
        }

        if let Some(PilotCommand(target)) = inputs.pilot_command {
            self.transition(target, "explicit pilot command");
            return self.state;
        }

        if inputs.state_update_age_s > self.state_timeout_s {
            self.transition(FailsafeState::EmergencyStop, "state update loss");
            return self.state;
        }

        if inputs.deadline_escalation {
            self.transition(FailsafeState::Land, "scheduler deadline escalation");
            return self.state;
        }

        if inputs.geofence_violation {
            self.transition(FailsafeState::Land, "geofence violation");
            return self.state;
        }

        if inputs.battery_low {
            self.transition(FailsafeState::Land, "low battery");
            return self.state;
        }

        if self.state == FailsafeState::Flying && inputs.plan_update_age_s > self.plan_timeout_s {
            self.transition(FailsafeState::SafeHover, "planner update loss");
            return self.state;
        }

        if before != self.state {
            info!(?before, after = ?self.state, "failsafe transition");
        }
        self.state
    }

    fn transition(&mut self, target: FailsafeState, reason: &'static str) {
        if target == self.state {
            return;
        }
        warn!(from = ?self.state, to = ?target, reason, "failsafe transition");
        self.state = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Failsafe {
        let mut f = Failsafe::new(0.2, 0.05);
        f.update(FailsafeInputs { pilot_command: Some(PilotCommand(FailsafeState::Flying)), ..Default::default() });
        f
    }

    #[test]
    fn state_loss_triggers_emergency_stop() {
        let mut f = fresh();
        let s = f.update(FailsafeInputs { state_update_age_s: 0.1, ..Default::default() });
        assert_eq!(s, FailsafeState::EmergencyStop);
    }

    #[test]
    fn plan_loss_while_flying_triggers_safe_hover() {
        let mut f = fresh();
        let s = f.update(FailsafeInputs { plan_update_age_s: 0.3, ..Default::default() });
        assert_eq!(s, FailsafeState::SafeHover);
    }

    #[test]
    fn deadline_escalation_triggers_land() {
        let mut f = fresh();
        let s = f.update(FailsafeInputs { deadline_escalation: true, ..Default::default() });
        assert_eq!(s, FailsafeState::Land);
    }

    #[test]
    fn geofence_violation_triggers_land() {
        let mut f = fresh();
        let s = f.update(FailsafeInputs { geofence_violation: true, ..Default::default() });
        assert_eq!(s, FailsafeState::Land);
    }

    #[test]
    fn low_battery_triggers_land() {
        let mut f = fresh();
        let s = f.update(FailsafeInputs { battery_low: true, ..Default::default() });
        assert_eq!(s, FailsafeState::Land);
    }

    #[test]
    fn emergency_stop_is_terminal_without_pilot_reset() {
        let mut f = fresh();
        f.update(FailsafeInputs { state_update_age_s: 1.0, ..Default::default() });
        assert_eq!(f.state(), FailsafeState::EmergencyStop);
        let s = f.update(FailsafeInputs { ..Default::default() });
        assert_eq!(s, FailsafeState::EmergencyStop);
    }

    #[test]
    fn pilot_reset_leaves_emergency_stop() {
        let mut f = fresh();
        f.update(FailsafeInputs { state_update_age_s: 1.0, ..Default::default() });
        let s = f.update(FailsafeInputs {
            pilot_command: Some(PilotCommand(FailsafeState::Standby)),
            ..Default::default()
        });
        assert_eq!(s, FailsafeState::Standby);
    }

    #[test]
    fn state_loss_outranks_plan_loss() {
        let mut f = fresh();
        let s = f.update(FailsafeInputs {
            state_update_age_s: 1.0,
            plan_update_age_s: 1.0,
            ..Default::default()
        });
        assert_eq!(s, FailsafeState::EmergencyStop);
    }
}
