//! Integration tests for the guidance state machine
//!
//! Scenario-level checks of mode precedence, home capture, return-to-launch
//! staging, position hold and guided sub-commands, driven by synthetic
//! vehicle states and a mock clock at 50 Hz.

#![cfg(feature = "std")]

mod common;

use quadpilot_core::{
    guidance::{GuidanceConfig, GuidanceStateMachine, RtlStage},
    state::{
        FlightMode, GuidanceOutput, GuidedCommand, GuidedTarget, ModeTag, RcInput, ThrustSetpoint,
        VehicleState,
    },
    time::MockTimeSource,
};

use common::{state_at, HOME_LAT, HOME_LON};

const PERIOD_MS: u64 = 20;

struct Flight<'a> {
    clock: &'a MockTimeSource,
    guidance: GuidanceStateMachine<&'a MockTimeSource>,
}

impl<'a> Flight<'a> {
    fn new(clock: &'a MockTimeSource) -> Self {
        Self { clock, guidance: GuidanceStateMachine::new(GuidanceConfig::default(), clock) }
    }

    fn step(&mut self, state: &VehicleState, mode: FlightMode) -> GuidanceOutput {
        self.step_with(state, mode, false, false, &RcInput::centered(1500))
    }

    fn step_with(
        &mut self,
        state: &VehicleState,
        mode: FlightMode,
        rc_failsafe: bool,
        battery_failsafe: bool,
        rc: &RcInput,
    ) -> GuidanceOutput {
        self.clock.advance_ms(PERIOD_MS);
        self.guidance.process(state, mode, rc_failsafe, battery_failsafe, rc)
    }

    fn capture_home(&mut self) {
        let home = state_at(0.0, 0.0, 0.0);
        for _ in 0..4 {
            self.step(&home, FlightMode::Stabilize);
        }
        assert!(self.guidance.home().is_some());
    }

    fn failsafe_rtl(&mut self, state: &VehicleState) -> GuidanceOutput {
        self.step_with(state, FlightMode::AltHold, true, false, &RcInput::centered(1500))
    }
}

fn altitude_target(output: &GuidanceOutput) -> f32 {
    match output.thrust {
        ThrustSetpoint::Altitude(target) => target,
        ThrustSetpoint::Throttle(_) => panic!("expected an altitude setpoint, got {:?}", output),
    }
}

#[test]
fn test_home_is_mean_of_first_fixes() {
    let clock = MockTimeSource::new(0);
    let mut flight = Flight::new(&clock);

    let fixes = [
        state_at(0.0, 0.0, 10.0),
        state_at(2.0, 0.0, 12.0),
        state_at(0.0, 2.0, 10.0),
        state_at(2.0, 2.0, 12.0),
    ];
    for (i, state) in fixes.iter().enumerate() {
        assert!(flight.guidance.home().is_none(), "home set after {} fixes", i);
        flight.step(state, FlightMode::Stabilize);
    }

    let home = flight.guidance.home().unwrap();
    assert_within_tolerance!(home.latitude, (fixes[0].latitude + fixes[1].latitude) / 2.0, 1e-9);
    assert_within_tolerance!(home.longitude, (fixes[0].longitude + fixes[2].longitude) / 2.0, 1e-9);
    assert_within_tolerance!(home.altitude, 11.0, 1e-4);

    // Later fixes never move it
    flight.step(&state_at(500.0, 500.0, 80.0), FlightMode::Stabilize);
    assert_eq!(flight.guidance.home(), Some(home));
}

#[test]
fn test_rtl_without_home_holds_failsafe_output() {
    let clock = MockTimeSource::new(0);
    let mut flight = Flight::new(&clock);

    let out = flight.failsafe_rtl(&state_at(0.0, 0.0, 5.0));
    assert_eq!(out, GuidanceOutput::failsafe(ModeTag::Rtl));

    let guided = flight.step(&state_at(0.0, 0.0, 5.0), FlightMode::Guided(GuidedCommand::Rtl));
    assert_eq!(guided, GuidanceOutput::failsafe(ModeTag::Rtl));
}

#[test]
fn test_battery_failsafe_beats_radio_failsafe() {
    let clock = MockTimeSource::new(0);
    let mut flight = Flight::new(&clock);
    flight.capture_home();

    let out = flight.step_with(
        &state_at(10.0, 0.0, 8.0),
        FlightMode::PosHold,
        true,
        true,
        &RcInput::centered(1500),
    );
    assert_eq!(out.mode, ModeTag::Land);
    assert_eq!(out.mode.as_str(), "Land");
}

#[test]
fn test_rtl_flies_home_then_descends_for_good() {
    let clock = MockTimeSource::new(0);
    let mut flight = Flight::new(&clock);
    flight.capture_home();

    // 30 m north of home, facing north, low
    let away = state_at(30.0, 0.0, 3.0);
    let out = flight.failsafe_rtl(&away);
    assert_eq!(out.mode, ModeTag::Rtl);
    assert_eq!(flight.guidance.rtl_stage(), Some(RtlStage::GotoHome));
    // Home is behind: full nose-down limit backwards, no roll
    assert_eq!(out.desired_pitch, -30.0);
    assert_within_tolerance!(out.desired_roll, 0.0, 1e-3);
    assert_within_tolerance!(altitude_target(&out), 3.04, 1e-4);

    // Climb is rate limited and stops at the RTL altitude
    let mut last = altitude_target(&out);
    for _ in 0..400 {
        let target = altitude_target(&flight.failsafe_rtl(&away));
        assert!(target >= last && target <= 10.0);
        last = target;
    }
    assert_within_tolerance!(last, 10.0, 1e-3);

    // Within tolerance: descend over home
    let overhead = state_at(0.5, 0.0, 10.0);
    let out = flight.failsafe_rtl(&overhead);
    assert_eq!(flight.guidance.rtl_stage(), Some(RtlStage::Descend));
    assert_within_tolerance!(altitude_target(&out), 9.99, 1e-4);
    assert_within_tolerance!(out.desired_pitch, -1.0, 1e-2);

    // Drifting away again keeps descending toward home
    let drifted = state_at(5.0, 0.0, 9.0);
    let mut previous = altitude_target(&out);
    for _ in 0..20 {
        let out = flight.failsafe_rtl(&drifted);
        assert_eq!(flight.guidance.rtl_stage(), Some(RtlStage::Descend));
        assert_within_tolerance!(out.desired_pitch, -10.0, 1e-2);
        assert!(altitude_target(&out) < previous);
        previous = altitude_target(&out);
    }

    // A flickering radio link must not send it back up: Descend is final
    flight.step(&drifted, FlightMode::AltHold);
    assert_eq!(flight.guidance.rtl_stage(), Some(RtlStage::Descend));
    let far = state_at(40.0, 0.0, 9.0);
    for _ in 0..10 {
        let out = flight.failsafe_rtl(&far);
        assert_eq!(flight.guidance.rtl_stage(), Some(RtlStage::Descend));
        assert!(altitude_target(&out) < previous);
        previous = altitude_target(&out);
    }
}

#[test]
fn test_pos_hold_steers_back_to_anchor() {
    let clock = MockTimeSource::new(0);
    let mut flight = Flight::new(&clock);

    flight.step(&state_at(0.0, 0.0, 5.0), FlightMode::PosHold);
    let anchor = flight.guidance.hold_anchor().unwrap();
    assert_within_tolerance!(anchor.latitude, HOME_LAT, 1e-9);
    assert_within_tolerance!(anchor.longitude, HOME_LON, 1e-9);

    // Drifted 5 m east while facing north: roll left
    let out = flight.step(&state_at(0.0, 5.0, 5.0), FlightMode::PosHold);
    assert_within_tolerance!(out.desired_roll, -10.0, 1e-2);
    assert_within_tolerance!(out.desired_pitch, 0.0, 1e-2);

    // Same drift while facing east: the anchor is behind
    let facing_east = VehicleState { yaw: 90.0, ..state_at(0.0, 5.0, 5.0) };
    let out = flight.step(&facing_east, FlightMode::PosHold);
    assert_within_tolerance!(out.desired_pitch, -10.0, 1e-2);
    assert_within_tolerance!(out.desired_roll, 0.0, 1e-2);
    assert_eq!(altitude_target(&out), 5.0);
}

#[test]
fn test_pos_hold_stick_input_reanchors() {
    let clock = MockTimeSource::new(0);
    let mut flight = Flight::new(&clock);
    flight.step(&state_at(0.0, 0.0, 5.0), FlightMode::PosHold);

    let moved = state_at(0.0, 8.0, 5.0);
    let rc = RcInput { roll: 1700, ..RcInput::centered(1500) };
    let out = flight.step_with(&moved, FlightMode::PosHold, false, false, &rc);
    assert_within_tolerance!(out.desired_roll, 12.0, 1e-4);

    // Sticks released: the new anchor is where the pilot let go
    let out = flight.step(&moved, FlightMode::PosHold);
    assert_within_tolerance!(out.desired_roll, 0.0, 1e-3);
    assert_eq!(flight.guidance.hold_anchor(), Some(moved.position()));
}

#[test]
fn test_land_descends_to_ground_and_stays() {
    let clock = MockTimeSource::new(0);
    let mut flight = Flight::new(&clock);

    let state = state_at(0.0, 0.0, 0.2);
    let mut target = f32::MAX;
    for _ in 0..40 {
        let out = flight.step(&state, FlightMode::Land);
        assert_eq!(out.mode, ModeTag::Land);
        assert_eq!((out.desired_roll, out.desired_pitch, out.desired_yaw_rate), (0.0, 0.0, 0.0));
        let next = altitude_target(&out);
        assert!(next <= target && next >= 0.0);
        target = next;
    }
    assert_eq!(target, 0.0);
}

#[test]
fn test_guided_takeoff_then_pilot_holds() {
    let clock = MockTimeSource::new(0);
    let mut flight = Flight::new(&clock);
    let takeoff = FlightMode::Guided(GuidedCommand::Takeoff { altitude: 3.0 });
    let ground = state_at(0.0, 0.0, 0.0);

    let mut target = 0.0;
    for _ in 0..250 {
        let out = flight.step(&ground, takeoff);
        assert_eq!(out.mode, ModeTag::Guided);
        let next = altitude_target(&out);
        assert!(next >= target && next <= 3.0);
        target = next;
    }
    assert_eq!(target, 3.0);

    // Complete: throttle now commands climb rate as in AltHold
    let rc = RcInput::centered(2000);
    let out = flight.step_with(&ground, takeoff, false, false, &rc);
    assert_within_tolerance!(altitude_target(&out), 3.04, 1e-4);
}

#[test]
fn test_guided_goto_latches_arrival() {
    let clock = MockTimeSource::new(0);
    let mut flight = Flight::new(&clock);

    let waypoint = state_at(0.0, 20.0, 5.0);
    let goto = FlightMode::Guided(GuidedCommand::Goto(GuidedTarget {
        latitude: waypoint.latitude,
        longitude: waypoint.longitude,
        altitude: 5.0,
    }));

    let out = flight.step(&state_at(0.0, 0.0, 5.0), goto);
    assert_eq!(out.desired_roll, 30.0);
    assert_within_tolerance!(out.desired_pitch, 0.0, 1e-3);

    let out = flight.step(&state_at(0.0, 19.8, 5.1), goto);
    assert_within_tolerance!(out.desired_roll, 0.0, 1e-3);

    // Latched: pushed off the waypoint, the pilot keeps control
    let out = flight.step(&state_at(0.0, 10.0, 5.0), goto);
    assert_within_tolerance!(out.desired_roll, 0.0, 1e-3);
    assert_eq!(out.mode, ModeTag::Guided);
}
