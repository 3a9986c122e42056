//! Guidance: flight-mode state machine
//!
//! ## Overview
//!
//! Guidance turns the fused [`VehicleState`], pilot sticks and failsafe
//! flags into setpoints for the controller:
//!
//! ```text
//!   requested mode ─┐
//!   rc failsafe ────┼─→ select_mode ─→ active mode ─→ mode function ─→ GuidanceOutput
//!   battery fs ─────┘                      ↑               ↑
//!                             home, anchors, RTL stage, target altitude
//! ```
//!
//! ## Modes
//!
//! | Mode      | Roll / Pitch            | Yaw rate  | Vertical                       |
//! |-----------|-------------------------|-----------|--------------------------------|
//! | Stabilize | sticks                  | stick     | throttle passthrough           |
//! | AltHold   | sticks                  | stick     | throttle → climb rate → target |
//! | PosHold   | sticks or hold anchor   | stick     | as AltHold                     |
//! | Guided    | toward waypoint or zero | zero      | takeoff ramp / goto ramp       |
//! | Land      | zero or land anchor     | zero      | target descends to 0           |
//! | RTL       | toward home, then Land  | zero      | climb, then descend            |
//!
//! Battery failsafe forces Land, radio failsafe forces RTL (battery wins).
//!
//! ## RTL stages
//!
//! ```text
//!  enter ─→ GotoHome ──(distance ≤ tolerance)──→ Descend
//!               │                                   │
//!               └── climb toward max(alt, rtl_alt)  └── Land at home
//! ```
//!
//! Descend is irreversible: once reached it survives mode changes, so a
//! later RTL lands in place. Only [`GuidanceStateMachine::reset_home`]
//! clears it. Leaving RTL while still in GotoHome drops the stage.
//!
//! ## Degraded operation
//!
//! RTL needs a home position. Before one is captured guidance answers RTL
//! with the zero-attitude, zero-thrust failsafe output instead of an error.
//!
//! ## Time
//!
//! Target altitudes integrate rates over the interval between calls, read
//! from the injected [`TimeSource`]. The first call measures zero.

pub mod home;
pub mod mode_select;
pub mod navigation;

pub use home::{HomePosition, HomeTracker};
pub use mode_select::{select_mode, ModeSwitch, ModeSwitchConfig};

use crate::{
    constants::guidance::{
        DEFAULT_TAKEOFF_ALTITUDE_M, GOTO_ALTITUDE_TOLERANCE_M, GOTO_ARRIVAL_RADIUS_M,
        GOTO_VERTICAL_RATE_M_S, HOME_FIX_COUNT, LAND_DESCENT_RATE_M_S, MAX_CLIMB_RATE_M_S,
        MAX_DESCENT_RATE_M_S, MAX_PITCH_DEG, MAX_ROLL_DEG, MAX_YAW_RATE_DEG_S,
        POSITION_KP_DEG_PER_M, RTL_ALTITUDE_M, RTL_TOLERANCE_M, STICK_DEADBAND_PWM,
        TAKEOFF_CLIMB_RATE_M_S,
    },
    constants::PWM_CENTER,
    errors::{PipelineError, PipelineResult},
    pwm::{stick_deflection, stick_to_symmetric, throttle_to_unit},
    state::{
        FlightMode, GeoPoint, GuidanceOutput, GuidedCommand, GuidedTarget, ModeTag, RcInput,
        ThrustSetpoint, VehicleState,
    },
    time::{DeltaTimer, TimeSource},
};

use navigation::{attitude_toward, limit_magnitude, LocalOffset, PositionGains};

/// Flight envelope and navigation tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GuidanceConfig {
    /// Roll at full stick deflection (degrees)
    pub max_roll_deg: f32,
    /// Pitch at full stick deflection (degrees)
    pub max_pitch_deg: f32,
    /// Yaw rate at full stick deflection (degrees/second)
    pub max_yaw_rate_deg_s: f32,
    /// Climb rate at full throttle (m/s)
    pub max_climb_rate_m_s: f32,
    /// Descent rate at zero throttle (m/s, positive)
    pub max_descent_rate_m_s: f32,
    /// Target descent rate while landing (m/s, positive)
    pub land_descent_rate_m_s: f32,
    /// Target climb rate during guided takeoff (m/s)
    pub takeoff_climb_rate_m_s: f32,
    /// Vertical rate bound toward a guided waypoint (m/s)
    pub goto_vertical_rate_m_s: f32,
    /// Tilt per meter of position error (degrees/m)
    pub position_kp: f32,
    /// Distance to home at which RTL starts descending (m)
    pub rtl_tolerance_m: f32,
    /// Minimum altitude RTL flies home at (m)
    pub rtl_altitude_m: f32,
    /// Horizontal arrival radius of a guided waypoint (m)
    pub goto_arrival_radius_m: f32,
    /// Vertical arrival tolerance of a guided waypoint (m)
    pub goto_altitude_tolerance_m: f32,
    /// Takeoff altitude used when the command carries none (m)
    pub default_takeoff_altitude_m: f32,
    /// Stick deflection that hands position hold back to the pilot (PWM µs)
    pub stick_deadband_pwm: u16,
    /// GPS fixes averaged into the home position
    pub home_fix_count: u8,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            max_roll_deg: MAX_ROLL_DEG,
            max_pitch_deg: MAX_PITCH_DEG,
            max_yaw_rate_deg_s: MAX_YAW_RATE_DEG_S,
            max_climb_rate_m_s: MAX_CLIMB_RATE_M_S,
            max_descent_rate_m_s: MAX_DESCENT_RATE_M_S,
            land_descent_rate_m_s: LAND_DESCENT_RATE_M_S,
            takeoff_climb_rate_m_s: TAKEOFF_CLIMB_RATE_M_S,
            goto_vertical_rate_m_s: GOTO_VERTICAL_RATE_M_S,
            position_kp: POSITION_KP_DEG_PER_M,
            rtl_tolerance_m: RTL_TOLERANCE_M,
            rtl_altitude_m: RTL_ALTITUDE_M,
            goto_arrival_radius_m: GOTO_ARRIVAL_RADIUS_M,
            goto_altitude_tolerance_m: GOTO_ALTITUDE_TOLERANCE_M,
            default_takeoff_altitude_m: DEFAULT_TAKEOFF_ALTITUDE_M,
            stick_deadband_pwm: STICK_DEADBAND_PWM,
            home_fix_count: HOME_FIX_COUNT,
        }
    }
}

impl GuidanceConfig {
    /// Stick authority: roll/pitch angles and yaw rate at full deflection
    ///
    /// Only magnitudes are kept.
    pub fn with_attitude_limits(mut self, roll_deg: f32, pitch_deg: f32, yaw_rate_deg_s: f32) -> Self {
        self.max_roll_deg = libm::fabsf(roll_deg);
        self.max_pitch_deg = libm::fabsf(pitch_deg);
        self.max_yaw_rate_deg_s = libm::fabsf(yaw_rate_deg_s);
        self
    }

    /// Pilot climb/descent rates (both positive)
    pub fn with_vertical_rates(mut self, climb_m_s: f32, descent_m_s: f32) -> Self {
        self.max_climb_rate_m_s = climb_m_s;
        self.max_descent_rate_m_s = descent_m_s;
        self
    }

    /// RTL cruise altitude and arrival tolerance
    pub fn with_rtl(mut self, altitude_m: f32, tolerance_m: f32) -> Self {
        self.rtl_altitude_m = altitude_m;
        self.rtl_tolerance_m = tolerance_m;
        self
    }

    /// Number of fixes averaged into home
    pub fn with_home_fix_count(mut self, count: u8) -> Self {
        self.home_fix_count = count;
        self
    }

    fn position_gains(&self) -> PositionGains {
        PositionGains {
            kp: self.position_kp,
            max_roll_deg: self.max_roll_deg,
            max_pitch_deg: self.max_pitch_deg,
        }
    }
}

/// Stage of a return-to-launch episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RtlStage {
    /// Flying toward home at the RTL altitude
    GotoHome,
    /// Within tolerance of home, landing
    Descend,
}

/// Flight-mode state machine
///
/// Owns every piece of guidance state; nothing outside mutates it.
#[derive(Debug)]
pub struct GuidanceStateMachine<C: TimeSource> {
    config: GuidanceConfig,
    clock: C,
    timer: DeltaTimer,
    home: HomeTracker,
    active: Option<FlightMode>,
    target_altitude: Option<f32>,
    hold_anchor: Option<GeoPoint>,
    land_anchor: Option<GeoPoint>,
    rtl_stage: Option<RtlStage>,
    rtl_climb_altitude: f32,
    guided_complete: bool,
    degraded: bool,
}

impl<C: TimeSource> GuidanceStateMachine<C> {
    /// State machine in Stabilize with no home
    pub fn new(config: GuidanceConfig, clock: C) -> Self {
        Self {
            home: HomeTracker::new(config.home_fix_count),
            config,
            clock,
            timer: DeltaTimer::new(),
            active: None,
            target_altitude: None,
            hold_anchor: None,
            land_anchor: None,
            rtl_stage: None,
            rtl_climb_altitude: 0.0,
            guided_complete: false,
            degraded: false,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &GuidanceConfig {
        &self.config
    }

    /// Mode run on the most recent tick
    pub fn active_mode(&self) -> Option<FlightMode> {
        self.active
    }

    /// Captured home position
    pub fn home(&self) -> Option<HomePosition> {
        self.home.position()
    }

    /// Latest RTL stage, `None` before RTL or after an unfinished GotoHome
    pub fn rtl_stage(&self) -> Option<RtlStage> {
        self.rtl_stage
    }

    /// Altitude setpoint carried between ticks
    pub fn target_altitude(&self) -> Option<f32> {
        self.target_altitude
    }

    /// PosHold anchor
    pub fn hold_anchor(&self) -> Option<GeoPoint> {
        self.hold_anchor
    }

    /// Discard home and capture it again from the next fixes
    pub fn reset_home(&mut self) {
        log_info!("home position reset");
        self.home.reset();
        self.rtl_stage = None;
    }

    /// Compute this tick's setpoints
    ///
    /// Never fails: faults inside a mode degrade to
    /// [`GuidanceOutput::failsafe`].
    pub fn process(
        &mut self,
        state: &VehicleState,
        requested: FlightMode,
        rc_failsafe: bool,
        battery_failsafe: bool,
        rc: &RcInput,
    ) -> GuidanceOutput {
        let dt = self.timer.lap(self.clock.now());

        if let Some(home) = self.home.observe(state) {
            log_info!(
                "home captured at {:.7}, {:.7} ({:.1} m)",
                home.latitude,
                home.longitude,
                home.altitude
            );
        }

        let sticks = rc.clamped();
        if sticks != *rc {
            log_debug!("rc channels clamped: {:?} -> {:?}", rc, sticks);
        }

        let mode = select_mode(requested, rc_failsafe, battery_failsafe);
        self.enter(mode);

        let tag = mode.tag();
        match self.run(mode, state, &sticks, dt) {
            Ok(mut output) => {
                self.degraded = false;
                output.mode = tag;
                output
            }
            Err(_err) => {
                if !self.degraded {
                    log_warn!("{} degraded to failsafe output: {}", tag, _err);
                    self.degraded = true;
                }
                GuidanceOutput::failsafe(tag)
            }
        }
    }

    /// Bookkeeping on the tick a new mode takes over
    fn enter(&mut self, mode: FlightMode) {
        let previous = self.active.replace(mode);
        if previous == Some(mode) {
            return;
        }
        let previous_tag = previous.map(|m| m.tag());
        log_info!(
            "mode {} -> {}",
            previous_tag.map_or("none", ModeTag::as_str),
            mode.tag()
        );

        let entering_rtl = mode.tag() == ModeTag::Rtl && previous_tag != Some(ModeTag::Rtl);
        match self.rtl_stage {
            Some(RtlStage::GotoHome) if mode.tag() != ModeTag::Rtl => self.rtl_stage = None,
            Some(RtlStage::Descend) if entering_rtl => {
                self.land_anchor = self.home.position().map(|h| h.point());
            }
            _ => {}
        }

        match mode {
            FlightMode::Stabilize => {
                self.target_altitude = None;
                self.hold_anchor = None;
            }
            FlightMode::PosHold => self.hold_anchor = None,
            FlightMode::Land | FlightMode::Guided(GuidedCommand::Land) => {
                self.land_anchor = match previous_tag {
                    Some(ModeTag::PosHold) => self.hold_anchor,
                    Some(ModeTag::Rtl) => self.home.position().map(|h| h.point()),
                    _ => None,
                };
            }
            FlightMode::Guided(GuidedCommand::Takeoff { .. })
            | FlightMode::Guided(GuidedCommand::Goto(_)) => self.guided_complete = false,
            _ => {}
        }
    }

    fn run(
        &mut self,
        mode: FlightMode,
        state: &VehicleState,
        rc: &RcInput,
        dt: f32,
    ) -> PipelineResult<GuidanceOutput> {
        let output = match mode {
            FlightMode::Stabilize => self.stabilize(rc),
            FlightMode::AltHold => self.alt_hold(state, rc, dt),
            FlightMode::PosHold => self.pos_hold(state, rc, dt),
            FlightMode::Guided(command) => self.guided(command, state, rc, dt)?,
            FlightMode::Land => self.land(state, dt),
            FlightMode::Rtl => self.rtl(state, dt)?,
        };
        Ok(output)
    }

    fn stabilize(&self, rc: &RcInput) -> GuidanceOutput {
        let (roll, pitch, yaw_rate) = self.manual_attitude(rc);
        setpoint(roll, pitch, yaw_rate, ThrustSetpoint::Throttle(throttle_to_unit(rc.throttle)))
    }

    fn alt_hold(&mut self, state: &VehicleState, rc: &RcInput, dt: f32) -> GuidanceOutput {
        let target = self.integrate_pilot_climb(state, rc, dt);
        self.manual_hold(rc, target)
    }

    fn pos_hold(&mut self, state: &VehicleState, rc: &RcInput, dt: f32) -> GuidanceOutput {
        let deadband = self.config.stick_deadband_pwm;
        let manual = rc.roll.abs_diff(PWM_CENTER) > deadband || rc.pitch.abs_diff(PWM_CENTER) > deadband;
        let yaw_rate = stick_to_symmetric(rc.yaw, self.config.max_yaw_rate_deg_s);

        let (roll, pitch) = if manual {
            self.hold_anchor = Some(state.position());
            self.manual_angles(rc)
        } else {
            let anchor = *self.hold_anchor.get_or_insert(state.position());
            attitude_toward(anchor, state.position(), state.yaw, &self.config.position_gains())
        };

        let target = self.integrate_pilot_climb(state, rc, dt);
        setpoint(roll, pitch, yaw_rate, ThrustSetpoint::Altitude(target))
    }

    fn guided(
        &mut self,
        command: GuidedCommand,
        state: &VehicleState,
        rc: &RcInput,
        dt: f32,
    ) -> PipelineResult<GuidanceOutput> {
        match command {
            GuidedCommand::Takeoff { altitude } => Ok(self.guided_takeoff(altitude, state, rc, dt)),
            GuidedCommand::Goto(target) => Ok(self.guided_goto(target, state, rc, dt)),
            GuidedCommand::Land => Ok(self.land(state, dt)),
            GuidedCommand::Rtl => self.rtl(state, dt),
        }
    }

    fn guided_takeoff(&mut self, altitude: f32, state: &VehicleState, rc: &RcInput, dt: f32) -> GuidanceOutput {
        if self.guided_complete {
            return self.alt_hold(state, rc, dt);
        }

        let goal = if altitude.is_finite() && altitude > 0.0 {
            altitude
        } else {
            self.config.default_takeoff_altitude_m
        };
        let rate = self.config.takeoff_climb_rate_m_s;
        let target = self.target_altitude.get_or_insert(state.altitude);
        *target += rate * dt;

        if *target >= goal {
            *target = goal;
            self.guided_complete = true;
            log_info!("takeoff reached {:.1} m", goal);
            return self.manual_hold(rc, goal);
        }
        setpoint(0.0, 0.0, 0.0, ThrustSetpoint::Altitude(*target))
    }

    fn guided_goto(&mut self, waypoint: GuidedTarget, state: &VehicleState, rc: &RcInput, dt: f32) -> GuidanceOutput {
        let finite = waypoint.latitude.is_finite()
            && waypoint.longitude.is_finite()
            && waypoint.altitude.is_finite();
        if !finite {
            log_warn!("guided goto without a usable waypoint, holding failsafe output");
            return GuidanceOutput::failsafe(ModeTag::Guided);
        }
        if self.guided_complete {
            return self.alt_hold(state, rc, dt);
        }

        let destination = GeoPoint::new(waypoint.latitude, waypoint.longitude);
        let (roll, pitch) =
            attitude_toward(destination, state.position(), state.yaw, &self.config.position_gains());

        let altitude_error = waypoint.altitude - state.altitude;
        let limit = self.config.goto_vertical_rate_m_s;
        let target = self.target_altitude.get_or_insert(state.altitude);
        *target += limit_magnitude(altitude_error, limit) * dt;
        let target = *target;

        let distance = LocalOffset::between(destination, state.position()).distance_m();
        if distance < self.config.goto_arrival_radius_m
            && libm::fabsf(altitude_error) < self.config.goto_altitude_tolerance_m
        {
            self.guided_complete = true;
            log_info!("goto waypoint reached");
            return self.manual_hold(rc, target);
        }
        setpoint(roll, pitch, 0.0, ThrustSetpoint::Altitude(target))
    }

    fn land(&mut self, state: &VehicleState, dt: f32) -> GuidanceOutput {
        let rate = self.config.land_descent_rate_m_s;
        let target = self.target_altitude.get_or_insert(state.altitude);
        *target = (*target - rate * dt).max(0.0);
        let target = *target;

        let (roll, pitch) = match self.land_anchor {
            Some(anchor) => {
                attitude_toward(anchor, state.position(), state.yaw, &self.config.position_gains())
            }
            None => (0.0, 0.0),
        };
        setpoint(roll, pitch, 0.0, ThrustSetpoint::Altitude(target))
    }

    fn rtl(&mut self, state: &VehicleState, dt: f32) -> PipelineResult<GuidanceOutput> {
        let home = self.home.position().ok_or(PipelineError::UnsetHomePosition)?;

        let stage = match self.rtl_stage {
            Some(stage) => stage,
            None => {
                self.rtl_climb_altitude = state.altitude.max(self.config.rtl_altitude_m);
                log_info!("rtl: flying home at {:.1} m", self.rtl_climb_altitude);
                self.rtl_stage = Some(RtlStage::GotoHome);
                RtlStage::GotoHome
            }
        };

        if stage == RtlStage::GotoHome {
            let distance = LocalOffset::between(home.point(), state.position()).distance_m();
            if distance > self.config.rtl_tolerance_m {
                let climb_limit = libm::fabsf(self.config.max_climb_rate_m_s) * dt;
                let descent_limit = libm::fabsf(self.config.max_descent_rate_m_s) * dt;
                let goal = self.rtl_climb_altitude;
                let target = self.target_altitude.get_or_insert(state.altitude);
                *target += (goal - *target).max(-descent_limit).min(climb_limit);
                let target = *target;

                let (roll, pitch) = attitude_toward(
                    home.point(),
                    state.position(),
                    state.yaw,
                    &self.config.position_gains(),
                );
                return Ok(setpoint(roll, pitch, 0.0, ThrustSetpoint::Altitude(target)));
            }

            log_info!("rtl: {:.2} m from home, descending", distance);
            self.rtl_stage = Some(RtlStage::Descend);
            self.land_anchor = Some(home.point());
        }

        Ok(self.land(state, dt))
    }

    /// Advance the target altitude by the throttle-commanded climb rate
    fn integrate_pilot_climb(&mut self, state: &VehicleState, rc: &RcInput, dt: f32) -> f32 {
        let deflection = stick_deflection(rc.throttle);
        let rate = if deflection > 0.0 {
            deflection * self.config.max_climb_rate_m_s
        } else {
            deflection * self.config.max_descent_rate_m_s
        };
        let target = self.target_altitude.get_or_insert(state.altitude);
        *target += rate * dt;
        *target
    }

    fn manual_angles(&self, rc: &RcInput) -> (f32, f32) {
        (
            stick_to_symmetric(rc.roll, self.config.max_roll_deg),
            stick_to_symmetric(rc.pitch, self.config.max_pitch_deg),
        )
    }

    fn manual_attitude(&self, rc: &RcInput) -> (f32, f32, f32) {
        let (roll, pitch) = self.manual_angles(rc);
        (roll, pitch, stick_to_symmetric(rc.yaw, self.config.max_yaw_rate_deg_s))
    }

    /// Pilot attitude with a fixed altitude target
    fn manual_hold(&self, rc: &RcInput, target: f32) -> GuidanceOutput {
        let (roll, pitch, yaw_rate) = self.manual_attitude(rc);
        setpoint(roll, pitch, yaw_rate, ThrustSetpoint::Altitude(target))
    }
}

/// Output with the mode tag filled in by the caller
fn setpoint(roll: f32, pitch: f32, yaw_rate: f32, thrust: ThrustSetpoint) -> GuidanceOutput {
    GuidanceOutput {
        desired_roll: roll,
        desired_pitch: pitch,
        desired_yaw_rate: yaw_rate,
        thrust,
        mode: ModeTag::default(),
    }
}
