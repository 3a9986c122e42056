//! Attitude and Altitude Control
//!
//! ## Overview
//!
//! Four independent PID loops close the gap between the fused state and the
//! guidance setpoints:
//!
//! | Axis     | Error                                 | Output range      |
//! |----------|---------------------------------------|-------------------|
//! | Roll     | desired roll − roll                   | ±30°              |
//! | Pitch    | desired pitch − pitch                 | ±30°              |
//! | YawRate  | desired yaw rate − measured yaw rate  | ±5 °/s            |
//! | Altitude | target altitude − altitude            | [0, 1] thrust     |
//!
//! ## Stabilize bypass
//!
//! When guidance hands over [`ThrustSetpoint::Throttle`] the altitude loop is
//! skipped entirely and the pilot's throttle goes straight to the output.
//! The altitude loop's state is not touched on those ticks.
//!
//! ## PWM conversion
//!
//! ```text
//! roll/pitch/yaw: pwm = 1500 + output/limit · span    (span 500 by default)
//! thrust:         pwm = 1000 + thrust · 1000
//! ```
//!
//! Both clamped to [1000, 2000].
//!
//! ## Timing
//!
//! `dt` is the interval between calls on the injected [`TimeSource`],
//! floored at [`MIN_CONTROL_DT_S`]. The first call only sets the reference
//! point and integrates over the floor, however long the controller sat idle.

pub mod pid;

pub use pid::{AntiWindup, PidAxis, PidGains};

use crate::{
    constants::control::{
        ALTITUDE_GAINS, DERIVATIVE_FILTER_TAU_S, MIN_CONTROL_DT_S, PITCH_GAINS, ROLL_GAINS,
        THRUST_LIMITS, YAW_RATE_GAINS,
    },
    constants::guidance::{MAX_PITCH_DEG, MAX_ROLL_DEG, MAX_YAW_RATE_DEG_S},
    constants::PWM_HALF_SPAN,
    pwm::{symmetric_to_pwm, unit_to_pwm},
    state::{AxisOutputs, ControlCommand, GuidanceOutput, ThrustSetpoint, VehicleState},
    time::{DeltaTimer, TimeSource},
};

/// Controlled axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Roll angle
    Roll,
    /// Pitch angle
    Pitch,
    /// Yaw rate
    YawRate,
    /// Altitude (output is thrust)
    Altitude,
}

impl Axis {
    /// Every axis in processing order
    pub const ALL: [Axis; 4] = [Axis::Roll, Axis::Pitch, Axis::YawRate, Axis::Altitude];
}

/// Tuning of one loop
///
/// When deserialized, gains and output bounds are required; `pwm_span` and
/// `anti_windup` fall back to 500 µs and [`AntiWindup::None`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisConfig {
    /// PID gains
    pub gains: PidGains,
    /// Lower output bound
    pub output_min: f32,
    /// Upper output bound
    pub output_max: f32,
    /// PWM offset reached at `output_max` (µs); unused for altitude
    #[cfg_attr(feature = "serde", serde(default = "default_pwm_span"))]
    pub pwm_span: f32,
    /// Saturation policy
    #[cfg_attr(feature = "serde", serde(default))]
    pub anti_windup: AntiWindup,
}

#[cfg(feature = "serde")]
fn default_pwm_span() -> f32 {
    PWM_HALF_SPAN
}

impl AxisConfig {
    /// Loop with output in ±`limit`
    pub fn symmetric(gains: PidGains, limit: f32) -> Self {
        Self {
            gains,
            output_min: -limit,
            output_max: limit,
            pwm_span: PWM_HALF_SPAN,
            anti_windup: AntiWindup::None,
        }
    }

    /// Loop with output in [`min`, `max`]
    pub fn bounded(gains: PidGains, min: f32, max: f32) -> Self {
        Self {
            gains,
            output_min: min,
            output_max: max,
            pwm_span: PWM_HALF_SPAN,
            anti_windup: AntiWindup::None,
        }
    }

    /// Replace the gains
    pub fn with_gains(mut self, gains: PidGains) -> Self {
        self.gains = gains;
        self
    }

    /// Replace the saturation policy
    pub fn with_anti_windup(mut self, policy: AntiWindup) -> Self {
        self.anti_windup = policy;
        self
    }

    fn build(&self, derivative_tau: f32) -> PidAxis {
        PidAxis::new(self.gains, self.output_min, self.output_max, derivative_tau, self.anti_windup)
    }
}

/// Controller tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControllerConfig {
    /// Roll angle loop
    pub roll: AxisConfig,
    /// Pitch angle loop
    pub pitch: AxisConfig,
    /// Yaw rate loop
    pub yaw_rate: AxisConfig,
    /// Altitude loop
    pub altitude: AxisConfig,
    /// Derivative low-pass time constant (s)
    pub derivative_tau_s: f32,
    /// Interval floor (s)
    pub min_dt_s: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            roll: AxisConfig::symmetric(PidGains::from_tuple(ROLL_GAINS), MAX_ROLL_DEG),
            pitch: AxisConfig::symmetric(PidGains::from_tuple(PITCH_GAINS), MAX_PITCH_DEG),
            yaw_rate: AxisConfig::symmetric(PidGains::from_tuple(YAW_RATE_GAINS), MAX_YAW_RATE_DEG_S),
            altitude: AxisConfig::bounded(
                PidGains::from_tuple(ALTITUDE_GAINS),
                THRUST_LIMITS.0,
                THRUST_LIMITS.1,
            ),
            derivative_tau_s: DERIVATIVE_FILTER_TAU_S,
            min_dt_s: MIN_CONTROL_DT_S,
        }
    }
}

impl ControllerConfig {
    /// Loop configuration of `axis`
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::Roll => &self.roll,
            Axis::Pitch => &self.pitch,
            Axis::YawRate => &self.yaw_rate,
            Axis::Altitude => &self.altitude,
        }
    }

    /// Mutable loop configuration of `axis`
    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisConfig {
        match axis {
            Axis::Roll => &mut self.roll,
            Axis::Pitch => &mut self.pitch,
            Axis::YawRate => &mut self.yaw_rate,
            Axis::Altitude => &mut self.altitude,
        }
    }

    /// Replace the gains of one axis
    pub fn with_gains(mut self, axis: Axis, gains: PidGains) -> Self {
        self.axis_mut(axis).gains = gains;
        self
    }

    /// Apply one saturation policy to every axis
    pub fn with_anti_windup(mut self, policy: AntiWindup) -> Self {
        for axis in Axis::ALL {
            self.axis_mut(axis).anti_windup = policy;
        }
        self
    }
}

/// Four-loop attitude/altitude controller
#[derive(Debug)]
pub struct AttitudeAltitudeController<C: TimeSource> {
    config: ControllerConfig,
    clock: C,
    timer: DeltaTimer,
    roll: PidAxis,
    pitch: PidAxis,
    yaw_rate: PidAxis,
    altitude: PidAxis,
    outputs: AxisOutputs,
}

impl<C: TimeSource> AttitudeAltitudeController<C> {
    /// Controller with zeroed loop state; timing starts on the first call
    pub fn new(config: ControllerConfig, clock: C) -> Self {
        let tau = config.derivative_tau_s;
        Self {
            timer: DeltaTimer::new(),
            roll: config.roll.build(tau),
            pitch: config.pitch.build(tau),
            yaw_rate: config.yaw_rate.build(tau),
            altitude: config.altitude.build(tau),
            config,
            clock,
            outputs: AxisOutputs::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Loop state of `axis`
    pub fn axis(&self, axis: Axis) -> &PidAxis {
        match axis {
            Axis::Roll => &self.roll,
            Axis::Pitch => &self.pitch,
            Axis::YawRate => &self.yaw_rate,
            Axis::Altitude => &self.altitude,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut PidAxis {
        match axis {
            Axis::Roll => &mut self.roll,
            Axis::Pitch => &mut self.pitch,
            Axis::YawRate => &mut self.yaw_rate,
            Axis::Altitude => &mut self.altitude,
        }
    }

    /// Loop outputs of the most recent tick, before PWM conversion
    pub fn outputs(&self) -> AxisOutputs {
        self.outputs
    }

    /// Zero every loop
    pub fn reset(&mut self) {
        for axis in Axis::ALL {
            self.reset_axis(axis);
        }
    }

    /// Zero one loop
    pub fn reset_axis(&mut self, axis: Axis) {
        log_debug!("controller: reset {:?} loop", axis);
        self.axis_mut(axis).reset();
    }

    /// Run all loops once and convert to PWM
    pub fn process(&mut self, state: &VehicleState, guidance: &GuidanceOutput) -> ControlCommand {
        let dt = self.timer.lap(self.clock.now()).max(self.config.min_dt_s);

        let roll = self.roll.update(guidance.desired_roll - state.roll, dt);
        let pitch = self.pitch.update(guidance.desired_pitch - state.pitch, dt);
        let yaw_rate = self.yaw_rate.update(guidance.desired_yaw_rate - state.yaw_rate, dt);

        let thrust = match guidance.thrust {
            ThrustSetpoint::Throttle(throttle) => {
                let (min, max) = self.altitude.output_limits();
                throttle.max(min).min(max)
            }
            ThrustSetpoint::Altitude(target) => self.altitude.update(target - state.altitude, dt),
        };

        self.outputs = AxisOutputs { roll, pitch, yaw_rate, thrust };
        log_trace!(
            "control: dt={} roll={} pitch={} yaw_rate={} thrust={}",
            dt,
            roll,
            pitch,
            yaw_rate,
            thrust
        );

        let cfg = &self.config;
        ControlCommand {
            roll: symmetric_to_pwm(roll, cfg.roll.output_max, cfg.roll.pwm_span),
            pitch: symmetric_to_pwm(pitch, cfg.pitch.output_max, cfg.pitch.pwm_span),
            yaw: symmetric_to_pwm(yaw_rate, cfg.yaw_rate.output_max, cfg.yaw_rate.pwm_span),
            thrust: unit_to_pwm(thrust),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ModeTag;
    use crate::time::MockTimeSource;

    fn hover(altitude: f32) -> GuidanceOutput {
        GuidanceOutput {
            thrust: ThrustSetpoint::Altitude(altitude),
            mode: ModeTag::AltHold,
            ..GuidanceOutput::default()
        }
    }

    #[test]
    fn level_stabilize_is_neutral() {
        let clock = MockTimeSource::new(0);
        let mut controller = AttitudeAltitudeController::new(ControllerConfig::default(), &clock);
        clock.advance_ms(10);

        let guidance = GuidanceOutput {
            thrust: ThrustSetpoint::Throttle(0.5),
            ..GuidanceOutput::default()
        };
        let cmd = controller.process(&VehicleState::default(), &guidance);
        assert_eq!(cmd, ControlCommand { roll: 1500, pitch: 1500, yaw: 1500, thrust: 1500 });
    }

    #[test]
    fn stabilize_bypasses_altitude_loop() {
        let clock = MockTimeSource::new(0);
        let mut controller = AttitudeAltitudeController::new(ControllerConfig::default(), &clock);
        let state = VehicleState { altitude: 50.0, ..Default::default() };
        let guidance = GuidanceOutput {
            thrust: ThrustSetpoint::Throttle(0.3),
            ..GuidanceOutput::default()
        };

        for _ in 0..10 {
            clock.advance_ms(10);
            let cmd = controller.process(&state, &guidance);
            assert_eq!(cmd.thrust, 1300);
        }
        assert_eq!(controller.axis(Axis::Altitude).integral(), 0.0);
    }

    #[test]
    fn roll_error_tilts_command() {
        let clock = MockTimeSource::new(0);
        let mut controller = AttitudeAltitudeController::new(ControllerConfig::default(), &clock);
        clock.advance_ms(10);

        // Kp = 1: 15° error maps to half span
        let guidance = GuidanceOutput { desired_roll: 15.0, ..hover(0.0) };
        let cmd = controller.process(&VehicleState::default(), &guidance);
        assert_eq!(cmd.roll, 1750);
        assert_eq!(cmd.pitch, 1500);
    }

    #[test]
    fn outputs_saturate_in_pwm_range() {
        let clock = MockTimeSource::new(0);
        let mut controller = AttitudeAltitudeController::new(ControllerConfig::default(), &clock);
        clock.advance_ms(10);

        let guidance = GuidanceOutput { desired_roll: 90.0, desired_yaw_rate: -50.0, ..hover(100.0) };
        let cmd = controller.process(&VehicleState::default(), &guidance);
        assert_eq!(cmd.roll, 2000);
        assert_eq!(cmd.yaw, 1000);
        assert_eq!(cmd.thrust, 2000);
    }

    #[test]
    fn yaw_loop_closes_on_rate() {
        let clock = MockTimeSource::new(0);
        let mut controller = AttitudeAltitudeController::new(ControllerConfig::default(), &clock);
        clock.advance_ms(10);

        let state = VehicleState { yaw: 120.0, yaw_rate: 2.0, ..Default::default() };
        let guidance = GuidanceOutput { desired_yaw_rate: 2.0, ..hover(0.0) };
        let cmd = controller.process(&state, &guidance);
        assert_eq!(cmd.yaw, 1500);
    }

    #[test]
    fn altitude_integral_is_error_times_dt() {
        let clock = MockTimeSource::new(0);
        let mut controller = AttitudeAltitudeController::new(ControllerConfig::default(), &clock);
        let state = VehicleState { altitude: 9.0, ..Default::default() };

        controller.process(&state, &hover(10.0));
        for _ in 0..20 {
            clock.advance_ms(10);
            controller.process(&state, &hover(10.0));
        }
        // e = 1 m: one floor interval, then dt = 0.01 s, n = 20
        assert!((controller.axis(Axis::Altitude).integral() - 0.201).abs() < 1e-4);
        assert_eq!(controller.axis(Axis::Roll).integral(), 0.0);
    }

    #[test]
    fn idle_time_before_first_call_is_not_integrated() {
        let clock = MockTimeSource::new(0);
        let mut controller = AttitudeAltitudeController::new(ControllerConfig::default(), &clock);
        let state = VehicleState { altitude: 9.0, ..Default::default() };

        clock.advance_ms(60_000);
        controller.process(&state, &hover(10.0));
        assert!((controller.axis(Axis::Altitude).integral() - MIN_CONTROL_DT_S).abs() < 1e-6);

        clock.advance_ms(20);
        controller.process(&state, &hover(10.0));
        assert!((controller.axis(Axis::Altitude).integral() - (MIN_CONTROL_DT_S + 0.02)).abs() < 1e-6);
    }

    #[test]
    fn same_timestamp_uses_interval_floor() {
        let clock = MockTimeSource::new(0);
        let config = ControllerConfig::default().with_gains(Axis::Roll, PidGains::new(0.0, 1.0, 0.0));
        let mut controller = AttitudeAltitudeController::new(config, &clock);

        let guidance = GuidanceOutput { desired_roll: 10.0, ..hover(0.0) };
        controller.process(&VehicleState::default(), &guidance);
        assert!((controller.axis(Axis::Roll).integral() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn reset_axis_only_touches_that_axis() {
        let clock = MockTimeSource::new(0);
        let mut controller = AttitudeAltitudeController::new(
            ControllerConfig::default().with_gains(Axis::Pitch, PidGains::new(1.0, 1.0, 0.0)),
            &clock,
        );
        let state = VehicleState { altitude: 1.0, ..Default::default() };
        let guidance = GuidanceOutput { desired_pitch: 5.0, ..hover(2.0) };
        clock.advance_ms(10);
        controller.process(&state, &guidance);

        controller.reset_axis(Axis::Pitch);
        assert_eq!(controller.axis(Axis::Pitch).integral(), 0.0);
        assert!(controller.axis(Axis::Altitude).integral() > 0.0);

        controller.reset();
        assert_eq!(controller.axis(Axis::Altitude).integral(), 0.0);
    }
}
