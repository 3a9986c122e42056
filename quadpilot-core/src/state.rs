//! Plain data exchanged between pipeline stages
//!
//! ```text
//! SensorBatch → VehicleState → GuidanceOutput → ControlCommand → MotorCommand
//!                    ↑               ↑
//!                 RcInput, FlightMode, failsafe flags
//! ```
//!
//! All types are `Copy` snapshots. A stage never holds a reference into
//! another stage's state across ticks.

use core::fmt;

use crate::constants::{PWM_CENTER, PWM_MAX, PWM_MIN};
use crate::errors::{PipelineError, PipelineResult};
use crate::pwm::clamp_channel;

/// A point on the ground in geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    /// Latitude (degrees)
    pub latitude: f64,
    /// Longitude (degrees)
    pub longitude: f64,
}

impl GeoPoint {
    /// Point at the given coordinates
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Fused vehicle estimate for one tick
///
/// Produced by [`SensorFusion`](crate::fusion::SensorFusion) once per tick and
/// read-only downstream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleState {
    /// Latitude of the averaged GPS fix (degrees)
    pub latitude: f64,
    /// Longitude of the averaged GPS fix (degrees)
    pub longitude: f64,
    /// Fused barometric/GPS altitude (m)
    pub altitude: f32,
    /// Roll angle (degrees, right wing down positive)
    pub roll: f32,
    /// Pitch angle (degrees)
    pub pitch: f32,
    /// Heading (degrees, (-180, 180])
    pub yaw: f32,
    /// Body yaw rate from the gyro (degrees/second)
    pub yaw_rate: f32,
}

impl VehicleState {
    /// Horizontal position of the vehicle
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// One frame of RC receiver input, PWM µs per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RcInput {
    /// Roll stick
    pub roll: u16,
    /// Pitch stick
    pub pitch: u16,
    /// Yaw stick
    pub yaw: u16,
    /// Throttle stick
    pub throttle: u16,
    /// Primary mode switch (override: RTL / Land)
    pub mode_primary: u16,
    /// Secondary mode switch (three-position flight mode)
    pub mode_secondary: u16,
}

impl Default for RcInput {
    /// Sticks centered, throttle at minimum, mode switches low
    fn default() -> Self {
        Self {
            roll: PWM_CENTER,
            pitch: PWM_CENTER,
            yaw: PWM_CENTER,
            throttle: PWM_MIN,
            mode_primary: PWM_MIN,
            mode_secondary: PWM_MIN,
        }
    }
}

impl RcInput {
    /// Sticks centered at the given throttle, mode switches low
    pub fn centered(throttle: u16) -> Self {
        Self { throttle, ..Self::default() }
    }

    /// Copy with every channel clamped into [1000, 2000]
    pub fn clamped(&self) -> Self {
        Self {
            roll: clamp_channel(self.roll),
            pitch: clamp_channel(self.pitch),
            yaw: clamp_channel(self.yaw),
            throttle: clamp_channel(self.throttle),
            mode_primary: clamp_channel(self.mode_primary),
            mode_secondary: clamp_channel(self.mode_secondary),
        }
    }

    /// Strict range check for adapters that want to reject bad frames
    ///
    /// The pipeline itself never calls this; it clamps instead.
    pub fn validate(&self) -> PipelineResult<()> {
        let channels = [
            self.roll,
            self.pitch,
            self.yaw,
            self.throttle,
            self.mode_primary,
            self.mode_secondary,
        ];
        match channels.iter().find(|&&c| !(PWM_MIN..=PWM_MAX).contains(&c)) {
            Some(&value) => Err(PipelineError::OutOfRangeCommand {
                value: value as f32,
                min: PWM_MIN as f32,
                max: PWM_MAX as f32,
            }),
            None => Ok(()),
        }
    }
}

/// Waypoint of a guided goto command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GuidedTarget {
    /// Latitude (degrees)
    pub latitude: f64,
    /// Longitude (degrees)
    pub longitude: f64,
    /// Altitude (m, same datum as the fused altitude)
    pub altitude: f32,
}

/// Sub-command of guided mode
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GuidedCommand {
    /// Climb to `altitude`, then hold it
    Takeoff {
        /// Target altitude (m)
        altitude: f32,
    },
    /// Fly to a waypoint, then hold altitude
    Goto(GuidedTarget),
    /// Land in place
    Land,
    /// Return to launch
    Rtl,
}

/// Flight mode requested by the pilot or a ground station
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlightMode {
    /// Self-leveling, manual throttle
    #[default]
    Stabilize,
    /// Stabilize with throttle commanding climb rate
    AltHold,
    /// AltHold plus GPS position hold while sticks are centered
    PosHold,
    /// Autonomous sub-command
    Guided(GuidedCommand),
    /// Descend in place
    Land,
    /// Return to launch, then land
    Rtl,
}

impl FlightMode {
    /// Telemetry tag of the mode
    pub fn tag(&self) -> ModeTag {
        match self {
            Self::Stabilize => ModeTag::Stabilize,
            Self::AltHold => ModeTag::AltHold,
            Self::PosHold => ModeTag::PosHold,
            Self::Guided(GuidedCommand::Rtl) => ModeTag::Rtl,
            Self::Guided(_) => ModeTag::Guided,
            Self::Land => ModeTag::Land,
            Self::Rtl => ModeTag::Rtl,
        }
    }
}

/// Name of the mode that produced a guidance output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModeTag {
    /// Stabilize
    #[default]
    Stabilize,
    /// Altitude hold
    AltHold,
    /// Position hold
    PosHold,
    /// Guided
    Guided,
    /// Land
    Land,
    /// Return to launch
    Rtl,
}

impl ModeTag {
    /// Telemetry string ("Stabilize", "AltHold", "PosHold", "Guided", "Land", "RTL")
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stabilize => "Stabilize",
            Self::AltHold => "AltHold",
            Self::PosHold => "PosHold",
            Self::Guided => "Guided",
            Self::Land => "Land",
            Self::Rtl => "RTL",
        }
    }
}

impl fmt::Display for ModeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ModeTag {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.as_str())
    }
}

/// Vertical setpoint carried by a guidance output
///
/// Stabilize hands the pilot's throttle straight to the motors; every other
/// mode asks the altitude loop for a target height.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThrustSetpoint {
    /// Normalized thrust in [0, 1], bypasses the altitude loop
    Throttle(f32),
    /// Target altitude (m), closed by the altitude PID
    Altitude(f32),
}

impl ThrustSetpoint {
    /// Raw value regardless of interpretation
    pub fn value(&self) -> f32 {
        match *self {
            Self::Throttle(t) | Self::Altitude(t) => t,
        }
    }
}

impl Default for ThrustSetpoint {
    fn default() -> Self {
        Self::Throttle(0.0)
    }
}

/// Setpoints produced by guidance for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GuidanceOutput {
    /// Desired roll (degrees)
    pub desired_roll: f32,
    /// Desired pitch (degrees)
    pub desired_pitch: f32,
    /// Desired yaw rate (degrees/second)
    pub desired_yaw_rate: f32,
    /// Thrust or target altitude
    pub thrust: ThrustSetpoint,
    /// Mode that produced this output
    pub mode: ModeTag,
}

impl GuidanceOutput {
    /// Zero attitude, zero thrust
    pub const fn failsafe(mode: ModeTag) -> Self {
        Self {
            desired_roll: 0.0,
            desired_pitch: 0.0,
            desired_yaw_rate: 0.0,
            thrust: ThrustSetpoint::Throttle(0.0),
            mode,
        }
    }

    /// Thrust (Stabilize) or target altitude (all other modes)
    pub fn desired_thrust_or_altitude(&self) -> f32 {
        self.thrust.value()
    }
}

/// Controller outputs before conversion to PWM
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisOutputs {
    /// Roll loop output (degrees)
    pub roll: f32,
    /// Pitch loop output (degrees)
    pub pitch: f32,
    /// Yaw-rate loop output (degrees/second)
    pub yaw_rate: f32,
    /// Normalized thrust [0, 1]
    pub thrust: f32,
}

/// Per-axis commands in the PWM domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlCommand {
    /// Roll command, centered at 1500
    pub roll: u16,
    /// Pitch command, centered at 1500
    pub pitch: u16,
    /// Yaw command, centered at 1500
    pub yaw: u16,
    /// Thrust command, 1000 = none
    pub thrust: u16,
}

impl ControlCommand {
    /// Neutral attitude commands at zero thrust
    pub const NEUTRAL: Self = Self {
        roll: PWM_CENTER,
        pitch: PWM_CENTER,
        yaw: PWM_CENTER,
        thrust: PWM_MIN,
    };

    /// Signed (roll, pitch, yaw) offsets from center plus thrust, as fed to the mixer
    pub fn mixer_inputs(&self) -> (f32, f32, f32, f32) {
        let center = PWM_CENTER as f32;
        (
            self.roll as f32 - center,
            self.pitch as f32 - center,
            self.yaw as f32 - center,
            self.thrust as f32,
        )
    }
}

impl Default for ControlCommand {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Four motor pulses for an X quadrotor
///
/// M1 front-left, M2 front-right, M3 rear-right, M4 rear-left.
/// Every value lies in [1000, 2000].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorCommand {
    /// Front-left
    pub m1: u16,
    /// Front-right
    pub m2: u16,
    /// Rear-right
    pub m3: u16,
    /// Rear-left
    pub m4: u16,
}

impl MotorCommand {
    /// All motors at minimum pulse
    pub const IDLE: Self = Self {
        m1: PWM_MIN,
        m2: PWM_MIN,
        m3: PWM_MIN,
        m4: PWM_MIN,
    };

    /// Outputs in M1..M4 order
    pub const fn as_array(&self) -> [u16; 4] {
        [self.m1, self.m2, self.m3, self.m4]
    }
}

impl Default for MotorCommand {
    fn default() -> Self {
        Self::IDLE
    }
}
