//! X-Quadrotor Motor Mixing
//!
//! ## Airframe
//!
//! ```text
//!        front
//!   M1 (CW)   M2 (CCW)
//!        ╲   ╱
//!         ╲ ╱
//!          ╳
//!         ╱ ╲
//!        ╱   ╲
//!   M4 (CCW)  M3 (CW)
//!        rear
//! ```
//!
//! ## Sign table
//!
//! ```text
//! M1 = T - P + R + Y
//! M2 = T - P - R - Y
//! M3 = T + P - R + Y
//! M4 = T + P + R - Y
//! ```
//!
//! `T` is the thrust pulse (1000 to 2000); `R`, `P`, `Y` are signed offsets
//! from the 1500 center of the roll/pitch/yaw commands. Every output is
//! clamped to [1000, 2000].
//!
//! This table is the one place the crate encodes motor positions and spin
//! directions. Confirm it against the airframe wiring before flight.

use crate::constants::PWM_MIN;
use crate::pwm::clamp_pwm;
use crate::state::{ControlCommand, MotorCommand};

/// Per-axis authority applied before the sign table
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MixerConfig {
    /// Roll offset scale
    pub roll_scale: f32,
    /// Pitch offset scale
    pub pitch_scale: f32,
    /// Yaw offset scale
    pub yaw_scale: f32,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self { roll_scale: 1.0, pitch_scale: 1.0, yaw_scale: 1.0 }
    }
}

impl MixerConfig {
    /// Set all three scales
    pub fn with_scales(mut self, roll: f32, pitch: f32, yaw: f32) -> Self {
        self.roll_scale = roll;
        self.pitch_scale = pitch;
        self.yaw_scale = yaw;
        self
    }
}

/// Maps control commands onto four motor pulses
#[derive(Debug, Clone, Copy, Default)]
pub struct MotorMixer {
    config: MixerConfig,
}

impl MotorMixer {
    /// Mixer with the given authority scales
    pub fn new(config: MixerConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    /// Mix signed roll/pitch/yaw offsets with a thrust pulse
    pub fn mix(&self, roll: f32, pitch: f32, yaw: f32, thrust: f32) -> MotorCommand {
        let r = roll * self.config.roll_scale;
        let p = pitch * self.config.pitch_scale;
        let y = yaw * self.config.yaw_scale;
        let t = if thrust.is_finite() { thrust } else { PWM_MIN as f32 };

        MotorCommand {
            m1: clamp_pwm(t - p + r + y),
            m2: clamp_pwm(t - p - r - y),
            m3: clamp_pwm(t + p - r + y),
            m4: clamp_pwm(t + p + r - y),
        }
    }

    /// Mix a controller command
    pub fn mix_command(&self, command: &ControlCommand) -> MotorCommand {
        let (roll, pitch, yaw, thrust) = command.mixer_inputs();
        self.mix(roll, pitch, yaw, thrust)
    }
}
