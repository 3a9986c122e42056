//! Mode Selection
//!
//! Two inputs decide the mode guidance runs each tick:
//!
//! 1. The requested mode, either explicit (ground station) or decoded from
//!    the RC mode channels by [`ModeSwitch`]
//! 2. The failsafe flags, which override any request via [`select_mode`]
//!
//! ## RC mode channels
//!
//! ```text
//! primary   1000 ──────── 1500 ──────── 2000
//!            (no override)  │  override mode (RTL)
//!
//! secondary 1000 ─── 1300 ─── 1700 ─── 2000
//!             Stabilize  AltHold   PosHold
//! ```

use crate::constants::guidance::{
    MODE_BAND_HIGH_MIN_PWM, MODE_BAND_LOW_MAX_PWM, MODE_OVERRIDE_THRESHOLD_PWM,
};
use crate::state::{FlightMode, RcInput};

/// Apply failsafe precedence to a requested mode
///
/// Battery failsafe forces [`FlightMode::Land`]; otherwise radio failsafe
/// forces [`FlightMode::Rtl`]; otherwise the request stands.
pub fn select_mode(requested: FlightMode, rc_failsafe: bool, battery_failsafe: bool) -> FlightMode {
    if battery_failsafe {
        FlightMode::Land
    } else if rc_failsafe {
        FlightMode::Rtl
    } else {
        requested
    }
}

/// Band edges and mode assignment of the RC mode channels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModeSwitchConfig {
    /// Primary channel value at or above which `override_mode` engages
    pub override_threshold_pwm: u16,
    /// Mode forced by the primary channel
    pub override_mode: FlightMode,
    /// Secondary channel values at or below this select `low`
    pub low_max_pwm: u16,
    /// Secondary channel values at or above this select `high`
    pub high_min_pwm: u16,
    /// Mode of the low band
    pub low: FlightMode,
    /// Mode of the middle band
    pub middle: FlightMode,
    /// Mode of the high band
    pub high: FlightMode,
}

impl Default for ModeSwitchConfig {
    fn default() -> Self {
        Self {
            override_threshold_pwm: MODE_OVERRIDE_THRESHOLD_PWM,
            override_mode: FlightMode::Rtl,
            low_max_pwm: MODE_BAND_LOW_MAX_PWM,
            high_min_pwm: MODE_BAND_HIGH_MIN_PWM,
            low: FlightMode::Stabilize,
            middle: FlightMode::AltHold,
            high: FlightMode::PosHold,
        }
    }
}

impl ModeSwitchConfig {
    /// Assign the three secondary-channel bands
    pub fn with_bands(mut self, low: FlightMode, middle: FlightMode, high: FlightMode) -> Self {
        self.low = low;
        self.middle = middle;
        self.high = high;
        self
    }

    /// Mode forced by the primary channel
    pub fn with_override(mut self, mode: FlightMode) -> Self {
        self.override_mode = mode;
        self
    }
}

/// Decodes the RC mode channels into a requested mode
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeSwitch {
    config: ModeSwitchConfig,
}

impl ModeSwitch {
    /// Decoder with the given band layout
    pub fn new(config: ModeSwitchConfig) -> Self {
        Self { config }
    }

    /// Band layout
    pub fn config(&self) -> &ModeSwitchConfig {
        &self.config
    }

    /// Mode requested by the switch positions in `rc`
    pub fn decode(&self, rc: &RcInput) -> FlightMode {
        let cfg = &self.config;
        if rc.mode_primary >= cfg.override_threshold_pwm {
            return cfg.override_mode;
        }
        match rc.mode_secondary {
            pwm if pwm <= cfg.low_max_pwm => cfg.low,
            pwm if pwm >= cfg.high_min_pwm => cfg.high,
            _ => cfg.middle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn switches(primary: u16, secondary: u16) -> RcInput {
        RcInput { mode_primary: primary, mode_secondary: secondary, ..RcInput::default() }
    }

    #[test]
    fn battery_beats_radio_beats_request() {
        let requested = FlightMode::PosHold;
        assert_eq!(select_mode(requested, true, true), FlightMode::Land);
        assert_eq!(select_mode(requested, true, false), FlightMode::Rtl);
        assert_eq!(select_mode(requested, false, false), requested);
    }

    #[test]
    fn secondary_channel_bands() {
        let switch = ModeSwitch::default();
        assert_eq!(switch.decode(&switches(1000, 1000)), FlightMode::Stabilize);
        assert_eq!(switch.decode(&switches(1000, 1300)), FlightMode::Stabilize);
        assert_eq!(switch.decode(&switches(1000, 1500)), FlightMode::AltHold);
        assert_eq!(switch.decode(&switches(1000, 1700)), FlightMode::PosHold);
    }

    #[test]
    fn primary_channel_overrides() {
        let switch = ModeSwitch::default();
        assert_eq!(switch.decode(&switches(1500, 1000)), FlightMode::Rtl);

        let land = ModeSwitch::new(ModeSwitchConfig::default().with_override(FlightMode::Land));
        assert_eq!(land.decode(&switches(1900, 1800)), FlightMode::Land);
    }
}
