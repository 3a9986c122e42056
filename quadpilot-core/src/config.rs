//! Flight Configuration
//!
//! One [`FlightConfig`] carries the tuning of every pipeline stage. Defaults
//! come from [`crate::constants`]; override individual values with the
//! `with_*` builders or, with `std`, from a JSON document in which every
//! field is optional:
//!
//! ```rust
//! # #[cfg(feature = "std")] {
//! use quadpilot_core::config::FlightConfig;
//!
//! let config = FlightConfig::from_json(r#"{
//!     "guidance": { "rtl_altitude_m": 25.0 },
//!     "reset_controller_on_mode_change": true
//! }"#).unwrap();
//! assert_eq!(config.guidance.rtl_altitude_m, 25.0);
//! assert_eq!(config.guidance.max_roll_deg, 30.0);
//! # }
//! ```
//!
//! [`FlightConfig::validate`] is run by `from_json` and by the pipeline
//! constructor's callers that build configs by hand.

use crate::control::{Axis, AxisConfig, ControllerConfig};
use crate::errors::ConfigError;
use crate::fusion::FusionConfig;
use crate::guidance::{GuidanceConfig, ModeSwitchConfig};
use crate::mixer::MixerConfig;

/// Result type for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FlightConfig {
    /// Sensor fusion
    pub fusion: FusionConfig,
    /// Flight-mode guidance
    pub guidance: GuidanceConfig,
    /// PID control
    pub control: ControllerConfig,
    /// Motor mixing
    pub mixer: MixerConfig,
    /// RC mode-channel decoding
    pub mode_switch: ModeSwitchConfig,
    /// Zero the controller whenever the active mode changes
    pub reset_controller_on_mode_change: bool,
}

impl FlightConfig {
    /// Replace the fusion configuration
    pub fn with_fusion(mut self, fusion: FusionConfig) -> Self {
        self.fusion = fusion;
        self
    }

    /// Replace the guidance configuration
    pub fn with_guidance(mut self, guidance: GuidanceConfig) -> Self {
        self.guidance = guidance;
        self
    }

    /// Replace the controller configuration
    pub fn with_control(mut self, control: ControllerConfig) -> Self {
        self.control = control;
        self
    }

    /// Replace the mixer configuration
    pub fn with_mixer(mut self, mixer: MixerConfig) -> Self {
        self.mixer = mixer;
        self
    }

    /// Replace the mode-switch layout
    pub fn with_mode_switch(mut self, mode_switch: ModeSwitchConfig) -> Self {
        self.mode_switch = mode_switch;
        self
    }

    /// Reset controller state on every mode change
    pub fn with_controller_reset_on_mode_change(mut self, enabled: bool) -> Self {
        self.reset_controller_on_mode_change = enabled;
        self
    }

    /// Parse a (partial) JSON document and validate the result
    #[cfg(feature = "std")]
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            line: e.line(),
            column: e.column(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot fly with
    pub fn validate(&self) -> ConfigResult<()> {
        self.validate_fusion()?;
        self.validate_guidance()?;
        self.validate_control()?;
        self.validate_mixer()?;
        self.validate_mode_switch()
    }

    fn validate_fusion(&self) -> ConfigResult<()> {
        let f = &self.fusion;
        unit_interval(f.attitude_alpha, "fusion.attitude_alpha")?;
        unit_interval(f.altitude_alpha, "fusion.altitude_alpha")?;
        positive(f.gyro_dt_s, "fusion.gyro_dt_s")?;
        positive(f.sea_level_pressure_pa, "fusion.sea_level_pressure_pa")?;
        positive(f.accel_scale, "fusion.accel_scale")?;
        positive(f.gyro_scale, "fusion.gyro_scale")?;
        finite(f.imu_mount_offset_deg, "fusion.imu_mount_offset_deg")?;
        finite(f.mag_mount_offset_deg, "fusion.mag_mount_offset_deg")
    }

    fn validate_guidance(&self) -> ConfigResult<()> {
        let g = &self.guidance;
        positive(g.max_roll_deg, "guidance.max_roll_deg")?;
        positive(g.max_pitch_deg, "guidance.max_pitch_deg")?;
        positive(g.max_yaw_rate_deg_s, "guidance.max_yaw_rate_deg_s")?;
        positive(g.max_climb_rate_m_s, "guidance.max_climb_rate_m_s")?;
        positive(g.max_descent_rate_m_s, "guidance.max_descent_rate_m_s")?;
        positive(g.land_descent_rate_m_s, "guidance.land_descent_rate_m_s")?;
        positive(g.takeoff_climb_rate_m_s, "guidance.takeoff_climb_rate_m_s")?;
        positive(g.goto_vertical_rate_m_s, "guidance.goto_vertical_rate_m_s")?;
        non_negative(g.position_kp, "guidance.position_kp")?;
        positive(g.rtl_tolerance_m, "guidance.rtl_tolerance_m")?;
        finite(g.rtl_altitude_m, "guidance.rtl_altitude_m")?;
        positive(g.goto_arrival_radius_m, "guidance.goto_arrival_radius_m")?;
        positive(g.goto_altitude_tolerance_m, "guidance.goto_altitude_tolerance_m")?;
        positive(g.default_takeoff_altitude_m, "guidance.default_takeoff_altitude_m")?;
        if g.home_fix_count == 0 {
            return Err(invalid("guidance.home_fix_count", "must be at least 1"));
        }
        Ok(())
    }

    fn validate_control(&self) -> ConfigResult<()> {
        let c = &self.control;
        non_negative(c.derivative_tau_s, "control.derivative_tau_s")?;
        positive(c.min_dt_s, "control.min_dt_s")?;

        for axis in Axis::ALL {
            validate_axis(c.axis(axis), axis)?;
        }

        let alt = &c.altitude;
        if alt.output_min < 0.0 || alt.output_max > 1.0 {
            return Err(invalid("control.altitude", "thrust limits must lie within [0, 1]"));
        }
        Ok(())
    }

    fn validate_mixer(&self) -> ConfigResult<()> {
        let m = &self.mixer;
        non_negative(m.roll_scale, "mixer.roll_scale")?;
        non_negative(m.pitch_scale, "mixer.pitch_scale")?;
        non_negative(m.yaw_scale, "mixer.yaw_scale")
    }

    fn validate_mode_switch(&self) -> ConfigResult<()> {
        let s = &self.mode_switch;
        if s.low_max_pwm >= s.high_min_pwm {
            return Err(invalid("mode_switch", "low band must end below the high band"));
        }
        Ok(())
    }
}

fn validate_axis(cfg: &AxisConfig, axis: Axis) -> ConfigResult<()> {
    let field = match axis {
        Axis::Roll => "control.roll",
        Axis::Pitch => "control.pitch",
        Axis::YawRate => "control.yaw_rate",
        Axis::Altitude => "control.altitude",
    };
    if !cfg.gains.is_finite() {
        return Err(invalid(field, "gains must be finite"));
    }
    if !(cfg.output_min.is_finite() && cfg.output_max.is_finite() && cfg.output_min < cfg.output_max) {
        return Err(invalid(field, "output range must be finite and non-empty"));
    }
    if !(cfg.pwm_span > 0.0 && cfg.pwm_span <= crate::constants::PWM_HALF_SPAN) {
        return Err(invalid(field, "pwm span must lie in (0, 500]"));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn finite(value: f32, field: &'static str) -> ConfigResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, "must be finite"))
    }
}

fn positive(value: f32, field: &'static str) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be positive"))
    }
}

fn non_negative(value: f32, field: &'static str) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be non-negative"))
    }
}

fn unit_interval(value: f32, field: &'static str) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, "must lie in [0, 1]"))
    }
}
