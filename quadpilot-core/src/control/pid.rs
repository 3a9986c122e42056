//! Single-Axis PID with Filtered Derivative
//!
//! ```text
//! integral   += e·dt                         (only when Ki ≠ 0)
//! d_raw       = (e - e_prev) / dt            (0 on the first update)
//! d_filtered += dt/(τ+dt) · (d_raw - d_filtered)
//! u           = clamp(Kp·e + Ki·integral + Kd·d_filtered, min, max)
//! ```
//!
//! The one-pole low-pass on the derivative keeps sensor noise from being
//! amplified by `1/dt`. State is never reset implicitly; callers decide when
//! via [`PidAxis::reset`].
//!
//! ## Anti-windup
//!
//! Saturation is handled by an explicit [`AntiWindup`] policy. The default
//! is [`AntiWindup::None`], matching a plain PID.

use crate::constants::control::MIN_CONTROL_DT_S;

/// Proportional, integral and derivative gains
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidGains {
    /// Proportional gain
    pub kp: f32,
    /// Integral gain
    pub ki: f32,
    /// Derivative gain
    pub kd: f32,
}

impl PidGains {
    /// Gains from their three components
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }

    /// Gains from a `(Kp, Ki, Kd)` triple
    pub const fn from_tuple(gains: (f32, f32, f32)) -> Self {
        Self::new(gains.0, gains.1, gains.2)
    }

    /// All three gains are finite
    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

/// What the integrator does while the output saturates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AntiWindup {
    /// Integrate without bound
    #[default]
    None,
    /// Keep the integral within ±`limit`
    Clamp {
        /// Integral magnitude bound (error·seconds)
        limit: f32,
    },
    /// Bleed the integral by `gain·(saturated - unsaturated)·dt`
    BackCalculation {
        /// Tracking gain
        gain: f32,
    },
}

/// One PID loop and its persistent state
#[derive(Debug, Clone)]
pub struct PidAxis {
    gains: PidGains,
    output_min: f32,
    output_max: f32,
    derivative_tau: f32,
    anti_windup: AntiWindup,
    integral: f32,
    derivative: f32,
    prev_error: Option<f32>,
    last_output: f32,
}

impl PidAxis {
    /// Loop with zeroed state
    ///
    /// `output_min`/`output_max` bound every output and are swapped if given
    /// in the wrong order; `derivative_tau` is the low-pass time constant in
    /// seconds (zero disables filtering).
    pub fn new(
        gains: PidGains,
        output_min: f32,
        output_max: f32,
        derivative_tau: f32,
        anti_windup: AntiWindup,
    ) -> Self {
        let (output_min, output_max) = if output_min <= output_max {
            (output_min, output_max)
        } else {
            (output_max, output_min)
        };
        Self {
            gains,
            output_min,
            output_max,
            derivative_tau: derivative_tau.max(0.0),
            anti_windup,
            integral: 0.0,
            derivative: 0.0,
            prev_error: None,
            last_output: 0.0,
        }
    }

    /// Advance the loop by one interval and return the clamped output
    ///
    /// A non-finite error leaves the state untouched and repeats the
    /// previous output.
    pub fn update(&mut self, error: f32, dt: f32) -> f32 {
        if !error.is_finite() {
            return self.last_output;
        }
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { MIN_CONTROL_DT_S };
        let PidGains { kp, ki, kd } = self.gains;

        if ki != 0.0 {
            self.integral += error * dt;
            if let AntiWindup::Clamp { limit } = self.anti_windup {
                let limit = libm::fabsf(limit);
                self.integral = self.integral.max(-limit).min(limit);
            }
        }

        let raw = match self.prev_error {
            Some(prev) => (error - prev) / dt,
            None => 0.0,
        };
        let smoothing = dt / (self.derivative_tau + dt);
        self.derivative += smoothing * (raw - self.derivative);
        self.prev_error = Some(error);

        let unsaturated = kp * error + ki * self.integral + kd * self.derivative;
        let output = unsaturated.max(self.output_min).min(self.output_max);

        if let AntiWindup::BackCalculation { gain } = self.anti_windup {
            if ki != 0.0 {
                self.integral += gain * (output - unsaturated) * dt;
            }
        }

        self.last_output = output;
        output
    }

    /// Accumulated `∫e·dt`
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Low-pass filtered derivative
    pub fn derivative(&self) -> f32 {
        self.derivative
    }

    /// Most recent output
    pub fn last_output(&self) -> f32 {
        self.last_output
    }

    /// Active gains
    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Retune without touching the accumulated state
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    /// Output bounds
    pub fn output_limits(&self) -> (f32, f32) {
        (self.output_min, self.output_max)
    }

    /// Zero integral, derivative and error history
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.derivative = 0.0;
        self.prev_error = None;
        self.last_output = 0.0;
    }
}
