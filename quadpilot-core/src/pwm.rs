//! PWM Domain Helpers
//!
//! RC channels and motor outputs share one domain: pulse widths in
//! microseconds within [1000, 2000], 1500 being neutral.
//!
//! ```text
//! 1000 ────────── 1500 ────────── 2000
//! -max            0               +max     (stick → angle / rate)
//! 0.0             0.5             1.0      (throttle → thrust)
//! ```

use crate::constants::{PWM_CENTER, PWM_HALF_SPAN, PWM_MAX, PWM_MIN};

/// Clamp a PWM-domain value into [1000, 2000] and round to whole microseconds
///
/// Non-finite values map to the minimum pulse.
pub fn clamp_pwm(value: f32) -> u16 {
    if !value.is_finite() {
        return PWM_MIN;
    }
    let clamped = value.clamp(PWM_MIN as f32, PWM_MAX as f32);
    libm::roundf(clamped) as u16
}

/// Clamp a raw channel value into [1000, 2000]
pub fn clamp_channel(value: u16) -> u16 {
    value.clamp(PWM_MIN, PWM_MAX)
}

/// Signed stick deflection from center, in [-1, 1]
pub fn stick_deflection(pwm: u16) -> f32 {
    (clamp_channel(pwm) as f32 - PWM_CENTER as f32) / PWM_HALF_SPAN
}

/// Linear map of a centered stick onto ±`max` (angles, rates)
///
/// 1500 → 0, 2000 → +max, 1000 → -max.
pub fn stick_to_symmetric(pwm: u16, max: f32) -> f32 {
    stick_deflection(pwm) * max
}

/// Linear map of a throttle channel onto [0, 1]
pub fn throttle_to_unit(pwm: u16) -> f32 {
    ((clamp_channel(pwm) - PWM_MIN) as f32 / (PWM_MAX - PWM_MIN) as f32).clamp(0.0, 1.0)
}

/// Map a symmetric controller output onto a PWM pulse centered at 1500
///
/// `limit` is the output magnitude that reaches the end of the span.
/// Anything non-finite yields the neutral 1500.
pub fn symmetric_to_pwm(value: f32, limit: f32, span: f32) -> u16 {
    let pwm = PWM_CENTER as f32 + value / limit * span;
    if !(limit.is_finite() && limit > 0.0) || !value.is_finite() || !pwm.is_finite() {
        return PWM_CENTER;
    }
    clamp_pwm(pwm)
}

/// Map a normalized thrust in [0, 1] onto [1000, 2000]
pub fn unit_to_pwm(value: f32) -> u16 {
    clamp_pwm(PWM_MIN as f32 + value * (PWM_MAX - PWM_MIN) as f32)
}
