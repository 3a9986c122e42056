//! Complementary Filter
//!
//! Blends a low-noise but drifting estimate with a noisy but unbiased one:
//!
//! ```text
//! fused = α·smooth + (1-α)·reference
//! ```
//!
//! For attitude, `smooth` is the previous estimate propagated by the gyro and
//! `reference` comes from the accelerometer/magnetometer. For altitude,
//! `smooth` is the barometer and `reference` the GPS.
//!
//! Headings wrap at ±180°, so [`ComplementaryFilter::blend_angle`] blends on
//! the shortest arc instead of averaging raw angles.

use super::geometry::wrap_pi;

/// Fixed-weight complementary filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplementaryFilter {
    alpha: f32,
}

impl ComplementaryFilter {
    /// Filter with weight `alpha` on the smooth estimate, clamped into [0, 1]
    pub fn new(alpha: f32) -> Self {
        Self { alpha: alpha.clamp(0.0, 1.0) }
    }

    /// Weight of the smooth estimate
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Linear blend
    pub fn blend(&self, smooth: f32, reference: f32) -> f32 {
        self.alpha * smooth + (1.0 - self.alpha) * reference
    }

    /// Blend two angles (radians) along the shortest arc, result in (-π, π]
    ///
    /// Equal to [`blend`](Self::blend) whenever the two angles are less than
    /// π apart and neither wraps.
    pub fn blend_angle(&self, smooth: f32, reference: f32) -> f32 {
        let error = wrap_pi(reference - smooth);
        wrap_pi(smooth + (1.0 - self.alpha) * error)
    }
}
