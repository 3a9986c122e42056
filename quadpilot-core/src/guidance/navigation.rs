//! Local Navigation Geometry
//!
//! Short-range position errors use a flat-earth approximation around the
//! vehicle: one degree of latitude is [`METERS_PER_DEGREE`] meters and a
//! degree of longitude shrinks with `cos(latitude)`.
//!
//! ```text
//!              north
//!                ↑   target
//!                │  ╱
//!                │ ╱ offset
//!                │╱
//!   vehicle ─────┼────→ east
//!
//! forward =  cos(ψ)·north + sin(ψ)·east
//! right   = -sin(ψ)·north + cos(ψ)·east
//! ```
//!
//! Position hold, guided goto and RTL all steer with
//! [`attitude_toward`]: pitch forward toward targets ahead, roll right toward
//! targets on the right.

use crate::constants::METERS_PER_DEGREE;
use crate::state::GeoPoint;

/// Horizontal offset from the vehicle to a target, earth frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalOffset {
    /// Meters north of the vehicle
    pub north_m: f32,
    /// Meters east of the vehicle
    pub east_m: f32,
}

/// Horizontal offset from the vehicle to a target, body frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyOffset {
    /// Meters ahead of the nose
    pub forward_m: f32,
    /// Meters to the right
    pub right_m: f32,
}

impl LocalOffset {
    /// Offset from `current` to `target`, longitude scaled at the current latitude
    pub fn between(target: GeoPoint, current: GeoPoint) -> Self {
        let lon_scale = libm::cos(current.latitude.to_radians());
        Self {
            north_m: ((target.latitude - current.latitude) * METERS_PER_DEGREE) as f32,
            east_m: ((target.longitude - current.longitude) * METERS_PER_DEGREE * lon_scale) as f32,
        }
    }

    /// Horizontal distance (m)
    pub fn distance_m(&self) -> f32 {
        libm::sqrtf(self.north_m * self.north_m + self.east_m * self.east_m)
    }

    /// Rotate into the body frame of a vehicle heading `yaw_deg`
    pub fn to_body(&self, yaw_deg: f32) -> BodyOffset {
        let yaw = yaw_deg.to_radians();
        let (sin_y, cos_y) = (libm::sinf(yaw), libm::cosf(yaw));
        BodyOffset {
            forward_m: cos_y * self.north_m + sin_y * self.east_m,
            right_m: -sin_y * self.north_m + cos_y * self.east_m,
        }
    }
}

/// Proportional steering toward a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionGains {
    /// Tilt per meter of error (degrees/m)
    pub kp: f32,
    /// Roll magnitude limit (degrees)
    pub max_roll_deg: f32,
    /// Pitch magnitude limit (degrees)
    pub max_pitch_deg: f32,
}

/// Desired (roll, pitch) in degrees that moves the vehicle toward `target`
pub fn attitude_toward(
    target: GeoPoint,
    current: GeoPoint,
    yaw_deg: f32,
    gains: &PositionGains,
) -> (f32, f32) {
    let body = LocalOffset::between(target, current).to_body(yaw_deg);
    let roll = limit_magnitude(gains.kp * body.right_m, gains.max_roll_deg);
    let pitch = limit_magnitude(gains.kp * body.forward_m, gains.max_pitch_deg);
    (roll, pitch)
}

/// `value` bounded to ±|`max`|; a NaN bound leaves it unbounded
pub(crate) fn limit_magnitude(value: f32, max: f32) -> f32 {
    let max = libm::fabsf(max);
    value.max(-max).min(max)
}
