//! Vector geometry for the fusion stage
//!
//! Fixed-size `[f32; 3]` helpers, no allocation. Trigonometry goes through
//! `libm` so the same code runs on targets without `std`.

use core::f32::consts::PI;

use crate::constants::physics::{BAROMETRIC_EXPONENT, BAROMETRIC_SCALE_M};

/// Three-component vector
pub type Vec3 = [f32; 3];

/// Rotation about the vertical (z) axis with precomputed sine/cosine
///
/// ```text
/// x' = x·cos θ - y·sin θ
/// y' = x·sin θ + y·cos θ
/// z' = z
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZRotation {
    sin: f32,
    cos: f32,
}

impl ZRotation {
    /// Rotation by `angle_deg` degrees
    pub fn from_degrees(angle_deg: f32) -> Self {
        let rad = angle_deg.to_radians();
        Self { sin: libm::sinf(rad), cos: libm::cosf(rad) }
    }

    /// Rotate a vector
    pub fn apply(&self, v: Vec3) -> Vec3 {
        [
            v[0] * self.cos - v[1] * self.sin,
            v[0] * self.sin + v[1] * self.cos,
            v[2],
        ]
    }
}

/// Running component-wise sum for averaging a burst of vectors
#[derive(Debug, Clone, Copy, Default)]
pub struct VecMean {
    sum: [f64; 3],
    count: u32,
}

impl VecMean {
    /// Add one vector
    pub fn add(&mut self, v: Vec3) {
        for (acc, x) in self.sum.iter_mut().zip(v) {
            *acc += x as f64;
        }
        self.count += 1;
    }

    /// Arithmetic mean, or `None` if nothing was added
    pub fn mean(&self) -> Option<Vec3> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some([
            (self.sum[0] / n) as f32,
            (self.sum[1] / n) as f32,
            (self.sum[2] / n) as f32,
        ])
    }
}

/// Roll and pitch (radians) of the gravity vector seen by the accelerometer
///
/// ```text
/// roll  = atan2(ay, az)
/// pitch = atan2(-ax, √(ay² + az²))
/// ```
pub fn accel_tilt(accel: Vec3) -> (f32, f32) {
    let [ax, ay, az] = accel;
    let roll = libm::atan2f(ay, az);
    let pitch = libm::atan2f(-ax, libm::sqrtf(ay * ay + az * az));
    (roll, pitch)
}

/// Tilt-compensated magnetic heading (radians)
///
/// Projects the magnetometer vector onto the horizontal plane using the
/// given roll/pitch, then `yaw = atan2(-my', mx')`.
pub fn tilt_compensated_heading(mag: Vec3, roll: f32, pitch: f32) -> f32 {
    let [mx, my, mz] = mag;
    let (sin_r, cos_r) = (libm::sinf(roll), libm::cosf(roll));
    let (sin_p, cos_p) = (libm::sinf(pitch), libm::cosf(pitch));

    let horizontal_x = mx * cos_p + mz * sin_p;
    let horizontal_y = mx * sin_r * sin_p + my * cos_r - mz * sin_r * cos_p;
    libm::atan2f(-horizontal_y, horizontal_x)
}

/// International barometric formula
///
/// ```text
/// h = 44330 × (1 - (P/P₀)^0.1903)
/// ```
pub fn barometric_altitude(pressure_pa: f32, sea_level_pa: f32) -> f32 {
    BAROMETRIC_SCALE_M * (1.0 - libm::powf(pressure_pa / sea_level_pa, BAROMETRIC_EXPONENT))
}

/// Wrap an angle into (-π, π]
pub fn wrap_pi(angle: f32) -> f32 {
    let wrapped = libm::remainderf(angle, 2.0 * PI);
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}
