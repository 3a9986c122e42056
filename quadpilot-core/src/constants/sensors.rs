//! Sensor scales and limits
//!
//! Scale factors converting raw sensor counts into SI units, and the
//! mounting offsets between sensor and body frames.

use super::physics::STANDARD_GRAVITY_M_S2;

// ===== IMU SCALING =====

/// Accelerometer LSB sensitivity at ±2 g full scale (LSB/g).
///
/// Source: MPU-6050 datasheet, Table 6.2 (AFS_SEL = 0)
pub const ACCEL_LSB_PER_G: f32 = 16_384.0;

/// Gyroscope LSB sensitivity at ±250 °/s full scale (LSB per °/s).
///
/// Source: MPU-6050 datasheet, Table 6.1 (FS_SEL = 0)
pub const GYRO_LSB_PER_DEG_S: f32 = 131.0;

/// Accelerometer scale: raw counts → m/s².
pub const ACCEL_SCALE_M_S2_PER_LSB: f32 = STANDARD_GRAVITY_M_S2 / ACCEL_LSB_PER_G;

/// Gyroscope scale: raw counts → rad/s.
pub const GYRO_SCALE_RAD_S_PER_LSB: f32 = (core::f32::consts::PI / 180.0) / GYRO_LSB_PER_DEG_S;

// ===== MOUNTING =====

/// Yaw misalignment of the IMU relative to the body frame (degrees).
///
/// Accelerometer and gyro vectors are rotated about the vertical axis by this
/// angle before use.
///
/// Source: Airframe build measurement
pub const IMU_MOUNT_OFFSET_DEG: f32 = 15.0;

/// Yaw misalignment of the magnetometer relative to the body frame (degrees).
///
/// Source: Airframe build measurement
pub const MAG_MOUNT_OFFSET_DEG: f32 = 10.0;

// ===== PLAUSIBILITY =====

/// Lowest pressure accepted from the barometer (Pa).
///
/// Roughly 12 km altitude; anything lower is treated as a sensor fault.
pub const BARO_PRESSURE_MIN_PA: f32 = 20_000.0;

/// Highest pressure accepted from the barometer (Pa).
///
/// Above the highest recorded sea-level pressure (108 480 Pa).
pub const BARO_PRESSURE_MAX_PA: f32 = 110_000.0;
