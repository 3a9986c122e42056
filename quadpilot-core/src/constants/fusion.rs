//! Fusion Algorithm Constants
//!
//! Weights of the attitude and altitude complementary filters.

/// Weight of the gyro-propagated attitude in the attitude complementary filter.
///
/// `attitude = α·(previous + rate·dt) + (1-α)·accel/mag estimate`.
/// 0.98 trusts the gyro short-term while letting the accelerometer and
/// magnetometer remove drift over roughly 50 ticks.
///
/// Source: Classic IMU complementary filter tuning
pub const ATTITUDE_FILTER_ALPHA: f32 = 0.98;

/// Weight of the barometric altitude in the altitude complementary filter.
///
/// `altitude = α·baro + (1-α)·gps`.
///
/// Source: Barometer short-term precision vs. GNSS vertical accuracy
pub const ALTITUDE_FILTER_ALPHA: f32 = 0.95;

/// Time step the gyro rate is integrated over each tick (s).
///
/// The fusion contract carries no timestamps, so the rate is propagated by
/// the nominal control period (100 Hz).
pub const GYRO_INTEGRATION_DT_S: f32 = 0.01;

/// Attitude envelope of the estimator (degrees).
///
/// Fused roll and pitch are constrained to ±90°.
pub const MAX_TILT_DEG: f32 = 90.0;
