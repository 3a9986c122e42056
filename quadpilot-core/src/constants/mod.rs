//! Constants for the Flight-Control Core
//!
//! Centralized, documented constants used by every stage of the pipeline.
//! Configuration defaults are built from these values, so changing a default
//! here changes it everywhere.
//!
//! ## Organization
//!
//! Constants are grouped by domain:
//! - **Physics**: Atmosphere model and geodesy approximations
//! - **Sensors**: Raw-count scale factors and mounting offsets
//! - **Fusion**: Complementary filter weights
//! - **Guidance**: Flight envelope limits and navigation tolerances
//! - **Control**: PID gains, derivative filter and PWM domain
//! - **Buffers**: Fixed capacities for per-tick storage
//!
//! ## Usage Guidelines
//!
//! 1. Use these constants instead of magic numbers
//! 2. Include the unit in the name
//! 3. Reference the datasheet or standard a value comes from

/// Physical constants: atmosphere model and geodesy.
pub mod physics;

/// Sensor scale factors and mounting geometry.
pub mod sensors;

/// Complementary filter parameters.
pub mod fusion;

/// Flight envelope and navigation parameters for guidance.
pub mod guidance;

/// PID tuning and PWM output domain.
pub mod control;

/// Fixed buffer capacities.
pub mod buffers;

// Re-export commonly used constants for convenience
pub use physics::{
    SEA_LEVEL_PRESSURE_PA, STANDARD_GRAVITY_M_S2, METERS_PER_DEGREE,
};

pub use sensors::{
    ACCEL_SCALE_M_S2_PER_LSB, GYRO_SCALE_RAD_S_PER_LSB,
    IMU_MOUNT_OFFSET_DEG, MAG_MOUNT_OFFSET_DEG,
};

pub use fusion::{ATTITUDE_FILTER_ALPHA, ALTITUDE_FILTER_ALPHA};

pub use control::{PWM_MIN, PWM_MAX, PWM_CENTER, PWM_HALF_SPAN};

pub use buffers::{MAX_SAMPLES_PER_TICK, HANDOFF_QUEUE_CAPACITY};
