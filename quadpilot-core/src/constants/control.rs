//! Control Loop Constants
//!
//! Default PID gains, derivative filtering and the PWM output domain.

// ===== PWM DOMAIN =====

/// Lowest PWM pulse width accepted by ESCs and receivers (µs).
pub const PWM_MIN: u16 = 1000;

/// Highest PWM pulse width (µs).
pub const PWM_MAX: u16 = 2000;

/// Neutral PWM pulse width (µs).
pub const PWM_CENTER: u16 = 1500;

/// Distance from center to either end of the PWM range (µs).
pub const PWM_HALF_SPAN: f32 = 500.0;

// ===== DEFAULT GAINS =====
//
// Each triple is (Kp, Ki, Kd).

/// Roll angle loop gains.
pub const ROLL_GAINS: (f32, f32, f32) = (1.0, 0.0, 0.2);

/// Pitch angle loop gains.
pub const PITCH_GAINS: (f32, f32, f32) = (1.0, 0.0, 0.2);

/// Yaw rate loop gains.
pub const YAW_RATE_GAINS: (f32, f32, f32) = (1.5, 0.0, 0.3);

/// Altitude loop gains (output is normalized thrust).
pub const ALTITUDE_GAINS: (f32, f32, f32) = (1.0, 0.05, 0.2);

// ===== TIMING =====

/// Time constant of the derivative low-pass filter (s).
///
/// Cutoff ≈ 1/(2π·τ) ≈ 8 Hz.
pub const DERIVATIVE_FILTER_TAU_S: f32 = 0.02;

/// Smallest tick interval the controller integrates over (s).
///
/// Protects the derivative term from division by a zero interval when two
/// ticks share a timestamp.
pub const MIN_CONTROL_DT_S: f32 = 1e-3;

/// Altitude loop output range (normalized thrust).
pub const THRUST_LIMITS: (f32, f32) = (0.0, 1.0);
