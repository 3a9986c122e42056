//! Guidance Constants
//!
//! Flight envelope limits, climb/descent rates and navigation tolerances used
//! by the flight-mode state machine.

// ===== ATTITUDE ENVELOPE =====

/// Maximum commanded roll angle (degrees).
pub const MAX_ROLL_DEG: f32 = 30.0;

/// Maximum commanded pitch angle (degrees).
pub const MAX_PITCH_DEG: f32 = 30.0;

/// Maximum commanded yaw rate (degrees/second).
pub const MAX_YAW_RATE_DEG_S: f32 = 5.0;

// ===== VERTICAL RATES =====

/// Climb rate at full throttle stick in altitude-holding modes (m/s).
pub const MAX_CLIMB_RATE_M_S: f32 = 2.0;

/// Descent rate at zero throttle stick in altitude-holding modes (m/s, positive).
pub const MAX_DESCENT_RATE_M_S: f32 = 1.5;

/// Target-altitude descent rate while landing (m/s, positive).
pub const LAND_DESCENT_RATE_M_S: f32 = 0.5;

/// Target-altitude ramp rate during a guided takeoff (m/s).
pub const TAKEOFF_CLIMB_RATE_M_S: f32 = 0.8;

/// Vertical rate bound while flying to a guided waypoint (m/s).
pub const GOTO_VERTICAL_RATE_M_S: f32 = 1.0;

// ===== NAVIGATION =====

/// Proportional gain from body-frame position error to tilt (degrees per meter).
pub const POSITION_KP_DEG_PER_M: f32 = 2.0;

/// Horizontal distance to home at which RTL starts descending (m).
pub const RTL_TOLERANCE_M: f32 = 1.0;

/// Minimum altitude RTL climbs to before flying home (m).
pub const RTL_ALTITUDE_M: f32 = 10.0;

/// Horizontal arrival radius of a guided waypoint (m).
pub const GOTO_ARRIVAL_RADIUS_M: f32 = 0.5;

/// Vertical arrival tolerance of a guided waypoint (m).
pub const GOTO_ALTITUDE_TOLERANCE_M: f32 = 0.2;

/// Altitude a guided takeoff climbs to when none is given (m).
pub const DEFAULT_TAKEOFF_ALTITUDE_M: f32 = 5.0;

// ===== PILOT INPUT =====

/// Stick deflection from center that hands position hold back to the pilot (PWM µs).
pub const STICK_DEADBAND_PWM: u16 = 50;

/// Number of GPS fixes averaged into the home position.
pub const HOME_FIX_COUNT: u8 = 4;

// ===== MODE CHANNELS =====

/// Primary mode channel value at or above which the override mode engages (PWM µs).
pub const MODE_OVERRIDE_THRESHOLD_PWM: u16 = 1500;

/// Upper edge of the low band of the secondary mode channel (PWM µs).
pub const MODE_BAND_LOW_MAX_PWM: u16 = 1300;

/// Lower edge of the high band of the secondary mode channel (PWM µs).
pub const MODE_BAND_HIGH_MIN_PWM: u16 = 1700;
