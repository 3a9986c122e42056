//! Physical Constants
//!
//! Atmosphere model and geodesy approximations used by sensor fusion and
//! navigation.

// ===== ATMOSPHERE =====

/// Standard atmospheric pressure at sea level (Pa).
///
/// Reference pressure P₀ of the international barometric formula.
/// Barometer samples are expected in pascals.
///
/// Source: International Standard Atmosphere (ISA)
pub const SEA_LEVEL_PRESSURE_PA: f32 = 101_325.0;

/// Scale height term of the international barometric formula (m).
///
/// `h = 44330 × (1 - (P/P₀)^0.1903)` where 44330 ≈ T₀/L = 288.15 K / 0.0065 K/m.
///
/// Source: ISA troposphere model (valid up to ~11 km)
pub const BAROMETRIC_SCALE_M: f32 = 44_330.0;

/// Exponent of the international barometric formula.
///
/// Equals R×L/(g×M) ≈ 0.1903 for dry air.
///
/// Source: ISA troposphere model
pub const BAROMETRIC_EXPONENT: f32 = 0.1903;

/// Standard gravitational acceleration (m/s²).
///
/// Source: CGPM 1901, ISO 80000-3
pub const STANDARD_GRAVITY_M_S2: f32 = 9.80665;

// ===== GEODESY =====

/// Approximate ground distance of one degree of latitude (m).
///
/// Longitude degrees are scaled additionally by cos(latitude). The flat-earth
/// approximation is adequate over the few hundred meters a position hold or
/// return-to-launch covers.
///
/// Source: Mean meridian degree ≈ 111.0 km
pub const METERS_PER_DEGREE: f64 = 111_000.0;
