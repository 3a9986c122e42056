//! Error Types for the Flight-Control Pipeline
//!
//! ## Design Philosophy
//!
//! The pipeline runs once per control tick on a flight controller, so errors
//! follow the same rules as the rest of the hot path:
//!
//! 1. **Small Size**: Every variant is a handful of bytes and the enum is `Copy`.
//!
//! 2. **No Heap Allocation**: Messages are `&'static str`, never `String`.
//!
//! 3. **Nothing Reaches the Motors**: Only [`PipelineError::InvalidInput`] and
//!    [`PipelineError::BatchFull`] ever leave the pipeline. Every other fault
//!    degrades to a bounded command inside the component that detected it.
//!
//! ## Error Categories
//!
//! ### Input Faults (fail the tick)
//! - `InvalidInput`: empty or malformed sample sequence
//! - `BatchFull`: producer tried to push more samples than a tick can hold
//!
//! ### Degraded Guidance (never propagated)
//! - `UnsetHomePosition`: RTL requested before home was captured; guidance
//!   answers with the zero-attitude, zero-thrust failsafe command instead
//!
//! ### Range Violations (silently clamped)
//! - `OutOfRangeCommand`: only surfaced by strict adapter-side checks such as
//!   [`RcInput::validate`](crate::state::RcInput::validate)
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use quadpilot_core::{PipelineError, SensorFusion, FusionConfig};
//!
//! let mut fusion = SensorFusion::new(FusionConfig::default());
//! match fusion.process(&[], &[], &[], &[]) {
//!     Ok(_state) => {}
//!     Err(PipelineError::InvalidInput { .. }) => {
//!         // Skip this tick, keep the previous motor command
//!     }
//!     Err(_) => {}
//! }
//! ```

use core::fmt;

use thiserror_no_std::Error;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Sensor family a fault refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Combined accelerometer + gyroscope
    Imu,
    /// GNSS receiver
    Gps,
    /// Magnetometer
    Magnetometer,
    /// Barometer (pressure, temperature, humidity)
    Barometer,
}

impl SensorKind {
    /// Short lowercase name used in messages
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Imu => "imu",
            Self::Gps => "gps",
            Self::Magnetometer => "magnetometer",
            Self::Barometer => "barometer",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PipelineError {
    /// A required sample sequence is empty or holds unusable values
    #[error("Invalid {sensor} input: {reason}")]
    InvalidInput {
        /// Sensor whose samples were rejected
        sensor: SensorKind,
        /// What was wrong with them
        reason: &'static str,
    },

    /// A sample batch has no room left for this sensor
    #[error("{sensor} batch full (capacity {capacity})")]
    BatchFull {
        /// Sensor whose sequence overflowed
        sensor: SensorKind,
        /// Fixed per-tick capacity
        capacity: usize,
    },

    /// Return-to-launch requested before the home position was captured
    #[error("Home position not set")]
    UnsetHomePosition,

    /// A command fell outside its configured bounds
    #[error("Command {value} outside range [{min}, {max}]")]
    OutOfRangeCommand {
        /// Offending value
        value: f32,
        /// Lower bound
        min: f32,
        /// Upper bound
        max: f32,
    },
}

/// Configuration errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field holds a value the pipeline cannot run with
    #[error("Invalid config field `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the field
        field: &'static str,
        /// Why it was rejected
        reason: &'static str,
    },

    /// The configuration document could not be parsed
    #[error("Config parse error at line {line}, column {column}")]
    Parse {
        /// 1-based line of the failure
        line: usize,
        /// 1-based column of the failure
        column: usize,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorKind {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PipelineError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidInput { sensor, reason } =>
                defmt::write!(fmt, "Invalid {} input: {}", sensor, reason),
            Self::BatchFull { sensor, capacity } =>
                defmt::write!(fmt, "{} batch full ({})", sensor, capacity),
            Self::UnsetHomePosition =>
                defmt::write!(fmt, "Home position not set"),
            Self::OutOfRangeCommand { value, min, max } =>
                defmt::write!(fmt, "Command {} outside [{}, {}]", value, min, max),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Invalid { field, reason } =>
                defmt::write!(fmt, "Invalid config {}: {}", field, reason),
            Self::Parse { line, column } =>
                defmt::write!(fmt, "Config parse error {}:{}", line, column),
        }
    }
}
