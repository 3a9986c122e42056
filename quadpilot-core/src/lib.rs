//! Quadrotor flight-control core
//!
//! Turns per-tick sensor batches and pilot input into bounded motor
//! commands for an X-configuration quadrotor.
//!
//! Key constraints:
//! - `no_std` capable, no heap allocation in the tick path
//! - Every motor output lies in [1000, 2000] µs, whatever the input
//! - Time is injected, so flight logic replays deterministically
//!
//! ```text
//! SensorBatch → SensorFusion → GuidanceStateMachine → AttitudeAltitudeController → MotorMixer
//! ```
//!
//! ```no_run
//! use quadpilot_core::{FlightConfig, FlightPipeline, TickInput, MonotonicClock};
//!
//! let clock = MonotonicClock::new();
//! let mut pipeline = FlightPipeline::new(FlightConfig::default(), clock).unwrap();
//!
//! # let input = TickInput::default();
//! match pipeline.tick(&input) {
//!     Ok(out) => { let _pulses = out.motors.as_array(); } // Write to ESCs
//!     Err(_) => {} // Keep the previous command this tick
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod batch;
pub mod config;
pub mod constants;
pub mod control;
pub mod errors;
pub mod fusion;
pub mod guidance;
pub mod handoff;
pub mod mixer;
pub mod pipeline;
pub mod pwm;
pub mod state;
pub mod time;

// Public API
pub use batch::{BaroSample, GpsFix, ImuSample, MagSample, SensorBatch};
pub use config::FlightConfig;
pub use control::{AttitudeAltitudeController, ControllerConfig};
pub use errors::{ConfigError, PipelineError, PipelineResult, SensorKind};
pub use fusion::{FusionConfig, SensorFusion};
pub use guidance::{GuidanceConfig, GuidanceStateMachine};
pub use handoff::SnapshotQueue;
pub use mixer::{MixerConfig, MotorMixer};
pub use pipeline::{FlightPipeline, ModeRequest, TickInput, TickOutput};
pub use state::{
    ControlCommand, FlightMode, GuidanceOutput, GuidedCommand, GuidedTarget, ModeTag,
    MotorCommand, RcInput, VehicleState,
};
#[cfg(feature = "std")]
pub use time::MonotonicClock;
pub use time::{MockTimeSource, TimeSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
