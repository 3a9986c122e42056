//! Common test utilities for integration tests
//!
//! This module provides:
//! - Sensor batch generators consistent with a chosen attitude and position
//! - A deterministic RNG and tolerance assertions
//! - A pipeline harness driven by a mock clock

#![allow(dead_code)]

pub mod generators;
pub mod harness;

use quadpilot_core::{
    config::FlightConfig,
    fusion::FusionConfig,
    pipeline::{ModeRequest, TickInput},
    state::{FlightMode, RcInput, VehicleState},
};

pub use generators::{BatchBuilder, HOME_LAT, HOME_LON};
pub use harness::{FlightHarness, TestRng};

/// Fusion with both mounting offsets removed, so generated body-frame
/// samples read back unrotated
pub fn aligned_fusion() -> FusionConfig {
    FusionConfig::default().with_mount_offsets(0.0, 0.0)
}

/// Default flight configuration with aligned sensors
pub fn aligned_config() -> FlightConfig {
    FlightConfig::default().with_fusion(aligned_fusion())
}

/// Tick input for an explicit mode
pub fn tick_input(batch: BatchBuilder, mode: FlightMode, rc: RcInput) -> TickInput {
    TickInput::new(batch.build(), rc).with_mode(ModeRequest::Explicit(mode))
}

/// Vehicle at `north_m`/`east_m` from home, level, facing north
pub fn state_at(north_m: f64, east_m: f64, altitude: f32) -> VehicleState {
    let lat = HOME_LAT + north_m / quadpilot_core::constants::METERS_PER_DEGREE;
    let lon = HOME_LON
        + east_m / (quadpilot_core::constants::METERS_PER_DEGREE * HOME_LAT.to_radians().cos());
    VehicleState {
        latitude: lat,
        longitude: lon,
        altitude,
        ..VehicleState::default()
    }
}
