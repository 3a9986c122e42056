//! Sensor Fusion: raw sensor batches to a vehicle state estimate
//!
//! ## Overview
//!
//! Each tick the fusion stage turns one [`SensorBatch`](crate::batch::SensorBatch)
//! into a [`VehicleState`]:
//!
//! ```text
//! IMU  → scale → rotate(mount) → mean ─┬─ accel tilt ─┐
//!                                      └─ gyro rate ──┤
//! Mag  → rotate(mount) → mean → tilt-compensated yaw ─┼─→ complementary ─→ VehicleState
//! Baro → mean → barometric altitude ──────────────────┤        ↑
//! GPS  → mean → lat/lon passthrough, GPS altitude ────┘   previous estimate
//! ```
//!
//! ## Algorithm
//!
//! 1. Scale raw accelerometer counts to m/s² and gyro counts to rad/s
//! 2. Rotate IMU and magnetometer vectors about z by their mounting offsets
//! 3. Average every sensor's samples within the tick
//! 4. Accelerometer tilt: `roll = atan2(ay, az)`, `pitch = atan2(-ax, √(ay²+az²))`
//! 5. Tilt-compensated magnetic yaw
//! 6. Barometric altitude: `44330 × (1 - (P/P₀)^0.1903)`
//! 7. Complementary filters:
//!    ```text
//!    attitude = α·(previous + gyro·dt) + (1-α)·accel/mag    α ≈ 0.98
//!    altitude = α_alt·baro + (1-α_alt)·gps                  α_alt ≈ 0.95
//!    ```
//! 8. Keep the fused attitude/altitude as the prior for the next tick
//!
//! ## Persistent State
//!
//! The prior lives in [`FusionState`], owned by the [`SensorFusion`]
//! instance. Feeding the same batch twice gives different attitudes because
//! the second call starts from the first call's estimate.
//!
//! ## Usage Example
//!
//! ```rust
//! use quadpilot_core::batch::{BaroSample, GpsFix, ImuSample, MagSample};
//! use quadpilot_core::fusion::{FusionConfig, SensorFusion};
//!
//! let mut fusion = SensorFusion::new(FusionConfig::default());
//! let state = fusion.process(
//!     &[ImuSample::from_raw([0.0, 0.0, 16_384.0, 0.0, 0.0, 0.0])],
//!     &[GpsFix::new(47.39, 8.54, 410.0)],
//!     &[MagSample::new(0.25, 0.0, 0.4)],
//!     &[BaroSample::new(101_325.0, 21.0, 45.0)],
//! ).unwrap();
//! assert!(state.roll.abs() < 1e-3);
//! ```

pub mod complementary;
pub mod geometry;

pub use complementary::ComplementaryFilter;

use core::f32::consts::FRAC_PI_2;

use crate::{
    batch::{validate_samples, BaroSample, GpsFix, ImuSample, MagSample, SensorBatch},
    constants::{
        fusion::{GYRO_INTEGRATION_DT_S, MAX_TILT_DEG},
        ALTITUDE_FILTER_ALPHA, ATTITUDE_FILTER_ALPHA,
        ACCEL_SCALE_M_S2_PER_LSB, GYRO_SCALE_RAD_S_PER_LSB,
        IMU_MOUNT_OFFSET_DEG, MAG_MOUNT_OFFSET_DEG, SEA_LEVEL_PRESSURE_PA,
    },
    errors::{PipelineError, PipelineResult, SensorKind},
    state::VehicleState,
};

use geometry::{accel_tilt, barometric_altitude, tilt_compensated_heading, VecMean, ZRotation};

/// Fusion parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FusionConfig {
    /// Weight of the gyro-propagated attitude
    pub attitude_alpha: f32,
    /// Weight of the barometric altitude
    pub altitude_alpha: f32,
    /// Interval the gyro rate is integrated over each tick (s)
    pub gyro_dt_s: f32,
    /// IMU yaw mounting offset (degrees)
    pub imu_mount_offset_deg: f32,
    /// Magnetometer yaw mounting offset (degrees)
    pub mag_mount_offset_deg: f32,
    /// Sea-level reference pressure P₀ (Pa)
    pub sea_level_pressure_pa: f32,
    /// Accelerometer scale (m/s² per LSB)
    pub accel_scale: f32,
    /// Gyroscope scale (rad/s per LSB)
    pub gyro_scale: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            attitude_alpha: ATTITUDE_FILTER_ALPHA,
            altitude_alpha: ALTITUDE_FILTER_ALPHA,
            gyro_dt_s: GYRO_INTEGRATION_DT_S,
            imu_mount_offset_deg: IMU_MOUNT_OFFSET_DEG,
            mag_mount_offset_deg: MAG_MOUNT_OFFSET_DEG,
            sea_level_pressure_pa: SEA_LEVEL_PRESSURE_PA,
            accel_scale: ACCEL_SCALE_M_S2_PER_LSB,
            gyro_scale: GYRO_SCALE_RAD_S_PER_LSB,
        }
    }
}

impl FusionConfig {
    /// Set both complementary filter weights
    pub fn with_alphas(mut self, attitude: f32, altitude: f32) -> Self {
        self.attitude_alpha = attitude;
        self.altitude_alpha = altitude;
        self
    }

    /// Set the sensor mounting offsets (degrees)
    pub fn with_mount_offsets(mut self, imu_deg: f32, mag_deg: f32) -> Self {
        self.imu_mount_offset_deg = imu_deg;
        self.mag_mount_offset_deg = mag_deg;
        self
    }

    /// Set the local sea-level pressure (Pa)
    pub fn with_sea_level_pressure(mut self, pressure_pa: f32) -> Self {
        self.sea_level_pressure_pa = pressure_pa;
        self
    }
}

/// Prior carried from one tick to the next
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FusionState {
    /// Roll (radians)
    pub roll: f32,
    /// Pitch (radians)
    pub pitch: f32,
    /// Yaw (radians)
    pub yaw: f32,
    /// Altitude (m)
    pub altitude: f32,
}

/// Complementary-filter sensor fusion
#[derive(Debug, Clone)]
pub struct SensorFusion {
    config: FusionConfig,
    imu_mount: ZRotation,
    mag_mount: ZRotation,
    attitude_filter: ComplementaryFilter,
    altitude_filter: ComplementaryFilter,
    state: FusionState,
    updates: u32,
}

impl SensorFusion {
    /// Fusion with zeroed attitude and altitude
    pub fn new(config: FusionConfig) -> Self {
        Self {
            imu_mount: ZRotation::from_degrees(config.imu_mount_offset_deg),
            mag_mount: ZRotation::from_degrees(config.mag_mount_offset_deg),
            attitude_filter: ComplementaryFilter::new(config.attitude_alpha),
            altitude_filter: ComplementaryFilter::new(config.altitude_alpha),
            config,
            state: FusionState::default(),
            updates: 0,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Prior that the next tick starts from
    pub fn state(&self) -> &FusionState {
        &self.state
    }

    /// Number of successful ticks since creation or reset
    pub fn updates(&self) -> u32 {
        self.updates
    }

    /// Zero the prior
    pub fn reset(&mut self) {
        self.state = FusionState::default();
        self.updates = 0;
    }

    /// Fuse one batch
    pub fn process_batch(&mut self, batch: &SensorBatch) -> PipelineResult<VehicleState> {
        self.process(batch.imu(), batch.gps(), batch.mag(), batch.baro())
    }

    /// Fuse one tick worth of samples
    ///
    /// Fails with [`PipelineError::InvalidInput`] if any sequence is empty or
    /// malformed; the prior is left untouched in that case.
    pub fn process(
        &mut self,
        imu: &[ImuSample],
        gps: &[GpsFix],
        mag: &[MagSample],
        baro: &[BaroSample],
    ) -> PipelineResult<VehicleState> {
        validate_samples(imu, gps, mag, baro)?;

        let mut accel_mean = VecMean::default();
        let mut gyro_mean = VecMean::default();
        for sample in imu {
            accel_mean.add(self.imu_mount.apply(scale(sample.accel, self.config.accel_scale)));
            gyro_mean.add(self.imu_mount.apply(scale(sample.gyro, self.config.gyro_scale)));
        }

        let mut mag_mean = VecMean::default();
        for sample in mag {
            mag_mean.add(self.mag_mount.apply(sample.field));
        }

        let accel = accel_mean.mean().ok_or(empty(SensorKind::Imu))?;
        let gyro = gyro_mean.mean().ok_or(empty(SensorKind::Imu))?;
        let field = mag_mean.mean().ok_or(empty(SensorKind::Magnetometer))?;
        let fix = mean_fix(gps);
        let pressure = mean_pressure(baro);

        // Reference estimates from this tick alone
        let (accel_roll, accel_pitch) = accel_tilt(accel);
        let mag_yaw = tilt_compensated_heading(field, accel_roll, accel_pitch);
        let baro_altitude = barometric_altitude(pressure, self.config.sea_level_pressure_pa);

        // Gyro propagation of the prior
        let dt = self.config.gyro_dt_s;
        let prior = self.state;
        let predicted_roll = prior.roll + gyro[0] * dt;
        let predicted_pitch = prior.pitch + gyro[1] * dt;
        let predicted_yaw = prior.yaw + gyro[2] * dt;

        let tilt_limit = MAX_TILT_DEG.to_radians().min(FRAC_PI_2);
        let roll = self
            .attitude_filter
            .blend(predicted_roll, accel_roll)
            .clamp(-tilt_limit, tilt_limit);
        let pitch = self
            .attitude_filter
            .blend(predicted_pitch, accel_pitch)
            .clamp(-tilt_limit, tilt_limit);
        let yaw = self.attitude_filter.blend_angle(predicted_yaw, mag_yaw);
        let altitude = self.altitude_filter.blend(baro_altitude, fix.altitude);

        self.state = FusionState { roll, pitch, yaw, altitude };
        self.updates = self.updates.saturating_add(1);

        log_trace!(
            "fusion: roll={} pitch={} yaw={} alt={}",
            roll.to_degrees(),
            pitch.to_degrees(),
            yaw.to_degrees(),
            altitude
        );

        Ok(VehicleState {
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude,
            roll: roll.to_degrees(),
            pitch: pitch.to_degrees(),
            yaw: yaw.to_degrees(),
            yaw_rate: gyro[2].to_degrees(),
        })
    }
}

fn scale(v: [f32; 3], factor: f32) -> [f32; 3] {
    [v[0] * factor, v[1] * factor, v[2] * factor]
}

fn empty(sensor: SensorKind) -> PipelineError {
    PipelineError::InvalidInput { sensor, reason: "no samples" }
}

/// Component-wise mean of the fixes; lat/lon summed in f64 to keep centimeters
fn mean_fix(gps: &[GpsFix]) -> GpsFix {
    let (mut lat, mut lon, mut alt) = (0.0f64, 0.0f64, 0.0f64);
    for fix in gps {
        lat += fix.latitude;
        lon += fix.longitude;
        alt += fix.altitude as f64;
    }
    let n = gps.len().max(1) as f64;
    GpsFix::new(lat / n, lon / n, (alt / n) as f32)
}

fn mean_pressure(baro: &[BaroSample]) -> f32 {
    let sum: f64 = baro.iter().map(|b| b.pressure_pa as f64).sum();
    (sum / baro.len().max(1) as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_G: f32 = 16_384.0;

    fn gps() -> [GpsFix; 1] {
        [GpsFix::new(47.0, 8.0, 100.0)]
    }

    fn mag() -> [MagSample; 1] {
        [MagSample::new(0.3, 0.0, 0.4)]
    }

    fn baro() -> [BaroSample; 1] {
        [BaroSample::new(SEA_LEVEL_PRESSURE_PA, 20.0, 50.0)]
    }

    fn untilted_config() -> FusionConfig {
        FusionConfig::default().with_mount_offsets(0.0, 0.0)
    }

    #[test]
    fn empty_sequence_fails_and_keeps_prior() {
        let mut fusion = SensorFusion::new(FusionConfig::default());
        let err = fusion.process(&[], &gps(), &mag(), &baro()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { sensor: SensorKind::Imu, .. }));
        assert_eq!(fusion.state(), &FusionState::default());
        assert_eq!(fusion.updates(), 0);
    }

    #[test]
    fn samples_are_averaged() {
        let mut fusion = SensorFusion::new(untilted_config());
        let imu = [
            ImuSample::from_raw([0.0, 0.0, ONE_G, 0.0, 0.0, 0.0]),
            ImuSample::from_raw([0.0, 0.0, ONE_G, 0.0, 0.0, 0.0]),
        ];
        let fixes = [GpsFix::new(47.0, 8.0, 90.0), GpsFix::new(47.0002, 8.0002, 110.0)];
        let state = fusion.process(&imu, &fixes, &mag(), &baro()).unwrap();

        assert!((state.latitude - 47.0001).abs() < 1e-9);
        assert!((state.longitude - 8.0001).abs() < 1e-9);
        // Baro says 0 m, GPS says 100 m: 0.95·0 + 0.05·100
        assert!((state.altitude - 5.0).abs() < 1e-3);
    }

    #[test]
    fn tilted_gravity_pulls_roll_gradually() {
        let mut fusion = SensorFusion::new(untilted_config());
        // 30° roll: gravity split between y and z
        let ay = ONE_G * 0.5;
        let az = ONE_G * 0.866_025_4;
        let imu = [ImuSample::from_raw([0.0, ay, az, 0.0, 0.0, 0.0])];

        let first = fusion.process(&imu, &gps(), &mag(), &baro()).unwrap();
        assert!((first.roll - 0.6).abs() < 1e-3, "roll = {}", first.roll);

        let second = fusion.process(&imu, &gps(), &mag(), &baro()).unwrap();
        assert!(second.roll > first.roll);
        assert!((second.roll - (0.98 * 0.6 + 0.6)).abs() < 1e-3);
    }

    #[test]
    fn mount_offset_rotates_accel_into_body_frame() {
        // IMU rotated 90°: sensor +x gravity shows up on body +y
        let mut fusion = SensorFusion::new(
            FusionConfig::default().with_mount_offsets(90.0, 0.0).with_alphas(0.0, 0.95),
        );
        let imu = [ImuSample::from_raw([ONE_G, 0.0, ONE_G, 0.0, 0.0, 0.0])];
        let state = fusion.process(&imu, &gps(), &mag(), &baro()).unwrap();
        assert!((state.roll - 45.0).abs() < 1e-2, "roll = {}", state.roll);
        assert!(state.pitch.abs() < 1e-2, "pitch = {}", state.pitch);
    }

    #[test]
    fn gyro_rate_is_integrated() {
        let mut fusion = SensorFusion::new(untilted_config().with_alphas(1.0, 0.95));
        // 131 LSB = 1 °/s on the roll axis
        let imu = [ImuSample::from_raw([0.0, 0.0, ONE_G, 131.0, 0.0, 0.0])];
        let state = fusion.process(&imu, &gps(), &mag(), &baro()).unwrap();
        assert!((state.roll - 0.01).abs() < 1e-4, "roll = {}", state.roll);
    }

    #[test]
    fn yaw_rate_reports_gyro_z() {
        let mut fusion = SensorFusion::new(untilted_config());
        let imu = [ImuSample::from_raw([0.0, 0.0, ONE_G, 0.0, 0.0, 1310.0])];
        let state = fusion.process(&imu, &gps(), &mag(), &baro()).unwrap();
        assert!((state.yaw_rate - 10.0).abs() < 1e-3);
    }

    #[test]
    fn reset_zeroes_prior() {
        let mut fusion = SensorFusion::new(untilted_config());
        let imu = [ImuSample::from_raw([0.0, ONE_G, 0.0, 0.0, 0.0, 0.0])];
        fusion.process(&imu, &gps(), &mag(), &baro()).unwrap();
        assert!(fusion.state().roll > 0.0);

        fusion.reset();
        assert_eq!(fusion.state(), &FusionState::default());
    }
}
