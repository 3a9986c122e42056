//! Per-Tick Sensor Batches
//!
//! Sensors are read in bursts between control ticks. A [`SensorBatch`]
//! collects everything that arrived since the previous tick, one bounded
//! sequence per sensor type:
//!
//! ```text
//! IMU   ──┐ [ax ay az gx gy gz] × n
//! GPS   ──┤ [lat lon alt]       × n
//! Mag   ──┼─→ SensorBatch ─→ SensorFusion::process_batch
//! Baro  ──┘ [P T RH]            × n
//! ```
//!
//! Capacities are fixed at [`MAX_SAMPLES_PER_TICK`]; pushing past it returns
//! [`PipelineError::BatchFull`] instead of allocating.

use heapless::Vec;

use crate::constants::buffers::MAX_SAMPLES_PER_TICK;
use crate::constants::sensors::{BARO_PRESSURE_MAX_PA, BARO_PRESSURE_MIN_PA};
use crate::errors::{PipelineError, PipelineResult, SensorKind};

/// One accelerometer + gyroscope reading in raw sensor counts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImuSample {
    /// Accelerometer x, y, z (LSB)
    pub accel: [f32; 3],
    /// Gyroscope x, y, z (LSB)
    pub gyro: [f32; 3],
}

impl ImuSample {
    /// Build from the six-value `[ax, ay, az, gx, gy, gz]` layout
    pub const fn from_raw(raw: [f32; 6]) -> Self {
        Self {
            accel: [raw[0], raw[1], raw[2]],
            gyro: [raw[3], raw[4], raw[5]],
        }
    }

    fn is_finite(&self) -> bool {
        self.accel.iter().chain(self.gyro.iter()).all(|v| v.is_finite())
    }
}

/// One GNSS position fix
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsFix {
    /// Latitude (degrees)
    pub latitude: f64,
    /// Longitude (degrees)
    pub longitude: f64,
    /// Altitude above mean sea level (m)
    pub altitude: f32,
}

impl GpsFix {
    /// Fix at the given coordinates
    pub const fn new(latitude: f64, longitude: f64, altitude: f32) -> Self {
        Self { latitude, longitude, altitude }
    }

    fn is_plausible(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One magnetometer reading (any consistent unit; only direction is used)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MagSample {
    /// Field x, y, z
    pub field: [f32; 3],
}

impl MagSample {
    /// Sample from its three components
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { field: [x, y, z] }
    }
}

/// One barometer reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaroSample {
    /// Static pressure (Pa)
    pub pressure_pa: f32,
    /// Sensor temperature (°C)
    pub temperature_c: f32,
    /// Relative humidity (%)
    pub humidity_pct: f32,
}

impl BaroSample {
    /// Sample from pressure, temperature and humidity
    pub const fn new(pressure_pa: f32, temperature_c: f32, humidity_pct: f32) -> Self {
        Self { pressure_pa, temperature_c, humidity_pct }
    }
}

/// Check every sequence the fusion stage needs
///
/// Empty sequences, non-finite values, implausible coordinates and
/// pressures outside the barometer's physical range are rejected.
pub fn validate_samples(
    imu: &[ImuSample],
    gps: &[GpsFix],
    mag: &[MagSample],
    baro: &[BaroSample],
) -> PipelineResult<()> {
    require_samples(imu.len(), SensorKind::Imu)?;
    require_samples(gps.len(), SensorKind::Gps)?;
    require_samples(mag.len(), SensorKind::Magnetometer)?;
    require_samples(baro.len(), SensorKind::Barometer)?;

    if !imu.iter().all(ImuSample::is_finite) {
        return Err(PipelineError::InvalidInput {
            sensor: SensorKind::Imu,
            reason: "non-finite reading",
        });
    }
    if !gps.iter().all(GpsFix::is_plausible) {
        return Err(PipelineError::InvalidInput {
            sensor: SensorKind::Gps,
            reason: "coordinates out of range",
        });
    }
    if !mag.iter().all(|m| m.field.iter().all(|v| v.is_finite())) {
        return Err(PipelineError::InvalidInput {
            sensor: SensorKind::Magnetometer,
            reason: "non-finite reading",
        });
    }
    let pressure_ok = |b: &BaroSample| {
        b.pressure_pa.is_finite()
            && (BARO_PRESSURE_MIN_PA..=BARO_PRESSURE_MAX_PA).contains(&b.pressure_pa)
    };
    if !baro.iter().all(pressure_ok) {
        return Err(PipelineError::InvalidInput {
            sensor: SensorKind::Barometer,
            reason: "pressure out of range",
        });
    }

    Ok(())
}

fn require_samples(len: usize, sensor: SensorKind) -> PipelineResult<()> {
    if len == 0 {
        Err(PipelineError::InvalidInput { sensor, reason: "no samples" })
    } else {
        Ok(())
    }
}

/// Everything the sensors produced since the previous tick
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorBatch {
    imu: Vec<ImuSample, MAX_SAMPLES_PER_TICK>,
    gps: Vec<GpsFix, MAX_SAMPLES_PER_TICK>,
    mag: Vec<MagSample, MAX_SAMPLES_PER_TICK>,
    baro: Vec<BaroSample, MAX_SAMPLES_PER_TICK>,
}

impl SensorBatch {
    /// Empty batch
    pub const fn new() -> Self {
        Self {
            imu: Vec::new(),
            gps: Vec::new(),
            mag: Vec::new(),
            baro: Vec::new(),
        }
    }

    /// Build a batch from slices, failing if any slice exceeds the capacity
    pub fn from_slices(
        imu: &[ImuSample],
        gps: &[GpsFix],
        mag: &[MagSample],
        baro: &[BaroSample],
    ) -> PipelineResult<Self> {
        let mut batch = Self::new();
        for &sample in imu {
            batch.push_imu(sample)?;
        }
        for &fix in gps {
            batch.push_gps(fix)?;
        }
        for &sample in mag {
            batch.push_mag(sample)?;
        }
        for &sample in baro {
            batch.push_baro(sample)?;
        }
        Ok(batch)
    }

    /// Append an IMU sample
    pub fn push_imu(&mut self, sample: ImuSample) -> PipelineResult<()> {
        self.imu.push(sample).map_err(|_| full(SensorKind::Imu))
    }

    /// Append a GPS fix
    pub fn push_gps(&mut self, fix: GpsFix) -> PipelineResult<()> {
        self.gps.push(fix).map_err(|_| full(SensorKind::Gps))
    }

    /// Append a magnetometer sample
    pub fn push_mag(&mut self, sample: MagSample) -> PipelineResult<()> {
        self.mag.push(sample).map_err(|_| full(SensorKind::Magnetometer))
    }

    /// Append a barometer sample
    pub fn push_baro(&mut self, sample: BaroSample) -> PipelineResult<()> {
        self.baro.push(sample).map_err(|_| full(SensorKind::Barometer))
    }

    /// IMU samples collected this tick
    pub fn imu(&self) -> &[ImuSample] {
        &self.imu
    }

    /// GPS fixes collected this tick
    pub fn gps(&self) -> &[GpsFix] {
        &self.gps
    }

    /// Magnetometer samples collected this tick
    pub fn mag(&self) -> &[MagSample] {
        &self.mag
    }

    /// Barometer samples collected this tick
    pub fn baro(&self) -> &[BaroSample] {
        &self.baro
    }

    /// Run the same checks fusion applies
    pub fn validate(&self) -> PipelineResult<()> {
        validate_samples(&self.imu, &self.gps, &self.mag, &self.baro)
    }

    /// Drop all samples, keeping the storage
    pub fn clear(&mut self) {
        self.imu.clear();
        self.gps.clear();
        self.mag.clear();
        self.baro.clear();
    }
}

fn full(sensor: SensorKind) -> PipelineError {
    PipelineError::BatchFull { sensor, capacity: MAX_SAMPLES_PER_TICK }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_batch() -> SensorBatch {
        SensorBatch::from_slices(
            &[ImuSample::from_raw([0.0, 0.0, 16_384.0, 0.0, 0.0, 0.0])],
            &[GpsFix::new(47.0, 8.0, 400.0)],
            &[MagSample::new(0.3, 0.0, 0.4)],
            &[BaroSample::new(101_325.0, 20.0, 40.0)],
        )
        .unwrap()
    }

    #[test]
    fn complete_batch_validates() {
        assert_eq!(level_batch().validate(), Ok(()));
    }

    #[test]
    fn empty_sequence_is_invalid_input() {
        let mut batch = level_batch();
        batch.baro.clear();
        assert_eq!(
            batch.validate(),
            Err(PipelineError::InvalidInput {
                sensor: SensorKind::Barometer,
                reason: "no samples",
            })
        );
    }

    #[test]
    fn non_finite_imu_is_rejected() {
        let mut batch = level_batch();
        batch.push_imu(ImuSample::from_raw([f32::NAN, 0.0, 0.0, 0.0, 0.0, 0.0])).unwrap();
        assert!(matches!(
            batch.validate(),
            Err(PipelineError::InvalidInput { sensor: SensorKind::Imu, .. })
        ));
    }

    #[test]
    fn implausible_pressure_is_rejected() {
        let mut batch = level_batch();
        batch.push_baro(BaroSample::new(0.0, 20.0, 40.0)).unwrap();
        assert!(matches!(
            batch.validate(),
            Err(PipelineError::InvalidInput { sensor: SensorKind::Barometer, .. })
        ));
    }

    #[test]
    fn push_past_capacity_fails() {
        let mut batch = SensorBatch::new();
        for _ in 0..MAX_SAMPLES_PER_TICK {
            batch.push_mag(MagSample::new(1.0, 0.0, 0.0)).unwrap();
        }
        assert_eq!(
            batch.push_mag(MagSample::new(1.0, 0.0, 0.0)),
            Err(PipelineError::BatchFull {
                sensor: SensorKind::Magnetometer,
                capacity: MAX_SAMPLES_PER_TICK,
            })
        );
    }

    #[test]
    fn clear_keeps_batch_reusable() {
        let mut batch = level_batch();
        batch.clear();
        assert!(batch.imu().is_empty());
        assert!(batch.gps().is_empty());
        batch.push_gps(GpsFix::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(batch.gps().len(), 1);
    }
}
