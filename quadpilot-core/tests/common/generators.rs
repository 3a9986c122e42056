//! Physics-aware sensor batch generators
//!
//! Produces raw IMU counts, magnetometer vectors, barometric pressure and
//! GPS fixes consistent with a chosen attitude, heading, yaw rate and
//! position. Headings are only exact while the vehicle is level.

use quadpilot_core::{
    batch::{BaroSample, GpsFix, ImuSample, MagSample, SensorBatch},
    constants::{
        physics::{BAROMETRIC_EXPONENT, BAROMETRIC_SCALE_M},
        sensors::{ACCEL_LSB_PER_G, GYRO_LSB_PER_DEG_S},
        METERS_PER_DEGREE, SEA_LEVEL_PRESSURE_PA,
    },
};

use super::harness::TestRng;

pub const HOME_LAT: f64 = 47.397_742;
pub const HOME_LON: f64 = 8.545_594;

/// Builder for one tick of consistent sensor data
#[derive(Debug, Clone, Copy)]
pub struct BatchBuilder {
    roll_deg: f32,
    pitch_deg: f32,
    heading_deg: f32,
    yaw_rate_deg_s: f32,
    latitude: f64,
    longitude: f64,
    altitude_m: f32,
    gps_altitude_m: Option<f32>,
    samples: usize,
    noise_lsb: f32,
    seed: u32,
}

impl BatchBuilder {
    /// Level, stationary, at the home coordinates and sea level
    pub fn level() -> Self {
        Self {
            roll_deg: 0.0,
            pitch_deg: 0.0,
            heading_deg: 0.0,
            yaw_rate_deg_s: 0.0,
            latitude: HOME_LAT,
            longitude: HOME_LON,
            altitude_m: 0.0,
            gps_altitude_m: None,
            samples: 1,
            noise_lsb: 0.0,
            seed: 7,
        }
    }

    pub fn roll(mut self, deg: f32) -> Self {
        self.roll_deg = deg;
        self
    }

    pub fn pitch(mut self, deg: f32) -> Self {
        self.pitch_deg = deg;
        self
    }

    pub fn heading(mut self, deg: f32) -> Self {
        self.heading_deg = deg;
        self
    }

    pub fn yaw_rate(mut self, deg_s: f32) -> Self {
        self.yaw_rate_deg_s = deg_s;
        self
    }

    /// Baro and GPS agree on `meters`
    pub fn altitude(mut self, meters: f32) -> Self {
        self.altitude_m = meters;
        self
    }

    /// GPS reports a different altitude than the barometer
    pub fn gps_altitude(mut self, meters: f32) -> Self {
        self.gps_altitude_m = Some(meters);
        self
    }

    /// Position offset from home in meters
    pub fn offset_from_home(mut self, north_m: f64, east_m: f64) -> Self {
        self.latitude = HOME_LAT + north_m / METERS_PER_DEGREE;
        self.longitude = HOME_LON + east_m / (METERS_PER_DEGREE * HOME_LAT.to_radians().cos());
        self
    }

    /// Burst of `n` samples per sensor
    pub fn samples(mut self, n: usize) -> Self {
        self.samples = n;
        self
    }

    /// Uniform accelerometer noise of ±`lsb` counts
    pub fn noise(mut self, lsb: f32, seed: u32) -> Self {
        self.noise_lsb = lsb;
        self.seed = seed;
        self
    }

    pub fn build(&self) -> SensorBatch {
        let mut rng = TestRng::new(self.seed);
        let mut batch = SensorBatch::new();

        let (roll, pitch) = (self.roll_deg.to_radians(), self.pitch_deg.to_radians());
        let accel = [
            -ACCEL_LSB_PER_G * pitch.sin(),
            ACCEL_LSB_PER_G * roll.sin() * pitch.cos(),
            ACCEL_LSB_PER_G * roll.cos() * pitch.cos(),
        ];
        let gyro_z = self.yaw_rate_deg_s * GYRO_LSB_PER_DEG_S;

        let heading = self.heading_deg.to_radians();
        let field = MagSample::new(0.25 * heading.cos(), -0.25 * heading.sin(), 0.4);

        let pressure = SEA_LEVEL_PRESSURE_PA
            * (1.0 - self.altitude_m / BAROMETRIC_SCALE_M).powf(1.0 / BAROMETRIC_EXPONENT);
        let gps_alt = self.gps_altitude_m.unwrap_or(self.altitude_m);

        for _ in 0..self.samples {
            let mut raw = [accel[0], accel[1], accel[2], 0.0, 0.0, gyro_z];
            if self.noise_lsb > 0.0 {
                for axis in raw.iter_mut().take(3) {
                    *axis += rng.gen_range(-self.noise_lsb, self.noise_lsb);
                }
            }
            batch.push_imu(ImuSample::from_raw(raw)).unwrap();
            batch.push_gps(GpsFix::new(self.latitude, self.longitude, gps_alt)).unwrap();
            batch.push_mag(field).unwrap();
            batch.push_baro(BaroSample::new(pressure, 20.0, 50.0)).unwrap();
        }
        batch
    }
}
