//! Home Position Capture
//!
//! The first fixes after power-up are averaged into the home position that
//! RTL returns to. A running sum plus a count replaces an unbounded sample
//! buffer; once the required number of fixes has been seen the result is
//! frozen until [`HomeTracker::reset`].

use crate::state::{GeoPoint, VehicleState};

/// Captured launch point
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HomePosition {
    /// Latitude (degrees)
    pub latitude: f64,
    /// Longitude (degrees)
    pub longitude: f64,
    /// Fused altitude at capture (m)
    pub altitude: f32,
}

impl HomePosition {
    /// Horizontal position
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Averages the first `required` states into a home position
#[derive(Debug, Clone)]
pub struct HomeTracker {
    required: u8,
    count: u8,
    latitude_sum: f64,
    longitude_sum: f64,
    altitude_sum: f64,
    home: Option<HomePosition>,
}

impl HomeTracker {
    /// Tracker that captures after `required` fixes (at least one)
    pub fn new(required: u8) -> Self {
        Self {
            required: required.max(1),
            count: 0,
            latitude_sum: 0.0,
            longitude_sum: 0.0,
            altitude_sum: 0.0,
            home: None,
        }
    }

    /// Feed one tick's state
    ///
    /// Returns the home position on the tick it is captured, `None` on every
    /// other tick. Non-finite positions are skipped.
    pub fn observe(&mut self, state: &VehicleState) -> Option<HomePosition> {
        if self.home.is_some() || !state.position().is_finite() || !state.altitude.is_finite() {
            return None;
        }

        self.latitude_sum += state.latitude;
        self.longitude_sum += state.longitude;
        self.altitude_sum += state.altitude as f64;
        self.count += 1;

        if self.count < self.required {
            return None;
        }

        let n = self.count as f64;
        let home = HomePosition {
            latitude: self.latitude_sum / n,
            longitude: self.longitude_sum / n,
            altitude: (self.altitude_sum / n) as f32,
        };
        self.home = Some(home);
        Some(home)
    }

    /// Captured home, if any
    pub fn position(&self) -> Option<HomePosition> {
        self.home
    }

    /// Whether home has been captured
    pub fn is_set(&self) -> bool {
        self.home.is_some()
    }

    /// Fixes accumulated toward the next capture
    pub fn pending(&self) -> u8 {
        self.count
    }

    /// Forget home and start accumulating again
    pub fn reset(&mut self) {
        *self = Self::new(self.required);
    }
}
