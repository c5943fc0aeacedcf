// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Position samples as delivered by a location source.

use geo::Point;
use tokio::time::Instant;

/// One timestamped position reading.
///
/// Immutable once produced. The accumulator consumes it and keeps at most the
/// last accepted sample as the reference for the next segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoSample {
    /// Latitude in degrees, [-90, 90]
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180]
    pub longitude: f64,
    /// Monotonic instant the fix was taken
    pub timestamp: Instant,
    /// Horizontal accuracy radius in meters
    pub accuracy_meters: f64,
}

impl GeoSample {
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: f64, timestamp: Instant) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            accuracy_meters,
        }
    }

    /// Position as a `geo` point (x = longitude, y = latitude).
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Whether coordinates and accuracy are within their physical ranges.
    pub fn is_well_formed(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && self.accuracy_meters.is_finite()
            && self.accuracy_meters >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_axis_order() {
        let s = GeoSample::new(37.33, -122.03, 5.0, Instant::now());
        let p = s.point();
        assert_eq!(p.x(), -122.03);
        assert_eq!(p.y(), 37.33);
    }

    #[test]
    fn test_well_formed_ranges() {
        let now = Instant::now();
        assert!(GeoSample::new(90.0, -180.0, 0.0, now).is_well_formed());
        assert!(!GeoSample::new(90.5, 0.0, 5.0, now).is_well_formed());
        assert!(!GeoSample::new(0.0, 181.0, 5.0, now).is_well_formed());
        assert!(!GeoSample::new(0.0, 0.0, -1.0, now).is_well_formed());
        assert!(!GeoSample::new(f64::NAN, 0.0, 5.0, now).is_well_formed());
    }
}
