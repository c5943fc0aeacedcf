// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Great-circle distance on a spherical Earth.

use geo::{Distance, HaversineMeasure, Point};

/// Sphere radius used for all segment distances, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two points (x = longitude, y = latitude, degrees).
pub fn haversine_meters(a: Point<f64>, b: Point<f64>) -> f64 {
    HaversineMeasure::new(EARTH_RADIUS_METERS).distance(a, b)
}
