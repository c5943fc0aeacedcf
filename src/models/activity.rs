// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity kinds and the frozen summary a tracking session produces.

use crate::time_utils::{speed_kmh, whole_seconds};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of verified activity. Each kind carries its own policy thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Walk,
    Bike,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Walk => "walk",
            ActivityKind::Bike => "bike",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final (distance, duration, average speed) tuple of a stopped session.
///
/// This is exactly what gets submitted and what the policy evaluates, on
/// either side of the trust boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub kind: ActivityKind,
    /// Trusted distance, rounded to whole meters
    pub distance_m: u64,
    /// Elapsed whole seconds
    pub duration_s: u64,
    /// Average speed in km/h, rounded to two decimals
    pub avg_speed_kmh: f64,
}

impl ActivitySummary {
    /// Freeze raw session measurements into the submitted shape.
    pub fn from_measurements(kind: ActivityKind, distance_meters: f64, elapsed: Duration) -> Self {
        let distance_m = if distance_meters.is_finite() && distance_meters > 0.0 {
            distance_meters.round() as u64
        } else {
            0
        };
        let duration_s = whole_seconds(elapsed);

        Self {
            kind,
            distance_m,
            duration_s,
            avg_speed_kmh: average_speed_kmh(distance_m, duration_s),
        }
    }
}

/// Average speed in km/h from meters and seconds, rounded to two decimals.
///
/// Zero duration yields 0 rather than dividing.
pub fn average_speed_kmh(distance_m: u64, duration_s: u64) -> f64 {
    speed_kmh(distance_m as f64, duration_s)
}
