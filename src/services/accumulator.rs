// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trusted distance accumulation from a stream of position samples.
//!
//! Each new sample forms a segment with the last *accepted* sample. Segments
//! failing the per-kind plausibility filter are dropped and the reference
//! point stays where it was.

use crate::models::GeoSample;
use crate::services::geodesic::haversine_meters;

/// Per-segment plausibility limits for one activity kind.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SegmentFilter {
    /// Reject a segment when the new fix reports a larger accuracy radius (m)
    pub max_accuracy_meters: Option<f64>,
    /// Reject a segment at least this long, treated as a GPS teleport (m)
    pub max_segment_meters: Option<f64>,
}

impl SegmentFilter {
    /// Filter that admits every well-formed segment.
    pub const fn unrestricted() -> Self {
        Self {
            max_accuracy_meters: None,
            max_segment_meters: None,
        }
    }

    fn check(&self, sample: &GeoSample, segment_meters: f64) -> Result<(), SampleDrop> {
        if let Some(ceiling) = self.max_accuracy_meters {
            if sample.accuracy_meters > ceiling {
                return Err(SampleDrop::LowAccuracy);
            }
        }
        if let Some(cap) = self.max_segment_meters {
            if segment_meters >= cap {
                return Err(SampleDrop::DistanceJump);
            }
        }
        Ok(())
    }
}

/// Why a sample did not contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDrop {
    /// Coordinates or accuracy outside physical ranges
    Malformed,
    /// Accuracy radius above the kind's ceiling
    LowAccuracy,
    /// Segment longer than the kind's single-step cap
    DistanceJump,
}

/// Result of offering one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// First sample, stored as the reference point
    Anchored,
    /// Segment accepted and added to the running distance
    Accepted { segment_meters: f64 },
    Dropped(SampleDrop),
}

impl SampleOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, SampleOutcome::Dropped(_))
    }
}

/// Running trusted distance for one session.
#[derive(Debug, Clone)]
pub struct DistanceAccumulator {
    filter: SegmentFilter,
    last_accepted: Option<GeoSample>,
    distance_meters: f64,
    accepted: u32,
    dropped: u32,
}

impl DistanceAccumulator {
    pub fn new(filter: SegmentFilter) -> Self {
        Self {
            filter,
            last_accepted: None,
            distance_meters: 0.0,
            accepted: 0,
            dropped: 0,
        }
    }

    /// Offer the next sample.
    pub fn offer(&mut self, sample: GeoSample) -> SampleOutcome {
        let outcome = self.classify(&sample);
        match outcome {
            SampleOutcome::Anchored => {
                self.last_accepted = Some(sample);
                self.accepted += 1;
            }
            SampleOutcome::Accepted { segment_meters } => {
                self.distance_meters += segment_meters;
                self.last_accepted = Some(sample);
                self.accepted += 1;
            }
            SampleOutcome::Dropped(reason) => {
                self.dropped += 1;
                tracing::trace!(?reason, accuracy = sample.accuracy_meters, "Sample dropped");
            }
        }
        outcome
    }

    fn classify(&self, sample: &GeoSample) -> SampleOutcome {
        if !sample.is_well_formed() {
            return SampleOutcome::Dropped(SampleDrop::Malformed);
        }

        let Some(reference) = self.last_accepted else {
            return SampleOutcome::Anchored;
        };

        let segment_meters = haversine_meters(reference.point(), sample.point());
        match self.filter.check(sample, segment_meters) {
            Ok(()) => SampleOutcome::Accepted { segment_meters },
            Err(reason) => SampleOutcome::Dropped(reason),
        }
    }

    /// Cumulative trusted distance in meters.
    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    /// Reference point for the next segment.
    pub fn last_accepted(&self) -> Option<&GeoSample> {
        self.last_accepted.as_ref()
    }

    pub fn accepted_count(&self) -> u32 {
        self.accepted
    }

    pub fn dropped_count(&self) -> u32 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    const BIKE: SegmentFilter = SegmentFilter {
        max_accuracy_meters: Some(50.0),
        max_segment_meters: Some(1500.0),
    };

    /// Meters per degree of latitude on the 6371 km sphere.
    const METERS_PER_DEG_LAT: f64 = 111_194.926_644_558_73;

    fn sample_north_of(base: Instant, meters: f64, accuracy: f64, secs: u64) -> GeoSample {
        GeoSample::new(
            37.0 + meters / METERS_PER_DEG_LAT,
            -122.0,
            accuracy,
            base + Duration::from_secs(secs),
        )
    }

    #[test]
    fn test_first_sample_anchors_without_distance() {
        let t0 = Instant::now();
        let mut acc = DistanceAccumulator::new(BIKE);

        // Even a poor first fix anchors the session.
        let outcome = acc.offer(sample_north_of(t0, 0.0, 80.0, 0));

        assert_eq!(outcome, SampleOutcome::Anchored);
        assert_eq!(acc.distance_meters(), 0.0);
        assert!(acc.last_accepted().is_some());
    }

    #[test]
    fn test_accepts_plausible_segment() {
        let t0 = Instant::now();
        let mut acc = DistanceAccumulator::new(BIKE);
        acc.offer(sample_north_of(t0, 0.0, 5.0, 0));
        let outcome = acc.offer(sample_north_of(t0, 100.0, 5.0, 10));

        assert!(outcome.is_accepted());
        assert!((acc.distance_meters() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_accuracy_over_ceiling_is_dropped() {
        let t0 = Instant::now();
        let mut acc = DistanceAccumulator::new(BIKE);
        acc.offer(sample_north_of(t0, 0.0, 5.0, 0));

        let outcome = acc.offer(sample_north_of(t0, 50.0, 51.0, 5));
        assert_eq!(outcome, SampleOutcome::Dropped(SampleDrop::LowAccuracy));
        assert_eq!(acc.distance_meters(), 0.0);

        // Exactly at the ceiling is fine.
        let outcome = acc.offer(sample_north_of(t0, 50.0, 50.0, 6));
        assert!(outcome.is_accepted());
    }

    #[test]
    fn test_teleport_jump_is_dropped() {
        let t0 = Instant::now();
        let mut acc = DistanceAccumulator::new(BIKE);
        acc.offer(sample_north_of(t0, 0.0, 3.0, 0));

        let outcome = acc.offer(sample_north_of(t0, 1600.0, 3.0, 1));
        assert_eq!(outcome, SampleOutcome::Dropped(SampleDrop::DistanceJump));
        assert_eq!(acc.distance_meters(), 0.0);
    }

    #[test]
    fn test_rejected_sample_does_not_move_baseline() {
        let t0 = Instant::now();
        let mut acc = DistanceAccumulator::new(BIKE);
        acc.offer(sample_north_of(t0, 0.0, 5.0, 0));
        acc.offer(sample_north_of(t0, 1600.0, 5.0, 1));

        // Measured from the original anchor, not from the glitch.
        acc.offer(sample_north_of(t0, 200.0, 5.0, 30));
        assert!((acc.distance_meters() - 200.0).abs() < 0.01);
        assert_eq!(acc.accepted_count(), 2);
        assert_eq!(acc.dropped_count(), 1);
    }

    #[test]
    fn test_unrestricted_filter_counts_everything() {
        let t0 = Instant::now();
        let mut acc = DistanceAccumulator::new(SegmentFilter::unrestricted());
        acc.offer(sample_north_of(t0, 0.0, 500.0, 0));
        acc.offer(sample_north_of(t0, 5000.0, 500.0, 1));
        assert!((acc.distance_meters() - 5000.0).abs() < 0.01);
    }

    #[test]
    fn test_malformed_sample_dropped() {
        let t0 = Instant::now();
        let mut acc = DistanceAccumulator::new(SegmentFilter::unrestricted());
        let outcome = acc.offer(GeoSample::new(91.0, 0.0, 5.0, t0));
        assert_eq!(outcome, SampleOutcome::Dropped(SampleDrop::Malformed));
        assert!(acc.last_accepted().is_none());
    }

    #[test]
    fn test_distance_monotonic_over_noisy_track() {
        let t0 = Instant::now();
        let mut acc = DistanceAccumulator::new(BIKE);
        let offsets = [0.0, 30.0, 2000.0, 60.0, 40.0, 55.0, -1500.0, 90.0, 90.0];
        let accuracies = [5.0, 10.0, 5.0, 70.0, 5.0, 5.0, 5.0, 49.0, 5.0];

        let mut previous = 0.0;
        for (i, (m, a)) in offsets.iter().zip(accuracies).enumerate() {
            acc.offer(sample_north_of(t0, *m, a, i as u64));
            assert!(acc.distance_meters() >= previous);
            previous = acc.distance_meters();
        }
    }
}
