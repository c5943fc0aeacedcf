// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity validation policy.
//!
//! A pure function from a frozen [`ActivitySummary`] to accept/reject. The
//! device uses it for immediate feedback and the gateway re-runs it as the
//! authoritative check, so both sides must build it from the same thresholds.
//!
//! Checks run in order and the first failure wins:
//! 1. duration or distance below the kind's minimum -> too short
//! 2. average speed outside the kind's band -> speed implausible
//! 3. otherwise accepted with the kind's fixed award

use crate::models::{ActivityKind, ActivitySummary};
use crate::services::accumulator::SegmentFilter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Walk minimum duration; a demo-sized threshold.
pub const DEFAULT_WALK_MIN_DURATION_SECS: u64 = 10;
pub const DEFAULT_WALK_AWARD_POINTS: u32 = 2;
pub const DEFAULT_BIKE_AWARD_POINTS: u32 = 2;

/// Inclusive average-speed band in km/h.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedBand {
    pub min_kmh: f64,
    pub max_kmh: f64,
}

impl SpeedBand {
    pub fn contains(&self, speed_kmh: f64) -> bool {
        speed_kmh >= self.min_kmh && speed_kmh <= self.max_kmh
    }
}

/// Thresholds owned by one activity kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindThresholds {
    pub min_duration_secs: u64,
    pub min_distance_meters: u64,
    pub speed_band: Option<SpeedBand>,
    pub segment_filter: SegmentFilter,
    pub award_points: u32,
}

impl KindThresholds {
    pub fn walk() -> Self {
        Self {
            min_duration_secs: DEFAULT_WALK_MIN_DURATION_SECS,
            min_distance_meters: 0,
            speed_band: None,
            segment_filter: SegmentFilter::unrestricted(),
            award_points: DEFAULT_WALK_AWARD_POINTS,
        }
    }

    pub fn bike() -> Self {
        Self {
            min_duration_secs: 600,
            min_distance_meters: 2000,
            speed_band: Some(SpeedBand {
                min_kmh: 8.0,
                max_kmh: 35.0,
            }),
            segment_filter: SegmentFilter {
                max_accuracy_meters: Some(50.0),
                max_segment_meters: Some(1500.0),
            },
            award_points: DEFAULT_BIKE_AWARD_POINTS,
        }
    }
}

/// Enumerated rejection reasons shared by device and gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    TooShort,
    SpeedImplausible,
    /// Submitted speed disagrees with submitted distance and duration
    InconsistentSummary,
}

impl RejectionReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::TooShort => "too_short",
            RejectionReason::SpeedImplausible => "speed_implausible",
            RejectionReason::InconsistentSummary => "inconsistent_summary",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RejectionReason::TooShort => "too short",
            RejectionReason::SpeedImplausible => "speed implausible for activity",
            RejectionReason::InconsistentSummary => "submitted summary is internally inconsistent",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "too_short" => Some(RejectionReason::TooShort),
            "speed_implausible" => Some(RejectionReason::SpeedImplausible),
            "inconsistent_summary" => Some(RejectionReason::InconsistentSummary),
            _ => None,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of evaluating a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Accepted { awarded_points: u32 },
    Rejected { reason: RejectionReason },
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted { .. })
    }
}

/// Per-kind thresholds and the classification over them.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationPolicy {
    walk: KindThresholds,
    bike: KindThresholds,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::new(KindThresholds::walk(), KindThresholds::bike())
    }
}

impl ValidationPolicy {
    pub fn new(walk: KindThresholds, bike: KindThresholds) -> Self {
        Self { walk, bike }
    }

    pub fn thresholds(&self, kind: ActivityKind) -> &KindThresholds {
        match kind {
            ActivityKind::Walk => &self.walk,
            ActivityKind::Bike => &self.bike,
        }
    }

    /// Per-segment filter the session's accumulator should apply.
    pub fn segment_filter(&self, kind: ActivityKind) -> SegmentFilter {
        self.thresholds(kind).segment_filter
    }

    /// Classify a frozen summary.
    pub fn evaluate(&self, summary: &ActivitySummary) -> ValidationResult {
        let t = self.thresholds(summary.kind);

        // Zero duration never reaches a speed computation.
        if summary.duration_s == 0
            || summary.duration_s < t.min_duration_secs
            || summary.distance_m < t.min_distance_meters
        {
            return ValidationResult::Rejected {
                reason: RejectionReason::TooShort,
            };
        }

        if let Some(band) = t.speed_band {
            if !band.contains(summary.avg_speed_kmh) {
                return ValidationResult::Rejected {
                    reason: RejectionReason::SpeedImplausible,
                };
            }
        }

        ValidationResult::Accepted {
            awarded_points: t.award_points,
        }
    }
}
