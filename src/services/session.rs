// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracking session state machine.
//!
//! `Idle -> Tracking -> Stopped`. The session owns its accumulator and clock
//! outright; callers pass the current instant into every transition, which
//! keeps the machine deterministic and independent of any scheduler.

use crate::models::{ActivityKind, ActivitySummary, GeoSample};
use crate::services::accumulator::{DistanceAccumulator, SampleOutcome, SegmentFilter};
use crate::time_utils::{speed_kmh, whole_seconds};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Tracking,
    /// Terminal, reached by stop or cancel
    Stopped,
}

/// Location source acquisition failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AcquisitionError {
    #[error("location unavailable")]
    Unavailable,

    #[error("location permission denied")]
    PermissionDenied,
}

/// Why a session could not start. The session stays `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Location(#[from] AcquisitionError),

    #[error("session cannot start from state {0:?}")]
    InvalidState(SessionState),
}

/// Invalid stop on a session that never started or was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StopError {
    #[error("session was never started")]
    NotStarted,

    #[error("session was cancelled")]
    Cancelled,
}

/// Wall-clock span of a session, measured from start to now (or to stop).
///
/// Elapsed time does not depend on sample arrival: a stalled location
/// source must not stall the clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionClock {
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
}

impl SessionClock {
    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.stopped_at = None;
    }

    pub fn stop(&mut self, now: Instant) {
        if self.started_at.is_some() && self.stopped_at.is_none() {
            self.stopped_at = Some(now);
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(start) => self.stopped_at.unwrap_or(now).saturating_duration_since(start),
            None => Duration::ZERO,
        }
    }
}

/// Live snapshot for display while tracking.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SessionProgress {
    pub elapsed_s: u64,
    pub distance_m: f64,
    pub avg_speed_kmh: f64,
}

/// One user's attempt at a verified activity.
#[derive(Debug)]
pub struct TrackingSession {
    id: String,
    kind: ActivityKind,
    user_id: String,
    state: SessionState,
    clock: SessionClock,
    accumulator: DistanceAccumulator,
    summary: Option<ActivitySummary>,
    cancelled: bool,
}

impl TrackingSession {
    pub fn new(kind: ActivityKind, user_id: &str, filter: SegmentFilter) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            user_id: user_id.trim().to_string(),
            state: SessionState::Idle,
            clock: SessionClock::default(),
            accumulator: DistanceAccumulator::new(filter),
            summary: None,
            cancelled: false,
        }
    }

    /// Session identifier, used as the crediting idempotency key.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Check the caller identity without touching state.
    pub fn ensure_identity(&self) -> Result<(), StartError> {
        if self.user_id.is_empty() {
            return Err(StartError::NotAuthenticated);
        }
        Ok(())
    }

    /// `Idle -> Tracking`, given the outcome of acquiring the location source.
    pub fn start(
        &mut self,
        now: Instant,
        location: Result<(), AcquisitionError>,
    ) -> Result<(), StartError> {
        if self.state != SessionState::Idle {
            return Err(StartError::InvalidState(self.state));
        }
        self.ensure_identity()?;
        location?;

        self.clock.start(now);
        self.state = SessionState::Tracking;
        tracing::debug!(session_id = %self.id, kind = %self.kind, "Session tracking");
        Ok(())
    }

    /// Offer a sample. Ignored unless tracking.
    pub fn offer(&mut self, sample: GeoSample) -> Option<SampleOutcome> {
        if self.state != SessionState::Tracking {
            return None;
        }
        Some(self.accumulator.offer(sample))
    }

    /// Timer tick; returns the progress to display. Once stopped, elapsed
    /// time stays frozen.
    pub fn tick(&self, now: Instant) -> SessionProgress {
        self.progress(now)
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.clock.elapsed(now)
    }

    pub fn distance_meters(&self) -> f64 {
        self.accumulator.distance_meters()
    }

    pub fn progress(&self, now: Instant) -> SessionProgress {
        let elapsed_s = whole_seconds(self.elapsed(now));
        let distance_m = self.distance_meters();
        let avg_speed_kmh = speed_kmh(distance_m, elapsed_s);
        SessionProgress {
            elapsed_s,
            distance_m,
            avg_speed_kmh,
        }
    }

    /// `Tracking -> Stopped`, freezing the final summary.
    ///
    /// Repeated stops return the same frozen summary.
    pub fn stop(&mut self, now: Instant) -> Result<ActivitySummary, StopError> {
        match self.state {
            SessionState::Idle => Err(StopError::NotStarted),
            SessionState::Stopped if self.cancelled => Err(StopError::Cancelled),
            SessionState::Stopped => self.summary.ok_or(StopError::NotStarted),
            SessionState::Tracking => {
                self.clock.stop(now);
                let summary = ActivitySummary::from_measurements(
                    self.kind,
                    self.accumulator.distance_meters(),
                    self.clock.elapsed(now),
                );
                self.summary = Some(summary);
                self.state = SessionState::Stopped;

                tracing::info!(
                    session_id = %self.id,
                    kind = %self.kind,
                    distance_m = summary.distance_m,
                    duration_s = summary.duration_s,
                    avg_speed_kmh = summary.avg_speed_kmh,
                    accepted = self.accumulator.accepted_count(),
                    dropped = self.accumulator.dropped_count(),
                    "Session stopped"
                );
                Ok(summary)
            }
        }
    }

    /// Abort the session. Nothing is frozen for submission.
    pub fn cancel(&mut self, now: Instant) {
        if self.state == SessionState::Stopped {
            return;
        }
        self.clock.stop(now);
        self.state = SessionState::Stopped;
        self.cancelled = true;
        self.summary = None;
        tracing::info!(session_id = %self.id, kind = %self.kind, "Session cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::policy::{RejectionReason, ValidationPolicy, ValidationResult};

    const METERS_PER_DEG_LAT: f64 = 111_194.926_644_558_73;

    fn bike_session(user: &str) -> TrackingSession {
        let policy = ValidationPolicy::default();
        TrackingSession::new(
            ActivityKind::Bike,
            user,
            policy.segment_filter(ActivityKind::Bike),
        )
    }

    fn sample(t0: Instant, meters_north: f64, accuracy: f64, secs: u64) -> GeoSample {
        GeoSample::new(
            37.0 + meters_north / METERS_PER_DEG_LAT,
            -122.0,
            accuracy,
            t0 + Duration::from_secs(secs),
        )
    }

    #[test]
    fn test_start_requires_identity() {
        let mut session = bike_session("   ");
        let err = session.start(Instant::now(), Ok(())).unwrap_err();
        assert_eq!(err, StartError::NotAuthenticated);
        assert_eq!(err.to_string(), "not authenticated");
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_start_requires_location() {
        let mut session = bike_session("user-1");
        let err = session
            .start(Instant::now(), Err(AcquisitionError::Unavailable))
            .unwrap_err();
        assert_eq!(err.to_string(), "location unavailable");
        assert_eq!(session.state(), SessionState::Idle);

        // Still startable once the source is granted.
        session.start(Instant::now(), Ok(())).unwrap();
        assert_eq!(session.state(), SessionState::Tracking);
    }

    #[test]
    fn test_cannot_start_twice() {
        let mut session = bike_session("user-1");
        let now = Instant::now();
        session.start(now, Ok(())).unwrap();
        assert_eq!(
            session.start(now, Ok(())),
            Err(StartError::InvalidState(SessionState::Tracking))
        );
    }

    #[test]
    fn test_samples_ignored_outside_tracking() {
        let t0 = Instant::now();
        let mut session = bike_session("user-1");
        assert!(session.offer(sample(t0, 0.0, 5.0, 0)).is_none());

        session.start(t0, Ok(())).unwrap();
        assert!(session.offer(sample(t0, 0.0, 5.0, 1)).is_some());
        session.stop(t0 + Duration::from_secs(5)).unwrap();
        assert!(session.offer(sample(t0, 100.0, 5.0, 6)).is_none());
        assert_eq!(session.distance_meters(), 0.0);
    }

    #[test]
    fn test_clock_advances_without_samples() {
        let t0 = Instant::now();
        let mut session = bike_session("user-1");
        session.start(t0, Ok(())).unwrap();

        assert_eq!(session.tick(t0 + Duration::from_secs(30)).elapsed_s, 30);
        assert_eq!(session.progress(t0 + Duration::from_secs(45)).elapsed_s, 45);
    }

    #[test]
    fn test_tick_after_stop_is_frozen() {
        let t0 = Instant::now();
        let mut session = bike_session("user-1");
        session.start(t0, Ok(())).unwrap();
        session.stop(t0 + Duration::from_secs(20)).unwrap();

        assert_eq!(session.tick(t0 + Duration::from_secs(90)).elapsed_s, 20);
    }

    #[test]
    fn test_stop_freezes_summary() {
        let t0 = Instant::now();
        let mut session = bike_session("user-1");
        session.start(t0, Ok(())).unwrap();

        // 2400 m north in 200 m steps over 720 s
        for step in 0..=12u64 {
            session.offer(sample(t0, step as f64 * 200.0, 5.0, step * 60));
        }

        let summary = session.stop(t0 + Duration::from_secs(720)).unwrap();
        assert_eq!(summary.kind, ActivityKind::Bike);
        assert_eq!(summary.distance_m, 2400);
        assert_eq!(summary.duration_s, 720);
        assert_eq!(summary.avg_speed_kmh, 12.0);

        // Time passing after stop changes nothing.
        let again = session.stop(t0 + Duration::from_secs(9999)).unwrap();
        assert_eq!(again, summary);
        assert_eq!(session.elapsed(t0 + Duration::from_secs(9999)).as_secs(), 720);

        assert!(ValidationPolicy::default().evaluate(&summary).is_accepted());
    }

    #[test]
    fn test_stop_before_any_sample() {
        let t0 = Instant::now();
        let mut session = bike_session("user-1");
        session.start(t0, Ok(())).unwrap();
        let summary = session.stop(t0 + Duration::from_secs(900)).unwrap();

        assert_eq!(summary.distance_m, 0);
        assert_eq!(summary.avg_speed_kmh, 0.0);
        assert_eq!(
            ValidationPolicy::default().evaluate(&summary),
            ValidationResult::Rejected {
                reason: RejectionReason::TooShort
            }
        );
    }

    #[test]
    fn test_stop_without_start() {
        let mut session = bike_session("user-1");
        assert_eq!(session.stop(Instant::now()), Err(StopError::NotStarted));
    }

    #[test]
    fn test_cancel_discards_summary() {
        let t0 = Instant::now();
        let mut session = bike_session("user-1");
        session.start(t0, Ok(())).unwrap();
        session.cancel(t0 + Duration::from_secs(3));

        assert_eq!(session.state(), SessionState::Stopped);
        assert!(session.is_cancelled());
        assert_eq!(
            session.stop(t0 + Duration::from_secs(4)),
            Err(StopError::Cancelled)
        );
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(bike_session("a").id(), bike_session("a").id());
    }
}
