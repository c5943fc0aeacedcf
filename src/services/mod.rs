// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - validation engine and gateway.

pub mod accumulator;
pub mod client;
pub mod gateway;
pub mod geodesic;
pub mod ledger;
pub mod policy;
pub mod session;
pub mod tracker;

pub use accumulator::{DistanceAccumulator, SampleDrop, SampleOutcome, SegmentFilter};
pub use client::{SubmissionClient, SubmissionError, VerificationOutcome};
pub use gateway::{GatewayDecision, VerificationGateway};
pub use ledger::PointsLedger;
pub use policy::{KindThresholds, RejectionReason, ValidationPolicy, ValidationResult};
pub use session::{AcquisitionError, SessionState, StartError, TrackingSession};
pub use tracker::{ChannelLocationSource, LocationSource, SessionHandle, TrackerError};
