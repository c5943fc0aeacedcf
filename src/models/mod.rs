// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod ledger;
pub mod sample;
pub mod verification;

pub use activity::{ActivityKind, ActivitySummary};
pub use ledger::{CreditReceipt, PointsAccount};
pub use sample::GeoSample;
pub use verification::{VerificationRequest, VerificationResponse};
