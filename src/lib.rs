// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Aura Tracker: verified sustainable-activity rewards.
//!
//! This crate turns a stream of noisy, possibly adversarial position samples
//! into an auditable decision: accept a walk or bike ride and award points,
//! or reject it with an enumerated reason. The same validation policy runs on
//! the reporting device and, authoritatively, behind the verification
//! gateway served here.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::VerificationGateway;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub gateway: VerificationGateway,
}
