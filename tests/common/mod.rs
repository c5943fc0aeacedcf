// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use aura_tracker::config::Config;
use aura_tracker::middleware::auth::create_jwt;
use aura_tracker::routes::create_router;
use aura_tracker::services::{PointsLedger, VerificationGateway};
use aura_tracker::AppState;
use std::sync::Arc;

/// Meters per degree of latitude on the 6371 km sphere.
#[allow(dead_code)]
pub const METERS_PER_DEG_LAT: f64 = 111_194.926_644_558_73;

/// Create a test app with in-memory dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let gateway = VerificationGateway::new(config.policy(), PointsLedger::new());

    let state = Arc::new(AppState { config, gateway });

    (create_router(state.clone()), state)
}

/// Create a session token for `user_id`.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    create_jwt(user_id, signing_key).expect("Failed to create JWT")
}
