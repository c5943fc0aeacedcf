// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aura Tracker verification gateway
//!
//! Re-checks client-submitted activity summaries against the shared
//! validation policy before any points are credited.

use aura_tracker::{
    config::Config,
    services::{PointsLedger, VerificationGateway},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Aura Tracker gateway");

    let policy = config.policy();
    tracing::info!(
        walk_min_duration_secs = config.walk_min_duration_secs,
        walk_award_points = config.walk_award_points,
        bike_award_points = config.bike_award_points,
        "Validation policy loaded"
    );

    let gateway = VerificationGateway::new(policy, PointsLedger::new());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        gateway,
    });

    // Build router
    let app = aura_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("aura_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
