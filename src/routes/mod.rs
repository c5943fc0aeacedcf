// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod verify;

use crate::middleware::auth::require_auth;
use crate::models::ActivityKind;
use crate::services::KindThresholds;
use crate::AppState;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Thresholds the gateway enforces for one kind, so clients can confirm
/// their local policy is in lockstep.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PolicyInfo {
    pub min_duration_s: u64,
    pub min_distance_m: u64,
    pub min_speed_kmh: Option<f64>,
    pub max_speed_kmh: Option<f64>,
    pub award_points: u32,
}

impl From<&KindThresholds> for PolicyInfo {
    fn from(t: &KindThresholds) -> Self {
        Self {
            min_duration_s: t.min_duration_secs,
            min_distance_m: t.min_distance_meters,
            min_speed_kmh: t.speed_band.map(|b| b.min_kmh),
            max_speed_kmh: t.speed_band.map(|b| b.max_kmh),
            award_points: t.award_points,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
    pub walk: PolicyInfo,
    pub bike: PolicyInfo,
}

/// Liveness plus the active validation policy.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let policy = state.gateway.policy();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id: option_env!("BUILD_ID").unwrap_or("unknown").to_string(),
        walk: policy.thresholds(ActivityKind::Walk).into(),
        bike: policy.thresholds(ActivityKind::Bike).into(),
    })
}

/// Hosts allowed from plain http during development, on any port.
const DEV_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

/// Whether a browser origin may call the gateway with credentials.
///
/// The configured frontend must match exactly. Development hosts must match
/// the whole host, so `http://localhost.example.com` is refused.
pub fn is_allowed_origin(origin: &str, frontend_url: &str) -> bool {
    if origin == frontend_url {
        return true;
    }
    let Some(authority) = origin.strip_prefix("http://") else {
        return false;
    };
    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    };
    let port_ok = match port {
        Some(port) => !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()),
        None => true,
    };
    DEV_HOSTS.contains(&host) && port_ok
}

fn cors_layer(frontend_url: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &axum::http::request::Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| is_allowed_origin(origin, &frontend_url))
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Build the gateway router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new().route("/health", get(health_check));

    // Every submission and ledger read needs a session token.
    let protected_routes =
        verify::routes().route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors_layer(state.config.frontend_url.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
