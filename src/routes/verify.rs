// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Verification routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityKind, VerificationRequest, VerificationResponse};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Verification routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/verified-walk", post(verify_walk))
        .route("/api/verified-bike", post(verify_bike))
        .route("/api/verify", post(verify_any))
        .route("/api/points", get(get_points))
}

// ─── Submissions ─────────────────────────────────────────────

async fn verify_walk(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(request), _): WithRejection<Json<VerificationRequest>, AppError>,
) -> Result<Json<VerificationResponse>> {
    verify(&state, &user, ActivityKind::Walk, &request)
}

async fn verify_bike(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(request), _): WithRejection<Json<VerificationRequest>, AppError>,
) -> Result<Json<VerificationResponse>> {
    verify(&state, &user, ActivityKind::Bike, &request)
}

/// Generic endpoint; the kind must be in the body.
async fn verify_any(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(request), _): WithRejection<Json<VerificationRequest>, AppError>,
) -> Result<Json<VerificationResponse>> {
    let kind = request
        .kind
        .ok_or_else(|| AppError::BadRequest("Missing 'kind'".to_string()))?;
    verify(&state, &user, kind, &request)
}

fn verify(
    state: &AppState,
    user: &AuthUser,
    kind: ActivityKind,
    request: &VerificationRequest,
) -> Result<Json<VerificationResponse>> {
    tracing::debug!(
        user_id = %user.user_id,
        session_id = %request.session_id,
        %kind,
        "Verifying submission"
    );

    let decision = state.gateway.verify(&user.user_id, kind, request)?;
    Ok(Json(decision.into_response()))
}

// ─── Points ──────────────────────────────────────────────────

/// Current points for the authenticated user.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PointsResponse {
    pub user_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_points: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "Record<string, number>"))]
    pub points_by_kind: HashMap<ActivityKind, u64>,
    pub sessions_credited: usize,
}

async fn get_points(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<PointsResponse> {
    let account = state
        .gateway
        .ledger()
        .account(&user.user_id)
        .unwrap_or_default();

    Json(PointsResponse {
        user_id: user.user_id,
        total_points: account.total_points,
        points_by_kind: account.points_by_kind,
        sessions_credited: account.sessions.len(),
    })
}
