// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Verification gateway: the authoritative re-check before points move.
//!
//! Handles a submission in this order:
//! 1. Structural validation and identity match
//! 2. Re-run the validation policy on the submitted numbers
//! 3. Check the submitted speed agrees with distance and duration
//! 4. Credit the ledger at most once per session

use crate::error::{AppError, Result};
use crate::models::{
    ActivityKind, ActivitySummary, CreditReceipt, VerificationRequest, VerificationResponse,
};
use crate::services::ledger::PointsLedger;
use crate::services::policy::{RejectionReason, ValidationPolicy, ValidationResult};
use validator::Validate;

/// Slack for a speed rounded to two decimals.
const SPEED_ROUNDING_TOLERANCE_KMH: f64 = 0.01;

/// What the gateway decided for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayDecision {
    Credited(CreditReceipt),
    Rejected(RejectionReason),
}

impl GatewayDecision {
    pub fn into_response(self) -> VerificationResponse {
        match self {
            GatewayDecision::Credited(receipt) => VerificationResponse {
                success: true,
                awarded_points: Some(receipt.awarded_points),
                new_total_points: Some(receipt.new_total_points),
                reason: None,
                reason_code: None,
                duplicate: receipt.duplicate,
            },
            GatewayDecision::Rejected(reason) => VerificationResponse {
                success: false,
                awarded_points: None,
                new_total_points: None,
                reason: Some(reason.message().to_string()),
                reason_code: Some(reason.code().to_string()),
                duplicate: false,
            },
        }
    }
}

/// Policy plus ledger, behind the trust boundary.
#[derive(Clone)]
pub struct VerificationGateway {
    policy: ValidationPolicy,
    ledger: PointsLedger,
}

impl VerificationGateway {
    pub fn new(policy: ValidationPolicy, ledger: PointsLedger) -> Self {
        Self { policy, ledger }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn ledger(&self) -> &PointsLedger {
        &self.ledger
    }

    /// Verify a submission from `authenticated_user` and credit it if eligible.
    pub fn verify(
        &self,
        authenticated_user: &str,
        kind: ActivityKind,
        request: &VerificationRequest,
    ) -> Result<GatewayDecision> {
        request.validate()?;

        if request.user_id != authenticated_user {
            tracing::warn!(
                authenticated_user,
                claimed_user = %request.user_id,
                "Submission for a different user"
            );
            return Err(AppError::Forbidden);
        }

        if let Some(claimed) = request.kind {
            if claimed != kind {
                return Err(AppError::BadRequest(format!(
                    "kind '{}' does not match endpoint '{}'",
                    claimed, kind
                )));
            }
        }

        let summary = request.summary(kind);
        let decision = match self.policy.evaluate(&summary) {
            ValidationResult::Rejected { reason } => GatewayDecision::Rejected(reason),
            ValidationResult::Accepted { .. } if !speed_is_consistent(&summary) => {
                GatewayDecision::Rejected(RejectionReason::InconsistentSummary)
            }
            ValidationResult::Accepted { awarded_points } => GatewayDecision::Credited(
                self.ledger
                    .credit(&request.user_id, &request.session_id, kind, awarded_points),
            ),
        };

        if let GatewayDecision::Rejected(reason) = decision {
            tracing::info!(
                user_id = %request.user_id,
                session_id = %request.session_id,
                %kind,
                distance_m = summary.distance_m,
                duration_s = summary.duration_s,
                avg_speed_kmh = summary.avg_speed_kmh,
                reason = reason.code(),
                "Submission rejected"
            );
        }

        Ok(decision)
    }
}

/// Whether the submitted speed could have come from the submitted distance
/// and duration, allowing for two-decimal speed rounding and whole-meter
/// distance rounding.
fn speed_is_consistent(summary: &ActivitySummary) -> bool {
    if summary.duration_s == 0 {
        return summary.avg_speed_kmh == 0.0;
    }
    let duration = summary.duration_s as f64;
    let expected = summary.distance_m as f64 / duration * 3.6;
    let tolerance = SPEED_ROUNDING_TOLERANCE_KMH + 0.5 / duration * 3.6 + f64::EPSILON;
    (summary.avg_speed_kmh - expected).abs() <= tolerance
}
