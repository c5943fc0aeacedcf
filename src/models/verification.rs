// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire types exchanged with the verification gateway.

use crate::models::activity::{ActivityKind, ActivitySummary};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Submission of a frozen session summary.
///
/// Deliberately carries no "accepted" flag: the gateway decides.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerificationRequest {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    /// Client-generated session identifier, the idempotency key for crediting
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub distance_m: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration_s: u64,
    #[validate(range(min = 0.0))]
    pub avg_speed_kmh: f64,
    /// Required on the generic endpoint, implied by path on the per-kind ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ActivityKind>,
}

impl VerificationRequest {
    pub fn new(user_id: &str, session_id: &str, summary: &ActivitySummary) -> Self {
        Self {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            distance_m: summary.distance_m,
            duration_s: summary.duration_s,
            avg_speed_kmh: summary.avg_speed_kmh,
            kind: Some(summary.kind),
        }
    }

    /// The tuple the policy re-evaluates, taken verbatim from the submission.
    pub fn summary(&self, kind: ActivityKind) -> ActivitySummary {
        ActivitySummary {
            kind,
            distance_m: self.distance_m,
            duration_s: self.duration_s,
            avg_speed_kmh: self.avg_speed_kmh,
        }
    }
}

/// Gateway response for a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerificationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awarded_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub new_total_points: Option<u64>,
    /// Human-readable rejection reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Stable rejection code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    /// Set when this session had already been credited
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> VerificationRequest {
        VerificationRequest {
            user_id: "user-1".to_string(),
            session_id: "session-1".to_string(),
            distance_m: 2001,
            duration_s: 601,
            avg_speed_kmh: 11.98,
            kind: None,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_empty_user_id_rejected() {
        let mut r = request();
        r.user_id = String::new();
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_negative_speed_rejected() {
        let mut r = request();
        r.avg_speed_kmh = -1.0;
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_negative_distance_does_not_deserialize() {
        let body = r#"{"user_id":"u","session_id":"s","distance_m":-5,"duration_s":10,"avg_speed_kmh":1.0}"#;
        assert!(serde_json::from_str::<VerificationRequest>(body).is_err());
    }

    #[test]
    fn test_response_omits_empty_fields() {
        let resp = VerificationResponse {
            success: false,
            awarded_points: None,
            new_total_points: None,
            reason: Some("too short".to_string()),
            reason_code: Some("too_short".to_string()),
            duplicate: false,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "reason": "too short", "reason_code": "too_short"})
        );
    }
}
