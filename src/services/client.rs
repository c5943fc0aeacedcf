// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device-side submission to the verification gateway.
//!
//! Keeps "the network failed, try again" separate from "the policy said no":
//! the former is a [`SubmissionError`], the latter a successful
//! [`VerificationOutcome::Rejected`]. Resubmitting the same frozen summary is
//! always safe because the gateway credits each session at most once.

use crate::models::{ActivityKind, ActivitySummary, VerificationRequest, VerificationResponse};
use crate::services::policy::{RejectionReason, ValidationPolicy, ValidationResult};
use reqwest::StatusCode;
use std::time::Duration;

/// Submission failures, distinct from policy rejections.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Submission timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Gateway error (HTTP {0})")]
    Server(u16),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Submission refused (HTTP {0})")]
    Refused(u16),

    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),
}

impl SubmissionError {
    /// Whether resubmitting the same summary may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubmissionError::Timeout | SubmissionError::Network(_) | SubmissionError::Server(_)
        )
    }
}

/// Gateway verdict for a submitted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Credited {
        awarded_points: u32,
        new_total_points: u64,
        duplicate: bool,
    },
    Rejected(RejectionReason),
}

/// HTTP client for the verification gateway.
#[derive(Clone)]
pub struct SubmissionClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl SubmissionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SubmissionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn endpoint(&self, kind: ActivityKind) -> String {
        format!("{}/api/verified-{}", self.base_url, kind.as_str())
    }

    /// Evaluate locally, then submit only if the local policy accepts.
    ///
    /// The local verdict is advisory; the gateway's answer is what counts.
    pub async fn submit_verified(
        &self,
        policy: &ValidationPolicy,
        token: &str,
        user_id: &str,
        session_id: &str,
        summary: &ActivitySummary,
    ) -> Result<VerificationOutcome, SubmissionError> {
        if let ValidationResult::Rejected { reason } = policy.evaluate(summary) {
            tracing::info!(session_id, reason = reason.code(), "Rejected locally, not submitting");
            return Ok(VerificationOutcome::Rejected(reason));
        }
        self.submit(token, user_id, session_id, summary).await
    }

    /// Submit a frozen summary within the configured timeout.
    pub async fn submit(
        &self,
        token: &str,
        user_id: &str,
        session_id: &str,
        summary: &ActivitySummary,
    ) -> Result<VerificationOutcome, SubmissionError> {
        let body = VerificationRequest::new(user_id, session_id, summary);

        let result = tokio::time::timeout(self.timeout, async {
            let response = self
                .http
                .post(self.endpoint(summary.kind))
                .bearer_auth(token)
                .json(&body)
                .send()
                .await
                .map_err(map_transport_error)?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                return Err(SubmissionError::Unauthorized);
            }
            if status.is_server_error() {
                return Err(SubmissionError::Server(status.as_u16()));
            }
            if !status.is_success() {
                return Err(SubmissionError::Refused(status.as_u16()));
            }

            response
                .json::<VerificationResponse>()
                .await
                .map_err(map_transport_error)
        })
        .await;

        let response = result
            .unwrap_or(Err(SubmissionError::Timeout))
            .map_err(|e| {
                tracing::warn!(session_id, error = %e, "Submission failed");
                e
            })?;

        outcome_from_response(response)
    }
}

fn map_transport_error(e: reqwest::Error) -> SubmissionError {
    if e.is_timeout() {
        SubmissionError::Timeout
    } else if e.is_decode() {
        SubmissionError::MalformedResponse(e.to_string())
    } else {
        SubmissionError::Network(e.to_string())
    }
}

fn outcome_from_response(
    response: VerificationResponse,
) -> Result<VerificationOutcome, SubmissionError> {
    if response.success {
        return match (response.awarded_points, response.new_total_points) {
            (Some(awarded_points), Some(new_total_points)) => Ok(VerificationOutcome::Credited {
                awarded_points,
                new_total_points,
                duplicate: response.duplicate,
            }),
            _ => Err(SubmissionError::MalformedResponse(
                "success without points".to_string(),
            )),
        };
    }

    response
        .reason_code
        .as_deref()
        .and_then(RejectionReason::from_code)
        .map(VerificationOutcome::Rejected)
        .ok_or_else(|| {
            SubmissionError::MalformedResponse(format!(
                "unknown rejection reason {:?}",
                response.reason_code
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SubmissionError::Timeout.is_retryable());
        assert!(SubmissionError::Network("reset".to_string()).is_retryable());
        assert!(SubmissionError::Server(503).is_retryable());
        assert!(!SubmissionError::Unauthorized.is_retryable());
        assert!(!SubmissionError::Refused(400).is_retryable());
    }

    #[test]
    fn test_outcome_from_rejection() {
        let response = VerificationResponse {
            success: false,
            awarded_points: None,
            new_total_points: None,
            reason: Some("speed implausible for activity".to_string()),
            reason_code: Some("speed_implausible".to_string()),
            duplicate: false,
        };
        assert_eq!(
            outcome_from_response(response).unwrap(),
            VerificationOutcome::Rejected(RejectionReason::SpeedImplausible)
        );
    }

    #[test]
    fn test_outcome_unknown_reason_is_malformed() {
        let response = VerificationResponse {
            success: false,
            awarded_points: None,
            new_total_points: None,
            reason: Some("Something exploded".to_string()),
            reason_code: None,
            duplicate: false,
        };
        assert!(matches!(
            outcome_from_response(response),
            Err(SubmissionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_endpoint_per_kind() {
        let client = SubmissionClient::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint(ActivityKind::Bike),
            "http://localhost:8080/api/verified-bike"
        );
        assert_eq!(
            client.endpoint(ActivityKind::Walk),
            "http://localhost:8080/api/verified-walk"
        );
    }
}
