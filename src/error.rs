// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gateway error types with consistent API responses.
//!
//! Policy rejections are not errors; they are returned as a normal
//! verification response. These variants cover requests the gateway refuses
//! to evaluate at all.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Reasons the gateway refuses a request before running the policy.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Submission does not belong to the authenticated user")]
    Forbidden,

    #[error("Malformed submission: {0}")]
    InvalidSubmission(#[from] validator::ValidationErrors),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// Unreadable bodies become a 400 with a fixed description; the parser's own
/// message stays in the logs.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        let details = match rejection {
            JsonRejection::JsonDataError(_) => "body does not match the submission shape",
            JsonRejection::JsonSyntaxError(_) => "body is not valid JSON",
            JsonRejection::MissingJsonContentType(_) => "expected Content-Type: application/json",
            _ => "unreadable request body",
        };
        AppError::BadRequest(details.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::InvalidSubmission(_) | AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "bad_request")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();
        let details = match &self {
            AppError::InvalidSubmission(_) | AppError::BadRequest(_) => Some(self.to_string()),
            _ => None,
        };

        if status == StatusCode::FORBIDDEN {
            tracing::warn!(error = %self, "Refused submission");
        }

        (status, Json(ErrorBody { error, details })).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Unauthorized.status_and_code().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::InvalidToken.status_and_code(),
            (StatusCode::UNAUTHORIZED, "invalid_token")
        );
        assert_eq!(
            AppError::Forbidden.status_and_code(),
            (StatusCode::FORBIDDEN, "forbidden")
        );
        assert_eq!(
            AppError::BadRequest("Missing 'kind'".to_string()).status_and_code(),
            (StatusCode::BAD_REQUEST, "bad_request")
        );
    }
}
