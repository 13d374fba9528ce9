use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Every terminal failure kind the tailoring pipeline can report.
/// Serialized verbatim into failure responses so callers can branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    // Validation
    MissingFile,
    EmptyFilename,
    BadExtension,
    FileTooLarge,
    MissingManualFields,
    BadUrlScheme,
    // Extraction
    NetworkFailure,
    EmptyContent,
    UnreadableResume,
    EmptyResume,
    // AI service
    AuthFailure,
    QuotaOrRateLimit,
    Timeout,
    MalformedResponse,
    Unavailable,
    // Storage
    StorageWriteFailure,
    StorageDeleteFailure,
    Cancelled,
}

impl ErrorKind {
    /// HTTP status used by the API layer when a failure of this kind is returned.
    pub fn http_status(self) -> StatusCode {
        match self {
            ErrorKind::MissingFile
            | ErrorKind::EmptyFilename
            | ErrorKind::BadExtension
            | ErrorKind::MissingManualFields
            | ErrorKind::BadUrlScheme => StatusCode::BAD_REQUEST,
            ErrorKind::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::EmptyContent | ErrorKind::UnreadableResume | ErrorKind::EmptyResume => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorKind::NetworkFailure | ErrorKind::MalformedResponse => StatusCode::BAD_GATEWAY,
            ErrorKind::QuotaOrRateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::AuthFailure
            | ErrorKind::StorageWriteFailure
            | ErrorKind::StorageDeleteFailure => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Cancelled => StatusCode::REQUEST_TIMEOUT,
        }
    }

    /// Whether the caller may reasonably retry the same request later.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::QuotaOrRateLimit
                | ErrorKind::Timeout
                | ErrorKind::Unavailable
                | ErrorKind::NetworkFailure
        )
    }
}

/// Handler-level error type for failures that never reach the pipeline.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_kinds_map_to_bad_request() {
        for kind in [
            ErrorKind::MissingFile,
            ErrorKind::EmptyFilename,
            ErrorKind::BadExtension,
            ErrorKind::MissingManualFields,
            ErrorKind::BadUrlScheme,
        ] {
            assert_eq!(kind.http_status(), StatusCode::BAD_REQUEST, "{kind:?}");
        }
    }

    #[test]
    fn test_quota_is_retryable_but_auth_is_not() {
        assert!(ErrorKind::QuotaOrRateLimit.is_retryable());
        assert!(!ErrorKind::AuthFailure.is_retryable());
        assert!(!ErrorKind::MalformedResponse.is_retryable());
    }

    #[test]
    fn test_error_kind_serializes_as_variant_name() {
        let json = serde_json::to_string(&ErrorKind::QuotaOrRateLimit).unwrap();
        assert_eq!(json, r#""QuotaOrRateLimit""#);
    }

    #[test]
    fn test_app_error_validation_status() {
        let response = AppError::Validation("bad form".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
