//! Error types for web handlers.
//!
//! [`AppError`] bridges [`MarketplaceError`] and HTTP responses. Every error
//! kind maps to one status code and one machine-readable code, rendered as a
//! JSON body `{code, message}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use marketplace_core::{ErrorKind, MarketplaceError};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Job>, AppError> {
///     let job = state.marketplace().jobs().get(&caller, job_id).await?;
///     Ok(Json(job))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<MarketplaceError>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message.into(), "UNAUTHENTICATED")
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message.into(), "NOT_FOUND")
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code of this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl From<MarketplaceError> for AppError {
    fn from(err: MarketplaceError) -> Self {
        let (status, code) = match err.kind() {
            ErrorKind::InvalidArgument => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            ErrorKind::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ErrorKind::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        };

        // Backend details stay in the logs.
        let message = if status.is_server_error() {
            "The service is temporarily unavailable, retry later".to_string()
        } else {
            err.to_string()
        };

        Self {
            status,
            message,
            code,
            source: Some(err),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    error = %source,
                    "Request failed"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Request failed"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_core::types::{JobId, JobStatus};

    #[test]
    fn test_error_display() {
        let err = AppError::not_found("metrics are disabled");
        assert_eq!(err.to_string(), "[NOT_FOUND] metrics are disabled");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_every_kind_has_one_status() {
        let cases = [
            (MarketplaceError::invalid("bad"), StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            (
                MarketplaceError::Unauthenticated("no token".into()),
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
            ),
            (MarketplaceError::forbidden("nope"), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (MarketplaceError::not_found("job", "x"), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                MarketplaceError::JobStatusConflict {
                    job_id: JobId::new(),
                    current: JobStatus::Accepted,
                    expected: JobStatus::Posted,
                },
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                MarketplaceError::Unavailable("pool timed out".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
            ),
        ];

        for (err, status, code) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status(), status);
            assert_eq!(app.code(), code);
        }
    }

    #[test]
    fn test_conflict_message_names_current_status() {
        let app: AppError = MarketplaceError::JobStatusConflict {
            job_id: JobId::new(),
            current: JobStatus::Completed,
            expected: JobStatus::InProgress,
        }
        .into();
        assert!(app.message.contains("is completed"));
    }

    #[test]
    fn test_unavailable_hides_backend_detail() {
        let app: AppError = MarketplaceError::Unavailable("connection refused at 10.0.0.3".into()).into();
        assert!(!app.message.contains("10.0.0.3"));
    }
}
