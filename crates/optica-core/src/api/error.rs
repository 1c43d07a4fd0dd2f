use thiserror::Error;

use super::classify::{self, BackendErrorKind};
use super::transport::TransportError;

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Not logged in")]
    SessionRequired,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("HTTP {status}: {message}")]
    ClientError { status: u16, message: String },

    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Database not available: {0}")]
    DatabaseUnavailable(String),

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        Self::from_response(status, body, false)
    }

    /// Map a non-success response to an error. 401 and 403 always map to
    /// auth failures. Otherwise the backend's structured error code wins over
    /// the status; with `legacy_markers`, bodies without a code are also
    /// sniffed for database failures.
    pub fn from_response(status: u16, body: &str, legacy_markers: bool) -> Self {
        let reported = classify::parse_error_body(body);
        let message = reported
            .message
            .clone()
            .map(|m| Self::truncate_body(&m))
            .unwrap_or_else(|| Self::truncate_body(body));

        match status {
            401 => return ApiError::Unauthorized,
            403 => return ApiError::AccessDenied(message),
            _ => {}
        }

        if reported.kind(legacy_markers, body) == Some(BackendErrorKind::DatabaseUnavailable) {
            return ApiError::DatabaseUnavailable(message);
        }

        match status {
            404 => ApiError::NotFound(message),
            400..=499 => ApiError::ClientError { status, message },
            500..=599 => ApiError::ServerError { status, message },
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// Transient failures worth another attempt: 5xx, timeouts and transport errors.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::ServerError { .. } | ApiError::Timeout { .. } | ApiError::Network(_)
        )
    }

    /// Failures that invalidate the stored credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized | ApiError::AccessDenied(_) | ApiError::SessionRequired
        )
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Build(msg) => ApiError::InvalidRequest(msg),
            other => ApiError::Network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(ApiError::from_status(401, ""), ApiError::Unauthorized));
        assert!(matches!(ApiError::from_status(403, "no"), ApiError::AccessDenied(_)));
        assert!(matches!(ApiError::from_status(404, "gone"), ApiError::NotFound(_)));
        assert!(matches!(
            ApiError::from_status(422, "bad"),
            ApiError::ClientError { status: 422, .. }
        ));
        assert!(matches!(
            ApiError::from_status(502, "proxy"),
            ApiError::ServerError { status: 502, .. }
        ));
    }

    #[test]
    fn test_client_error_message_is_status_prefixed() {
        let err = ApiError::from_status(400, r#"{"success":false,"message":"price is required"}"#);
        assert_eq!(err.to_string(), "HTTP 400: price is required");
    }

    #[test]
    fn test_structured_code_overrides_status() {
        let body = r#"{"success":false,"error":{"code":"DATABASE_UNAVAILABLE","message":"store offline"}}"#;
        let err = ApiError::from_response(503, body, false);
        assert!(matches!(err, ApiError::DatabaseUnavailable(ref m) if m == "store offline"));
    }

    #[test]
    fn test_auth_status_wins_over_database_markers() {
        let body = r#"{"success":false,"message":"MongoDB session lookup failed"}"#;
        assert!(matches!(ApiError::from_response(401, body, true), ApiError::Unauthorized));
        assert!(matches!(
            ApiError::from_response(403, body, true),
            ApiError::AccessDenied(_)
        ));

        let coded = r#"{"success":false,"error":{"code":"DATABASE_UNAVAILABLE","message":"x"}}"#;
        assert!(ApiError::from_response(401, coded, false).is_auth_failure());
        // Same body on a server error is still a database outage
        assert!(matches!(
            ApiError::from_response(500, body, true),
            ApiError::DatabaseUnavailable(_)
        ));
    }

    #[test]
    fn test_retryability() {
        assert!(ApiError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(ApiError::Network("reset".into()).is_retryable());
        assert!(ApiError::from_status(500, "").is_retryable());
        assert!(!ApiError::from_status(400, "").is_retryable());
        assert!(!ApiError::DatabaseUnavailable(String::new()).is_retryable());
        assert!(!ApiError::Unauthorized.is_retryable());
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "é".repeat(400);
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.contains("truncated, 800 total bytes"));
    }
}
