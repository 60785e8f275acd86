use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shape used by the backend (`{"error": "..."}`)
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "message")]
    error: String,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut = (0..=MAX_ERROR_BODY_LENGTH)
                .rev()
                .find(|&i| body.is_char_boundary(i))
                .unwrap_or(0);
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        }
    }

    /// Prefer the backend's own `error` message when the body carries one
    fn describe_body(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if !parsed.error.trim().is_empty() => Self::truncate_body(parsed.error.trim()),
            _ => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let described = Self::describe_body(body);
        match status.as_u16() {
            400 | 409 | 422 => ApiError::BadRequest(described),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(described),
            404 => ApiError::NotFound(described),
            500..=599 => ApiError::ServerError(described),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, described)),
        }
    }

    /// Short message suitable for the status bar
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NetworkError(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::NetworkError(_) => {
                "Unable to reach the server. Check your connection.".to_string()
            }
            ApiError::NotFound(_) => "Not found.".to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::ServerError(_) => "The server had a problem. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(ApiError::from_status(StatusCode::UNAUTHORIZED, ""), ApiError::Unauthorized));
        assert!(matches!(ApiError::from_status(StatusCode::NOT_FOUND, "gone"), ApiError::NotFound(_)));
        assert!(matches!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_bad_request_uses_backend_message() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"error":"Invalid goals"}"#);
        match err {
            ApiError::BadRequest(msg) => assert_eq!(msg, "Invalid goals"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"error":"Invalid goals"}"#).user_message(),
            "Invalid goals"
        );
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.contains("truncated"));
        assert_eq!(ApiError::truncate_body("short"), "short");
    }
}
