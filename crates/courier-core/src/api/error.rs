use std::fmt;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use thiserror::Error;

use crate::storage::StorageError;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// A non-2xx response as the server sent it.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl ErrorResponse {
    /// Decode the body as JSON, if it is JSON
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Truncate the body to avoid logging excessive data
    fn truncated_body(&self) -> String {
        if self.body.len() <= MAX_ERROR_BODY_LENGTH {
            return self.body.clone();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !self.body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &self.body[..end],
            self.body.len()
        )
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {}", self.status, self.url)?;
        if !self.body.is_empty() {
            write!(f, ": {}", self.truncated_body())?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Could not read stored token: {0}")]
    Storage(#[from] StorageError),

    #[error("Stored token is not a valid header value")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Could not encode request body: {0}")]
    Encode(#[from] serde_qs::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(ErrorResponse),

    #[error("Access denied - token may be expired: {0}")]
    Forbidden(ErrorResponse),

    #[error("Resource not found: {0}")]
    NotFound(ErrorResponse),

    #[error("Request failed: {0}")]
    Status(ErrorResponse),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Offline: {0}")]
    Offline(#[source] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Could not build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ApiError {
    pub fn from_response(response: ErrorResponse) -> Self {
        match response.status.as_u16() {
            401 => ApiError::Unauthorized(response),
            403 => ApiError::Forbidden(response),
            404 => ApiError::NotFound(response),
            _ => ApiError::Status(response),
        }
    }

    /// The server response this error carries, if one was received
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            ApiError::Unauthorized(r)
            | ApiError::Forbidden(r)
            | ApiError::NotFound(r)
            | ApiError::Status(r) => Some(r),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.response().map(|r| r.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> ErrorResponse {
        ErrorResponse {
            status: StatusCode::from_u16(status).expect("valid status"),
            url: "http://127.0.0.1:3000/users".to_string(),
            headers: HeaderMap::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_from_response_classifies_status() {
        assert!(matches!(
            ApiError::from_response(response(401, "")),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_response(response(403, "")),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from_response(response(404, "")),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_response(response(500, "")),
            ApiError::Status(_)
        ));
        assert!(matches!(
            ApiError::from_response(response(302, "")),
            ApiError::Status(_)
        ));
    }

    #[test]
    fn test_response_is_attached() {
        let err = ApiError::from_response(response(404, r#"{"msg":"gone"}"#));
        let attached = err.response().expect("response attached");
        assert_eq!(attached.body, r#"{"msg":"gone"}"#);
        assert_eq!(attached.json(), Some(serde_json::json!({"msg": "gone"})));
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_display_truncates_long_bodies() {
        let long = "x".repeat(2000);
        let message = ApiError::from_response(response(500, &long)).to_string();
        assert!(message.contains("truncated, 2000 total bytes"));
        assert!(message.len() < 700);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let body = "é".repeat(400); // 800 bytes, 2 bytes per char
        let message = response(500, &body).to_string();
        assert!(message.contains("truncated, 800 total bytes"));
    }
}
