//! Client error types

use serde::Deserialize;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend has no resource for the request
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend answered with a non-success status
    #[error("API error ({status}, {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Unexpected or undecodable response payload
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error payload returned by the document API and identity service
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiErrorResponse {
    pub code: String,
    pub status: u16,
    pub message: String,
    pub user_message: String,
    pub more_info: String,
}

impl ClientError {
    /// Build an error from a non-success status and its raw body
    pub fn from_response(status: u16, body: &str, resource: &str) -> Self {
        if status == 404 {
            return Self::NotFound(resource.to_string());
        }

        match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(payload) if !payload.code.is_empty() => Self::Api {
                status,
                code: payload.code,
                message: payload.message,
            },
            _ => Self::Api {
                status,
                code: format!("HTTP{}", status),
                message: body.chars().take(256).collect(),
            },
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if the backend rejected the credentials or token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_error() {
        let body = r#"{
            "code": "file_not_found",
            "status": 404,
            "message": "File not found.",
            "userMessage": "The file could not be found.",
            "moreInfo": ""
        }"#;

        assert!(ClientError::from_response(404, body, "/a/b.txt").is_not_found());

        let body = r#"{"code":"invalid_credentials","status":401,"message":"Invalid credentials."}"#;
        match ClientError::from_response(401, body, "token") {
            ClientError::Api { status, code, message } => {
                assert_eq!(status, 401);
                assert_eq!(code, "invalid_credentials");
                assert_eq!(message, "Invalid credentials.");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_json_error_body() {
        let error = ClientError::from_response(502, "Bad Gateway", "/");
        assert!(!error.is_not_found());
        assert!(!error.is_unauthorized());
        assert!(!ClientError::from_response(400, "bad input", "/").is_unauthorized());
        assert!(ClientError::from_response(401, "", "/").is_unauthorized());
        assert!(ClientError::from_response(403, "", "/").is_unauthorized());
        match error {
            ClientError::Api { code, message, .. } => {
                assert_eq!(code, "HTTP502");
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }
}
