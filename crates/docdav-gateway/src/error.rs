//! Error types and their WebDAV status mapping

use crate::xml::XmlError;
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use docdav_client::ClientError;
use thiserror::Error;

/// Challenge sent with every 401
pub const BASIC_CHALLENGE: &str = r#"Basic realm="WebDAV Server""#;

/// Error categories a request can end in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    BadRequest,
    CrossWorkspace,
    Forbidden,
    MethodNotAllowed,
    Conflict,
    PreconditionFailed,
    PayloadTooLarge,
    TooManyRequests,
    UpstreamFailure,
    PartialFailure,
    StreamFault,
    Internal,
    Unsupported,
}

impl ErrorKind {
    /// Get the kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::NotFound => "NotFound",
            Self::BadRequest => "BadRequest",
            Self::CrossWorkspace => "InvalidCrossWorkspaceOperation",
            Self::Forbidden => "Forbidden",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::Conflict => "Conflict",
            Self::PreconditionFailed => "PreconditionFailed",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::TooManyRequests => "TooManyRequests",
            Self::UpstreamFailure => "UpstreamFailure",
            Self::PartialFailure => "PartialFailure",
            Self::StreamFault => "StreamFault",
            Self::Internal => "Internal",
            Self::Unsupported => "Unsupported",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest | Self::CrossWorkspace => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamFailure | Self::PartialFailure | Self::StreamFault | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Unsupported => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

/// Gateway error type
#[derive(Error, Debug)]
pub enum DavError {
    #[error("{}: {message}", .kind.as_str())]
    Dav { kind: ErrorKind, message: String },

    #[error("Document API error: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Xml(#[from] XmlError),
}

impl DavError {
    /// Create a new error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Dav {
            kind,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn not_found(resource: impl std::fmt::Display) -> Self {
        Self::new(ErrorKind::NotFound, format!("{} not found", resource))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// A mutating sequence failed after `completed` had already changed the backend
    pub fn partial_failure(completed: &str, source: &ClientError) -> Self {
        Self::new(
            ErrorKind::PartialFailure,
            format!("{} succeeded, then failed: {}", completed, source),
        )
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Dav { kind, .. } => *kind,
            Self::Client(e) if e.is_not_found() => ErrorKind::NotFound,
            Self::Client(e) if e.is_unauthorized() => ErrorKind::Unauthorized,
            Self::Client(_) => ErrorKind::UpstreamFailure,
            Self::Xml(_) => ErrorKind::Internal,
        }
    }
}

impl IntoResponse for DavError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        match kind {
            ErrorKind::Unauthorized | ErrorKind::Unsupported => {}
            ErrorKind::UpstreamFailure | ErrorKind::PartialFailure | ErrorKind::Internal => {
                tracing::error!(kind = kind.as_str(), error = %self, "Request failed");
            }
            ErrorKind::StreamFault => {
                tracing::warn!(error = %self, "Transfer aborted");
            }
            _ => tracing::debug!(kind = kind.as_str(), error = %self, "Request rejected"),
        }

        // Clients never see internal detail, only the status
        let status = kind.status_code();
        if kind == ErrorKind::Unauthorized {
            return (status, [(header::WWW_AUTHENTICATE, BASIC_CHALLENGE)]).into_response();
        }
        status.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Unauthorized, 401)]
    #[case(ErrorKind::NotFound, 404)]
    #[case(ErrorKind::CrossWorkspace, 400)]
    #[case(ErrorKind::Forbidden, 403)]
    #[case(ErrorKind::MethodNotAllowed, 405)]
    #[case(ErrorKind::Conflict, 409)]
    #[case(ErrorKind::PreconditionFailed, 412)]
    #[case(ErrorKind::PayloadTooLarge, 413)]
    #[case(ErrorKind::PartialFailure, 500)]
    #[case(ErrorKind::StreamFault, 500)]
    #[case(ErrorKind::Unsupported, 501)]
    fn test_status_codes(#[case] kind: ErrorKind, #[case] status: u16) {
        assert_eq!(kind.status_code().as_u16(), status);
    }

    #[test]
    fn test_client_error_mapping() {
        let missing: DavError = ClientError::NotFound("/a".to_string()).into();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let failed: DavError = ClientError::Api {
            status: 502,
            code: "HTTP502".to_string(),
            message: "bad gateway".to_string(),
        }
        .into();
        assert_eq!(failed.kind(), ErrorKind::UpstreamFailure);

        let rejected: DavError = ClientError::Api {
            status: 401,
            code: "invalid_token".to_string(),
            message: "token revoked".to_string(),
        }
        .into();
        assert_eq!(rejected.kind(), ErrorKind::Unauthorized);
        assert_eq!(rejected.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unauthorized_response_has_challenge() {
        let response = DavError::unauthorized("no credentials").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            BASIC_CHALLENGE
        );

        let response = DavError::not_found("/secret/path").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
