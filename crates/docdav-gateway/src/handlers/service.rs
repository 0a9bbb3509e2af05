//! Service-level handlers (OPTIONS, unsupported methods, health and version)

use crate::error::{DavError, ErrorKind};
use axum::{
    Json,
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Methods advertised in `Allow`
pub const ALLOWED_METHODS: &str = "OPTIONS, GET, HEAD, PUT, DELETE, MKCOL, COPY, MOVE, PROPFIND, PROPPATCH";

/// OPTIONS - capability discovery, no path resolution
pub fn options() -> Response {
    (
        StatusCode::OK,
        [(header::ALLOW, ALLOWED_METHODS), (header::HeaderName::from_static("dav"), "1")],
    )
        .into_response()
}

/// PROPPATCH and any method outside the supported set
pub fn unsupported(method: &Method) -> DavError {
    DavError::new(ErrorKind::Unsupported, format!("{} is not supported", method))
}

/// GET /v3/health - liveness, no credentials required
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Build information reported by `/version`
#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// GET /version
pub async fn version() -> Json<VersionInfo> {
    Json(VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
