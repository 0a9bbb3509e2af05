//! WebDAV method handlers

pub mod collection;
pub mod file;
pub mod service;
pub mod transfer;

use crate::path::DavPath;
use crate::resolver::PathResolver;
use crate::state::UserSession;
use crate::{AppState, DavError, ErrorKind};
use axum::{
    body::Body,
    extract::{Extension, State},
    http::{HeaderMap, Method, Request},
    response::Response,
};
use docdav_client::DocumentApi;
use std::sync::Arc;

/// Everything a handler needs for one request
pub struct DavContext {
    pub state: Arc<AppState>,
    pub session: UserSession,
    pub path: DavPath,
    pub headers: HeaderMap,
}

impl DavContext {
    pub fn documents(&self) -> &dyn DocumentApi {
        self.state.documents.as_ref()
    }

    pub fn token(&self) -> &str {
        &self.session.access_token
    }

    /// Path resolver bound to this request's token
    pub fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(self.documents(), self.token())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Route an authenticated request to its method handler
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<UserSession>,
    request: Request<Body>,
) -> Result<Response, DavError> {
    let method = request.method().clone();
    if method == Method::OPTIONS {
        return Ok(service::options());
    }

    let (parts, body) = request.into_parts();
    let ctx = DavContext {
        state,
        session,
        path: DavPath::parse(parts.uri.path())?,
        headers: parts.headers,
    };

    let result = match method.as_str() {
        "GET" => file::get(&ctx).await,
        "HEAD" => file::head(&ctx).await,
        "PUT" => file::put(&ctx, body).await,
        "DELETE" => file::delete(&ctx).await,
        "MKCOL" => collection::mkcol(&ctx).await,
        "PROPFIND" => collection::propfind(&ctx).await,
        "COPY" => transfer::copy(&ctx).await,
        "MOVE" => transfer::move_entity(&ctx).await,
        _ => Err(service::unsupported(&method)),
    };

    // The document API rejected the cached token; the next request exchanges again
    if result.as_ref().is_err_and(|e| e.kind() == ErrorKind::Unauthorized) {
        ctx.state.authenticator.evict(&ctx.session.username);
    }

    result
}
