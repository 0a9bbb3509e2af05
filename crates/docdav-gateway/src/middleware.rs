//! HTTP middleware for authentication, rate limiting, etc.

use crate::auth::extract_basic_credentials;
use crate::error::ErrorKind;
use crate::state::UserSession;
use crate::{AppState, DavError};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};
use governor::{Quota, RateLimiter, state::keyed::DefaultKeyedStateStore};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Header carrying the per-request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Rate limiter type
pub type KeyedRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, governor::clock::DefaultClock>;

/// Create a rate limiter
pub fn create_rate_limiter(requests_per_second: u32) -> Arc<KeyedRateLimiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::keyed(quota))
}

/// How often keys with a fully replenished quota are dropped from the limiter
pub const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Drop limiter state for users that could not be throttled anyway
pub fn prune_rate_limiter(limiter: &KeyedRateLimiter) {
    limiter.retain_recent();
    limiter.shrink_to_fit();
}

/// Prune the limiter every `every` until it is dropped
pub fn spawn_rate_limiter_pruning(limiter: &Arc<KeyedRateLimiter>, every: Duration) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::warn!("No tokio runtime, rate limiter state will not be pruned");
        return;
    };

    let limiter = Arc::downgrade(limiter);
    runtime.spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(limiter) = limiter.upgrade() else {
                break;
            };
            prune_rate_limiter(&limiter);
        }
    });
}

/// Authentication middleware
///
/// Runs for every method and path. Requests without usable Basic credentials
/// never reach a handler.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, DavError> {
    let credentials = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_basic_credentials)
        .ok_or_else(|| DavError::unauthorized("missing or malformed Basic credentials"))?;

    let token = state.authenticator.authenticate(&credentials).await?;
    request.extensions_mut().insert(UserSession::from(token));

    Ok(next.run(request).await)
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<KeyedRateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, DavError> {
    let username = request
        .extensions()
        .get::<UserSession>()
        .map(|s| s.username.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    if limiter.check_key(&username).is_err() {
        return Err(DavError::new(
            ErrorKind::TooManyRequests,
            format!("rate limit exceeded for {}", username),
        ));
    }

    Ok(next.run(request).await)
}

/// Request ID middleware - adds the x-request-id header
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Request ID extension
#[derive(Clone)]
pub struct RequestId(pub String);

/// Logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone()).unwrap_or_default();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}
