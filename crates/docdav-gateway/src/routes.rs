//! HTTP route definitions

use crate::{AppState, handlers, middleware};
use axum::{Router, middleware as axum_middleware, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the main router
///
/// WebDAV methods such as PROPFIND have no axum method router, so every
/// request outside the service endpoints lands in the fallback and is
/// dispatched on the method string.
pub fn create_router(state: Arc<AppState>) -> Router {
    let rate_limiter = middleware::create_rate_limiter(state.config.rate_limit_rps);
    middleware::spawn_rate_limiter_pruning(&rate_limiter, middleware::RATE_LIMIT_PRUNE_INTERVAL);

    let dav = Router::new()
        .fallback(handlers::dispatch)
        // Apply middleware (last added runs first)
        .layer(axum_middleware::from_fn_with_state(
            rate_limiter,
            middleware::rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::auth_middleware,
        ))
        .with_state(state);

    Router::new()
        // Service endpoints, reachable without credentials
        .route("/v3/health", get(handlers::service::health_check))
        .route("/version", get(handlers::service::version))
        // WebDAV
        .fallback_service(dav)
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatewayConfig;
    use crate::auth::TokenIssuer;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use docdav_client::{ClientError, MemoryDocumentStore, Token};
    use tower::ServiceExt;

    struct StaticIssuer;

    #[async_trait]
    impl TokenIssuer for StaticIssuer {
        async fn exchange_password(&self, username: &str, password: &str) -> docdav_client::Result<Token> {
            if password != "pw" {
                return Err(ClientError::NotFound("token".to_string()));
            }
            Ok(Token {
                access_token: format!("token-{}", username),
                token_type: "Bearer".to_string(),
                expires_in: 3600,
                refresh_token: None,
            })
        }

        async fn exchange_refresh_token(&self, _refresh_token: &str) -> docdav_client::Result<Token> {
            Err(ClientError::NotFound("token".to_string()))
        }
    }

    fn router() -> Router {
        let state = AppState::from_parts(
            GatewayConfig::default(),
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(StaticIssuer),
        );
        create_router(Arc::new(state))
    }

    fn request_to(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    fn request(method: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri("/docs/");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_extension_methods_reach_dispatch() {
        // "bob:pw"
        let response = router().oneshot(request("PROPFIND", Some("Basic Ym9iOnB3"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key(middleware::REQUEST_ID_HEADER));

        let response = router().oneshot(request("PROPPATCH", Some("Basic Ym9iOnB3"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_service_endpoints_skip_auth() {
        let response = router().oneshot(request_to("GET", "/v3/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(middleware::REQUEST_ID_HEADER));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");

        let response = router().oneshot(request_to("GET", "/version")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(env!("CARGO_PKG_VERSION")));

        // Everything else still needs credentials
        let response = router().oneshot(request_to("GET", "/v3/other")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        // "bob:nope"
        let response = router().oneshot(request("OPTIONS", Some("Basic Ym9iOm5vcGU="))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
        assert!(response.headers().contains_key(middleware::REQUEST_ID_HEADER));

        let response = router().oneshot(request("OPTIONS", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
