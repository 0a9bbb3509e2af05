//! Basic authentication and token exchange

use crate::DavError;
use crate::token_cache::{CachedToken, Lookup, TokenCache};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use docdav_client::{IdpClient, Token};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Username and password from a Basic `Authorization` header
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Extract credentials from a Basic `Authorization` header value
pub fn extract_basic_credentials(auth_header: &str) -> Option<Credentials> {
    let (scheme, encoded) = auth_header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    if username.is_empty() {
        return None;
    }

    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Keyed digest of a username/password pair
pub fn credential_fingerprint(key: &[u8; 32], credentials: &Credentials) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_keyed(key);
    hasher.update(credentials.username.as_bytes());
    hasher.update(b":");
    hasher.update(credentials.password.as_bytes());
    hasher.finalize()
}

/// Source of access tokens
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn exchange_password(&self, username: &str, password: &str) -> docdav_client::Result<Token>;

    async fn exchange_refresh_token(&self, refresh_token: &str) -> docdav_client::Result<Token>;
}

#[async_trait]
impl TokenIssuer for IdpClient {
    async fn exchange_password(&self, username: &str, password: &str) -> docdav_client::Result<Token> {
        IdpClient::exchange_password(self, username, password).await
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> docdav_client::Result<Token> {
        IdpClient::exchange_refresh_token(self, refresh_token).await
    }
}

/// Turns Basic credentials into a bearer token, through the cache when possible
pub struct Authenticator {
    issuer: Arc<dyn TokenIssuer>,
    cache: TokenCache,
    fingerprint_key: [u8; 32],
}

impl Authenticator {
    /// Create an authenticator with a per-process fingerprint key
    pub fn new(issuer: Arc<dyn TokenIssuer>, cache: TokenCache) -> Self {
        let seed = uuid::Uuid::new_v4();
        let fingerprint_key = blake3::derive_key("docdav 2024 token cache credential fingerprint", seed.as_bytes());
        Self {
            issuer,
            cache,
            fingerprint_key,
        }
    }

    /// The token cache
    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Authenticate credentials, returning a usable token
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<CachedToken, DavError> {
        let fingerprint = credential_fingerprint(&self.fingerprint_key, credentials);

        match self.cache.lookup(&credentials.username, &fingerprint) {
            Lookup::Fresh(token) => return Ok(token),
            Lookup::Stale(token) => {
                if let Some(refresh_token) = token.refresh_token.as_deref() {
                    match self.issuer.exchange_refresh_token(refresh_token).await {
                        Ok(token) => return Ok(self.store(credentials, fingerprint, token)),
                        Err(e) => {
                            debug!(user = %credentials.username, error = %e, "Token refresh failed, exchanging credentials");
                        }
                    }
                }
            }
            Lookup::Miss => {}
        }

        let token = self
            .issuer
            .exchange_password(&credentials.username, &credentials.password)
            .await
            .map_err(|e| {
                debug!(user = %credentials.username, error = %e, "Credential exchange failed");
                DavError::unauthorized("credential exchange rejected")
            })?;

        Ok(self.store(credentials, fingerprint, token))
    }

    /// Forget the cached token of a principal the document API no longer accepts
    pub fn evict(&self, principal: &str) {
        if self.cache.remove(principal).is_some() {
            debug!(user = %principal, "Evicted rejected token");
        }
    }

    fn store(&self, credentials: &Credentials, fingerprint: blake3::Hash, token: Token) -> CachedToken {
        let cached = CachedToken::from_token(&credentials.username, token, fingerprint, Utc::now());
        self.cache.insert(cached.clone());
        cached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use docdav_client::ClientError;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeIssuer {
        password_grants: AtomicUsize,
        refresh_grants: AtomicUsize,
        expires_in: i64,
    }

    #[async_trait]
    impl TokenIssuer for FakeIssuer {
        async fn exchange_password(&self, username: &str, password: &str) -> docdav_client::Result<Token> {
            let n = self.password_grants.fetch_add(1, Ordering::SeqCst);
            if password != "secret" {
                return Err(ClientError::Api {
                    status: 401,
                    code: "invalid_credentials".to_string(),
                    message: "Invalid credentials.".to_string(),
                });
            }
            Ok(Token {
                access_token: format!("{}-{}", username, n),
                token_type: "Bearer".to_string(),
                expires_in: self.expires_in,
                refresh_token: Some("refresh".to_string()),
            })
        }

        async fn exchange_refresh_token(&self, _refresh_token: &str) -> docdav_client::Result<Token> {
            self.refresh_grants.fetch_add(1, Ordering::SeqCst);
            Ok(Token {
                access_token: "refreshed".to_string(),
                token_type: "Bearer".to_string(),
                expires_in: 3600,
                refresh_token: None,
            })
        }
    }

    fn authenticator(issuer: Arc<FakeIssuer>) -> Authenticator {
        Authenticator::new(issuer, TokenCache::new(16, std::time::Duration::from_secs(60)))
    }

    fn credentials(password: &str) -> Credentials {
        Credentials {
            username: "alice".to_string(),
            password: password.to_string(),
        }
    }

    #[rstest]
    #[case("Basic YWxpY2U6c2VjcmV0", Some(("alice", "secret")))]
    #[case("basic YWxpY2U6c2VjcmV0", Some(("alice", "secret")))]
    #[case("Basic YWxpY2U6YTpi", Some(("alice", "a:b")))]
    #[case("Basic YWxpY2U6", Some(("alice", "")))]
    #[case("Basic OnNlY3JldA==", None)]
    #[case("Basic YWxpY2U=", None)]
    #[case("Basic !!!", None)]
    #[case("Bearer YWxpY2U6c2VjcmV0", None)]
    #[case("Basic", None)]
    fn test_extract_basic_credentials(#[case] header: &str, #[case] expected: Option<(&str, &str)>) {
        let parsed = extract_basic_credentials(header);
        let parsed = parsed.as_ref().map(|c| (c.username.as_str(), c.password.as_str()));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", credentials("secret"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("secret"));
    }

    #[tokio::test]
    async fn test_cached_after_first_exchange() {
        let issuer = Arc::new(FakeIssuer { expires_in: 3600, ..Default::default() });
        let auth = authenticator(Arc::clone(&issuer));

        let first = auth.authenticate(&credentials("secret")).await.unwrap();
        let second = auth.authenticate(&credentials("secret")).await.unwrap();
        assert_eq!(first.access_token, second.access_token);
        assert_eq!(issuer.password_grants.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_not_served_from_cache() {
        let issuer = Arc::new(FakeIssuer { expires_in: 3600, ..Default::default() });
        let auth = authenticator(Arc::clone(&issuer));

        auth.authenticate(&credentials("secret")).await.unwrap();
        let err = auth.authenticate(&credentials("wrong")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(issuer.password_grants.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        // Lifetime shorter than the skew: stale as soon as it is stored
        let issuer = Arc::new(FakeIssuer { expires_in: 10, ..Default::default() });
        let auth = authenticator(Arc::clone(&issuer));

        auth.authenticate(&credentials("secret")).await.unwrap();
        let token = auth.authenticate(&credentials("secret")).await.unwrap();
        assert_eq!(token.access_token, "refreshed");
        assert_eq!(issuer.refresh_grants.load(Ordering::SeqCst), 1);
        assert_eq!(issuer.password_grants.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_evicted_token_is_exchanged_again() {
        let issuer = Arc::new(FakeIssuer { expires_in: 3600, ..Default::default() });
        let auth = authenticator(Arc::clone(&issuer));

        let first = auth.authenticate(&credentials("secret")).await.unwrap();
        auth.evict("alice");
        assert!(auth.cache().is_empty());

        let second = auth.authenticate(&credentials("secret")).await.unwrap();
        assert_ne!(first.access_token, second.access_token);
        assert_eq!(issuer.password_grants.load(Ordering::SeqCst), 2);
    }
}
