//! Application state

use crate::auth::{Authenticator, TokenIssuer};
use crate::config::GatewayConfig;
use crate::token_cache::{CachedToken, TokenCache};
use docdav_client::{DocumentApi, DocumentClient, IdpClient, MemoryDocumentStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Document API (HTTP client or in-memory store)
    pub documents: Arc<dyn DocumentApi>,
    /// Credential authenticator with its token cache
    pub authenticator: Authenticator,
}

impl AppState {
    /// Create the application state from configuration
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let documents: Arc<dyn DocumentApi> = if config.use_memory_store {
            warn!("Storage mode: in-memory (NOT persistent - for development only)");
            Arc::new(MemoryDocumentStore::new())
        } else {
            info!("Storage mode: document API at {}", config.api_url);
            Arc::new(DocumentClient::new(config.client_config())?)
        };

        Self::with_documents(config, documents)
    }

    /// Create the application state around an existing document API
    pub fn with_documents(config: GatewayConfig, documents: Arc<dyn DocumentApi>) -> anyhow::Result<Self> {
        let issuer = Arc::new(IdpClient::new(config.client_config())?);
        Ok(Self::from_parts(config, documents, issuer))
    }

    /// Create the application state from its parts
    pub fn from_parts(
        config: GatewayConfig,
        documents: Arc<dyn DocumentApi>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        let cache = TokenCache::new(
            config.token_cache_capacity,
            Duration::from_secs(config.token_expiry_skew_secs),
        );

        Self {
            config,
            documents,
            authenticator: Authenticator::new(issuer, cache),
        }
    }
}

/// The authenticated caller of a request
#[derive(Clone, Debug)]
pub struct UserSession {
    /// Username from the Basic credentials
    pub username: String,
    /// Bearer token for document API calls
    pub access_token: String,
    /// Token expiration time
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl From<CachedToken> for UserSession {
    fn from(token: CachedToken) -> Self {
        Self {
            username: token.principal,
            access_token: token.access_token,
            expires_at: token.expires_at,
        }
    }
}
