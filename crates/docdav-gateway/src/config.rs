//! Gateway configuration

use docdav_client::Config as ClientConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gateway server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Document API base URL
    pub api_url: String,
    /// Identity service base URL
    pub idp_url: String,
    /// Serve from an in-memory document store (development only)
    pub use_memory_store: bool,
    /// Maximum number of cached tokens
    pub token_cache_capacity: usize,
    /// Tokens are treated as expired this many seconds early
    pub token_expiry_skew_secs: u64,
    /// Rate limit (requests per second per user)
    pub rate_limit_rps: u32,
    /// Maximum PUT body size (bytes)
    pub max_body_size: usize,
    /// Timeout for document API and identity service calls (seconds)
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            api_url: "http://localhost:8080".to_string(),
            idp_url: "http://localhost:8081".to_string(),
            use_memory_store: false,
            token_cache_capacity: 1024,
            token_expiry_skew_secs: 60,
            rate_limit_rps: 100,
            max_body_size: 512 * 1024 * 1024, // 512 MB
            request_timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Configuration for the document API and identity clients
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.api_url, &self.idp_url)
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_user_agent(format!("docdav/{}", env!("CARGO_PKG_VERSION")))
    }
}
