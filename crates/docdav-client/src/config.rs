//! Client configuration

use std::time::Duration;

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Document API base URL
    pub api_url: String,
    /// Identity service base URL
    pub idp_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            idp_url: "http://localhost:8081".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("docdav-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Create a new config with the given document API and identity service URLs
    pub fn new(api_url: impl Into<String>, idp_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            idp_url: idp_url.into(),
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
