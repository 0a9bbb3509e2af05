//! Identity service client (token exchange)

use crate::{ClientError, Config, Result, types::Token};
use reqwest::{Client, header};
use tracing::{debug, instrument};

const GRANT_TYPE_PASSWORD: &str = "password";
const GRANT_TYPE_REFRESH_TOKEN: &str = "refresh_token";

/// Client for the identity service token endpoint
pub struct IdpClient {
    config: Config,
    http: Client,
}

impl IdpClient {
    /// Create a new identity client
    pub fn new(config: Config) -> Result<Self> {
        url::Url::parse(&config.idp_url).map_err(|e| {
            ClientError::Config(format!("invalid identity service URL {}: {}", config.idp_url, e))
        })?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { config, http })
    }

    /// Exchange a username and password for a token
    #[instrument(skip(self, password))]
    pub async fn exchange_password(&self, username: &str, password: &str) -> Result<Token> {
        self.exchange(&[
            ("grant_type", GRANT_TYPE_PASSWORD),
            ("username", username),
            ("password", password),
        ])
        .await
    }

    /// Exchange a refresh token for a new token
    #[instrument(skip_all)]
    pub async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<Token> {
        self.exchange(&[
            ("grant_type", GRANT_TYPE_REFRESH_TOKEN),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn exchange(&self, form: &[(&str, &str)]) -> Result<Token> {
        let url = format!("{}/v2/token", self.config.idp_url.trim_end_matches('/'));
        debug!("Sending token exchange request to {}", url);

        let response = self
            .http
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status.as_u16(), &text, "token"));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}
