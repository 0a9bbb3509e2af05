//! HTTP implementation of the document API

use crate::{
    ClientError, Config, Result,
    api::{ByteStream, DocumentApi},
    types::*,
};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{
    Client, RequestBuilder, Response,
    header::{self, HeaderValue},
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

/// Document API client
pub struct DocumentClient {
    config: Config,
    http: Client,
}

impl DocumentClient {
    /// Create a new client with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        url::Url::parse(&config.api_url).map_err(|e| {
            ClientError::Config(format!("invalid document API URL {}: {}", config.api_url, e))
        })?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ClientError::Config(format!("invalid user agent: {}", e)))?,
        );

        // No overall timeout on the client: downloads are streamed for as long
        // as the caller keeps reading. JSON calls set a per-request timeout.
        let http = Client::builder()
            .connect_timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { config, http })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Helper Methods ====================

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: reqwest::Method, path: &str, token: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .bearer_auth(token)
            .timeout(self.config.timeout)
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), resource, "Document API request failed");
            return Err(ClientError::from_response(status.as_u16(), &text, resource));
        }

        Ok(response)
    }
}

async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl DocumentApi for DocumentClient {
    #[instrument(skip(self, token))]
    async fn get_by_path(&self, token: &str, path: &str) -> Result<File> {
        let request = self
            .request(reqwest::Method::GET, "/v2/files", token)
            .header(header::CONTENT_TYPE, "application/json")
            .query(&[("path", path)]);
        json(self.send(request, path).await?).await
    }

    #[instrument(skip(self, token))]
    async fn list_by_path(&self, token: &str, path: &str) -> Result<Vec<File>> {
        let request = self
            .request(reqwest::Method::GET, "/v2/files/list", token)
            .header(header::CONTENT_TYPE, "application/json")
            .query(&[("path", path)]);
        json(self.send(request, path).await?).await
    }

    #[instrument(skip(self, token))]
    async fn create_folder(&self, token: &str, options: CreateFolderOptions) -> Result<File> {
        let request = self
            .request(reqwest::Method::POST, "/v2/files", token)
            .query(&[
                ("type", "folder"),
                ("workspace_id", options.workspace_id.as_str()),
                ("parent_id", options.parent_id.as_str()),
                ("name", options.name.as_str()),
            ]);
        json(self.send(request, &options.name).await?).await
    }

    #[instrument(skip(self, token, options), fields(name = %options.name, size = options.data.len()))]
    async fn create_file(&self, token: &str, options: CreateFileOptions) -> Result<File> {
        let part = Part::bytes(options.data.to_vec()).file_name(options.name.clone());
        let form = Form::new().part("file", part);

        let request = self
            .request(reqwest::Method::POST, "/v2/files", token)
            .query(&[
                ("type", "file"),
                ("workspace_id", options.workspace_id.as_str()),
                ("parent_id", options.parent_id.as_str()),
                ("name", options.name.as_str()),
            ])
            .multipart(form);
        json(self.send(request, &options.name).await?).await
    }

    #[instrument(skip(self, token))]
    async fn delete(&self, token: &str, id: &str) -> Result<()> {
        let path = format!("/v2/files/{}", id);
        let request = self
            .request(reqwest::Method::DELETE, &path, token)
            .header(header::CONTENT_TYPE, "application/json");
        self.send(request, id).await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn copy(&self, token: &str, id: &str, target_id: &str) -> Result<File> {
        let path = format!("/v2/files/{}/copy/{}", id, target_id);
        let request = self
            .request(reqwest::Method::POST, &path, token)
            .header(header::CONTENT_TYPE, "application/json");
        json(self.send(request, id).await?).await
    }

    #[instrument(skip(self, token))]
    async fn rename(&self, token: &str, id: &str, name: &str) -> Result<File> {
        let path = format!("/v2/files/{}/name", id);
        let request = self
            .request(reqwest::Method::PATCH, &path, token)
            .json(&serde_json::json!({ "name": name }));
        json(self.send(request, id).await?).await
    }

    #[instrument(skip(self, token))]
    async fn move_to(&self, token: &str, id: &str, target_id: &str) -> Result<()> {
        let path = format!("/v2/files/{}/move/{}", id, target_id);
        let request = self
            .request(reqwest::Method::POST, &path, token)
            .header(header::CONTENT_TYPE, "application/json");
        self.send(request, id).await?;
        Ok(())
    }

    #[instrument(skip(self, token, file), fields(id = %file.id))]
    async fn download_original(&self, token: &str, file: &File) -> Result<ByteStream> {
        let extension = file.original().map(|o| o.extension.as_str()).unwrap_or("");
        let path = format!("/v2/files/{}/original{}", file.id, extension);

        // The download route authorizes through the query string as well as the header
        let request = self
            .http
            .get(self.url(&path))
            .bearer_auth(token)
            .query(&[("access_token", token)]);
        let response = self.send(request, &file.id).await?;

        Ok(response.bytes_stream().map_err(ClientError::from).boxed())
    }
}
