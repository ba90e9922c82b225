use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;

use super::{ApiError, ApiRequest, Transport};

pub const DEFAULT_API_URL: &str = "https://api.are.na/v2";

/// Sends requests to the live API.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: &str, access_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn build_request(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }

        builder
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>> {
        tracing::debug!(%request, "sending request");

        let response = self
            .build_request(&request)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            let err = ApiError::from_body(status, &text);
            tracing::debug!(status = %err.status(), path = %request.path, "request failed");
            return Err(err.into());
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&text).context("Failed to parse response")?;

        Ok(Some(value))
    }
}
