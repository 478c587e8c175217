//! `PersistenceBackend` over the atrium-server HTTP API.
//!
//! | Request  | HTTP                          |
//! |----------|-------------------------------|
//! | fetch    | `GET    {base}/api/config`        |
//! | store    | `POST   {base}/api/config`        |
//! | delete   | `DELETE {base}/api/config`        |
//! | import   | `POST   {base}/api/config/import` |
//!
//! A non-2xx answer becomes [`BackendError::Status`] carrying the server's
//! `{"error": ...}` message when there is one.

use std::time::Duration;

use async_trait::async_trait;
use atrium_core::{BackendError, PersistenceBackend};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

/// Request timeout used when the caller does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CONFIG_PATH: &str = "/api/config";
const IMPORT_PATH: &str = "/api/config/import";

/// HTTP client for one atrium-server instance.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a backend for the server at `base_url`, e.g.
    /// `http://localhost:8001`.  A trailing slash is ignored.
    ///
    /// # Errors
    ///
    /// [`BackendError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "backend answered");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            code: status.as_u16(),
            message: error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
        })
    }
}

#[async_trait]
impl PersistenceBackend for HttpBackend {
    async fn fetch(&self) -> Result<Value, BackendError> {
        let response = self.send(self.client.get(self.url(CONFIG_PATH))).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))
    }

    async fn store(&self, document: &Value) -> Result<(), BackendError> {
        self.send(self.client.post(self.url(CONFIG_PATH)).json(document))
            .await
            .map(drop)
    }

    async fn delete(&self) -> Result<(), BackendError> {
        self.send(self.client.delete(self.url(CONFIG_PATH)))
            .await
            .map(drop)
    }

    async fn import(&self, document: &Value) -> Result<(), BackendError> {
        self.send(self.client.post(self.url(IMPORT_PATH)).json(document))
            .await
            .map(drop)
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_decode() {
        BackendError::Malformed(e.to_string())
    } else {
        BackendError::Transport(e.to_string())
    }
}

/// Pulls `error` out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}
