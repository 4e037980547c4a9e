//! HTTP transport boundary

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use pgrest_common::config::HttpConfig;
use pgrest_common::error::{Error, Result};
use pgrest_common::types::{HttpRequest, HttpResponse, Method};

/// Sends one request and returns the parsed JSON body with response headers.
///
/// Implementations must report non-2xx responses as `Error::Transport`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the configured timeout
    ///
    /// # Errors
    /// Returns `ConfigError` if the HTTP client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::ConfigError(format!("HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(network_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            let message = error_message(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            warn!(status = status.as_u16(), url = %request.url, "request failed: {message}");
            return Err(Error::transport(Some(status.as_u16()), message));
        }

        let json = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        let mut out = HttpResponse::new(status.as_u16(), json);
        for (name, value) in &headers {
            if let Ok(value) = value.to_str() {
                out.insert_header(name.as_str(), value);
            }
        }

        debug!(status = out.status, "response received");
        Ok(out)
    }
}

fn network_error(err: reqwest::Error) -> Error {
    Error::transport(err.status().map(|s| s.as_u16()), err.to_string())
}

/// Message from a PostgREST error body (`{"message": ..., "details": ...}`)
fn error_message(body: &str) -> Option<String> {
    let error: Value = serde_json::from_str(body).ok()?;
    let message = error["message"].as_str()?;

    match error["details"].as_str() {
        Some(details) if !details.is_empty() => Some(format!("{message} ({details})")),
        _ => Some(message.to_string()),
    }
}
