//! HTTP utilities for Grafana REST API calls

use super::auth::Credentials;
use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Default request timeout when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A non-success response from the Grafana API
#[derive(Debug, thiserror::Error)]
#[error("API request failed: {status}")]
pub struct ApiError {
    pub status: StatusCode,
    /// `message` field of Grafana's error body, when present
    pub message: Option<String>,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

/// Returns the HTTP status if `error` was caused by a non-success API response
pub fn api_status(error: &anyhow::Error) -> Option<StatusCode> {
    error.downcast_ref::<ApiError>().map(|e| e.status)
}

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for Grafana API calls
#[derive(Clone)]
pub struct GrafanaHttpClient {
    client: Client,
    credentials: Credentials,
}

impl GrafanaHttpClient {
    /// Create a new HTTP client
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("dashcode/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Make a GET request to a Grafana API
    pub async fn get(&self, url: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let request = self.credentials.apply(self.client.get(url));
        self.send(request).await
    }

    /// Make a POST request to a Grafana API
    pub async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        tracing::debug!("POST {}", url);

        let request = self.credentials.apply(self.client.post(url)).json(body);
        self.send(request).await
    }

    /// Make a PATCH request to a Grafana API
    pub async fn patch(&self, url: &str, body: &Value) -> Result<Value> {
        tracing::debug!("PATCH {}", url);

        let request = self.credentials.apply(self.client.patch(url)).json(body);
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Only the sanitized/truncated body is logged
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));
            return Err(ApiError { status, message }.into());
        }

        // Handle empty response
        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Format a Grafana API error for display
/// Maps status codes to short messages instead of echoing raw API bodies
pub fn format_api_error(error: &anyhow::Error) -> String {
    if let Some(status) = api_status(error) {
        return match status {
            StatusCode::UNAUTHORIZED => {
                "Authentication failed. Check GRAFANA_TOKEN or GRAFANA_USER/GRAFANA_PASSWORD."
                    .to_string()
            }
            StatusCode::FORBIDDEN => {
                "Permission denied. The credentials lack access to library panels.".to_string()
            }
            StatusCode::NOT_FOUND => "Resource not found.".to_string(),
            StatusCode::CONFLICT => {
                "Resource conflict. A library panel with this name or UID may already exist."
                    .to_string()
            }
            StatusCode::PRECONDITION_FAILED => {
                "Version mismatch. The library panel was changed remotely; pull and retry."
                    .to_string()
            }
            StatusCode::TOO_MANY_REQUESTS => {
                "Rate limit exceeded. Please try again later.".to_string()
            }
            StatusCode::BAD_REQUEST => "Invalid request. Check the resource spec.".to_string(),
            s if s.is_server_error() => {
                "Grafana temporarily unavailable. Please try again.".to_string()
            }
            s => format!("Request failed with status {}.", s.as_u16()),
        };
    }

    let error_str = format!("{:#}", error);
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
