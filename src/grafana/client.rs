//! Grafana Client
//!
//! Main client for interacting with the Grafana HTTP API, combining
//! credentials, the instance base URL and HTTP functionality.

use super::auth::Credentials;
use super::http::GrafanaHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Main Grafana client
#[derive(Clone)]
pub struct GrafanaClient {
    pub http: GrafanaHttpClient,
    base_url: Url,
}

impl GrafanaClient {
    /// Create a new Grafana client for the instance at `url`
    pub fn new(url: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(url).with_context(|| format!("Invalid Grafana URL: {}", url))?;

        // Grafana may be served under a sub-path; keep it when joining
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        tracing::debug!("Grafana client for {} ({:?})", base_url, credentials);

        let http = GrafanaHttpClient::new(credentials, timeout)?;

        Ok(Self { http, base_url })
    }

    /// The instance base URL, always ending with `/`
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Make a GET request to a Grafana API
    pub async fn get(&self, url: &str) -> Result<Value> {
        self.http.get(url).await
    }

    /// Make a POST request to a Grafana API
    pub async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        self.http.post(url, body).await
    }

    /// Make a PATCH request to a Grafana API
    pub async fn patch(&self, url: &str, body: &Value) -> Result<Value> {
        self.http.patch(url, body).await
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build a Grafana API URL, e.g. `api_url("library-elements")`
    pub fn api_url(&self, path: &str) -> Result<String> {
        let url = self
            .base_url
            .join(&format!("api/{}", path.trim_start_matches('/')))
            .with_context(|| format!("Invalid API path: {}", path))?;
        Ok(url.into())
    }

    /// Build a Grafana API URL with query parameters
    pub fn api_url_with_query(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let mut url = Url::parse(&self.api_url(path)?)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.into())
    }

    /// Build a library elements API URL
    pub fn library_elements_url(&self) -> Result<String> {
        self.api_url("library-elements")
    }

    /// Build the URL of a single library element
    pub fn library_element_url(&self, uid: &str) -> Result<String> {
        self.api_url(&format!("library-elements/{}", urlencoding::encode(uid)))
    }
}

/// Format a Grafana API error for display
pub fn format_api_error(error: &anyhow::Error) -> String {
    super::http::format_api_error(error)
}
