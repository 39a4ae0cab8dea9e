//! Grafana provider
//!
//! Hands out authenticated clients to the handlers. Client construction is
//! deferred until a handler actually talks to Grafana, so purely local
//! operations work without any connection settings.

use crate::config::Config;
use crate::grafana::auth::Credentials;
use crate::grafana::client::GrafanaClient;
use crate::grafana::http::DEFAULT_TIMEOUT;
use crate::resource::{ClientProvider, Provider, API_VERSION};
use anyhow::Result;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GrafanaProvider {
    url: Option<String>,
    credentials: Credentials,
    timeout: Duration,
}

impl GrafanaProvider {
    pub fn new(url: Option<String>, credentials: Credentials) -> Self {
        Self {
            url,
            credentials,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.effective_url(), config.credentials()).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Provider for GrafanaProvider {
    fn api_version(&self) -> &str {
        API_VERSION
    }
}

impl ClientProvider for GrafanaProvider {
    fn client(&self) -> Result<GrafanaClient> {
        let Some(url) = self.url.as_deref() else {
            return Err(anyhow::anyhow!(
                "No Grafana URL configured. Set GRAFANA_URL or use the --url flag"
            ));
        };
        GrafanaClient::new(url, self.credentials.clone(), self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_url_is_an_error() {
        let provider = GrafanaProvider::new(None, Credentials::Anonymous);
        let err = provider.client().err().unwrap();
        assert!(err.to_string().contains("GRAFANA_URL"));
    }

    #[test]
    fn test_client_uses_configured_url() {
        let provider =
            GrafanaProvider::new(Some("http://grafana:3000".to_string()), Credentials::Anonymous);
        let client = provider.client().unwrap();
        assert_eq!(client.base_url().as_str(), "http://grafana:3000/");
        assert_eq!(provider.api_version(), API_VERSION);
    }
}
