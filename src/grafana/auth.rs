//! Grafana Authentication
//!
//! Handles authentication with a service account token or basic auth,
//! resolved from the environment or the config file.

use reqwest::RequestBuilder;
use std::fmt;

pub const TOKEN_ENV: &str = "GRAFANA_TOKEN";
pub const USER_ENV: &str = "GRAFANA_USER";
pub const PASSWORD_ENV: &str = "GRAFANA_PASSWORD";
pub const URL_ENV: &str = "GRAFANA_URL";

/// Credentials attached to every request
#[derive(Clone, Default, PartialEq)]
pub enum Credentials {
    /// Service account or API token, sent as a bearer token
    Token(String),
    /// Username and password, sent as HTTP basic auth
    Basic { user: String, password: String },
    #[default]
    Anonymous,
}

// Secrets stay out of Debug output so they never reach the logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(***)"),
            Credentials::Basic { user, .. } => write!(f, "Basic({}:***)", user),
            Credentials::Anonymous => f.write_str("Anonymous"),
        }
    }
}

impl Credentials {
    /// Build credentials from optional parts. A token wins over basic auth.
    pub fn from_parts(
        token: Option<&str>,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Self {
        match (non_empty(token), non_empty(user)) {
            (Some(token), _) => Credentials::Token(token.to_string()),
            (None, Some(user)) => Credentials::Basic {
                user: user.to_string(),
                password: password.unwrap_or_default().to_string(),
            },
            (None, None) => Credentials::Anonymous,
        }
    }

    /// Attach these credentials to a request
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::Token(token) => request.bearer_auth(token),
            Credentials::Basic { user, password } => request.basic_auth(user, Some(password)),
            Credentials::Anonymous => request,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Read a setting from the environment, ignoring empty values
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
}
