//! Declared resource model
//!
//! A resource is the on-disk unit of configuration:
//!
//! ```json
//! {
//!   "apiVersion": "grizzly.grafana.com/v1alpha1",
//!   "kind": "LibraryPanel",
//!   "metadata": { "name": "cpu-usage" },
//!   "spec": { "uid": "cpu-usage", "title": "CPU usage" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// API version written into resources produced by this tool
pub const API_VERSION: &str = "grizzly.grafana.com/v1alpha1";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    /// Remote version the resource was read at. Only set on resources
    /// fetched from the remote service and never written to disk.
    #[serde(skip)]
    pub version: Option<i64>,
}

/// A declared resource: `(apiVersion, kind, name, spec)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: Map<String, Value>,
}

impl Resource {
    pub fn new(api_version: &str, kind: &str, name: &str, spec: Map<String, Value>) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            metadata: Metadata {
                name: name.to_string(),
                version: None,
            },
            spec,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// `spec.uid` when it is a string, otherwise the name
    pub fn uid(&self) -> String {
        self.get_spec_string("uid")
            .unwrap_or_else(|| self.name().to_string())
    }

    pub fn spec(&self) -> &Map<String, Value> {
        &self.spec
    }

    /// A spec value, only if it is a JSON string
    pub fn get_spec_string(&self, key: &str) -> Option<String> {
        self.spec
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    pub fn get_spec_value(&self, key: &str) -> Option<&Value> {
        self.spec.get(key)
    }

    pub fn set_spec_value(&mut self, key: &str, value: Value) {
        self.spec.insert(key.to_string(), value);
    }

    /// Remove a top-level spec key, returning its previous value
    pub fn delete_spec_key(&mut self, key: &str) -> Option<Value> {
        self.spec.remove(key)
    }

    /// Pretty-printed JSON of the spec alone
    pub fn spec_as_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.spec)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_yaml(&self) -> serde_yaml::Result<String> {
        serde_yaml::to_string(self)
    }

    /// `Kind/name`, as used in log lines and CLI output
    pub fn key(&self) -> String {
        format!("{}/{}", self.kind, self.name())
    }
}
