//! Grafana Library Elements
//!
//! Typed bindings for the `/api/library-elements` endpoints.

use super::client::GrafanaClient;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Library element kind for panels (2 is variables)
pub const PANEL_KIND: i64 = 1;

/// Page size used when listing library elements
pub const PAGE_SIZE: usize = 100;

/// A library element as returned by Grafana
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryElement {
    /// Internal numeric id, managed by Grafana
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub org_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<String>,
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: i64,
    #[serde(default, rename = "type")]
    pub element_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub model: Value,
    #[serde(default)]
    pub version: i64,
}

/// One page of a library element search
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryElementSearchResult {
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub per_page: usize,
    #[serde(default)]
    pub elements: Vec<LibraryElement>,
}

/// Body of `POST /api/library-elements`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLibraryElementCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<String>,
    pub kind: i64,
    pub model: Value,
    pub name: String,
    pub uid: String,
}

/// Body of `PATCH /api/library-elements/{uid}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchLibraryElementCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<String>,
    pub kind: i64,
    pub model: Value,
    pub name: String,
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

/// Grafana wraps library element responses in `{"result": ...}`
#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

fn unwrap_result<T: DeserializeOwned>(response: Value) -> Result<T> {
    let envelope: Envelope<T> =
        serde_json::from_value(response).context("Unexpected library element response")?;
    Ok(envelope.result)
}

/// Fetch one page of library panels
pub async fn list_page(
    client: &GrafanaClient,
    page: usize,
    per_page: usize,
) -> Result<LibraryElementSearchResult> {
    let url = client.api_url_with_query(
        "library-elements",
        &[
            ("kind", PANEL_KIND.to_string()),
            ("page", page.to_string()),
            ("perPage", per_page.to_string()),
        ],
    )?;
    let response = client.get(&url).await?;
    unwrap_result(response)
}

/// List all library panels (auto-paginate)
pub async fn list(client: &GrafanaClient) -> Result<Vec<LibraryElement>> {
    let mut all_elements = Vec::new();
    let mut per_page = PAGE_SIZE;

    loop {
        let page = all_elements.len() / per_page + 1;
        let result = list_page(client, page, per_page).await?;
        let received = result.elements.len();
        all_elements.extend(result.elements);

        if received == 0 || all_elements.len() >= result.total_count {
            break;
        }
        // The server may cap the page size below what was asked for
        if received < per_page {
            tracing::debug!("Page size capped at {}", received);
            per_page = received;
        }
    }

    Ok(all_elements)
}

/// Get a single library element by UID
pub async fn get_by_uid(client: &GrafanaClient, uid: &str) -> Result<LibraryElement> {
    let url = client.library_element_url(uid)?;
    let response = client.get(&url).await?;
    unwrap_result(response)
}

/// Create a library element
pub async fn create(client: &GrafanaClient, command: &CreateLibraryElementCommand) -> Result<()> {
    let url = client.library_elements_url()?;
    let body = serde_json::to_value(command)?;
    client.post(&url, &body).await?;
    Ok(())
}

/// Patch an existing library element
pub async fn update(
    client: &GrafanaClient,
    uid: &str,
    command: &PatchLibraryElementCommand,
) -> Result<()> {
    let url = client.library_element_url(uid)?;
    let body = serde_json::to_value(command)?;
    client.patch(&url, &body).await?;
    Ok(())
}
