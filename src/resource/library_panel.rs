//! Library Panel Handler
//!
//! Maps `LibraryPanel` resources onto Grafana's library elements API.
//! A resource's spec is the library element's model; the element's internal
//! numeric id rides along under `spec.id` and is stripped by `unprepare`.

use super::handler::{ClientProvider, Handler};
use super::model::Resource;
use crate::error::{Error, Result};
use crate::grafana::http::api_status;
use crate::grafana::library_elements::{
    self, CreateLibraryElementCommand, LibraryElement, PatchLibraryElementCommand, PANEL_KIND,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const KIND: &str = "LibraryPanel";

const LIBRARY_PANEL_DIR: &str = "library-panel";
const LIBRARY_PANEL_PREFIX: &str = "library-panel-";

/// Service-managed spec key removed before comparison.
/// It replaces any `id` the panel model itself carried, so a model-level
/// `id` does not survive a pull and push.
const ID_KEY: &str = "id";

pub struct LibraryPanelHandler {
    provider: Arc<dyn ClientProvider>,
}

impl LibraryPanelHandler {
    pub fn new(provider: Arc<dyn ClientProvider>) -> Self {
        Self { provider }
    }

    fn element_to_resource(&self, element: LibraryElement) -> Resource {
        let mut spec = match element.model {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                tracing::warn!(
                    "LibraryPanel {}: model is not an object ({}), dropping it",
                    element.uid,
                    type_name(&other)
                );
                Map::new()
            }
        };
        spec.insert(ID_KEY.to_string(), Value::from(element.id));

        let mut resource = Resource::new(&self.api_version(), KIND, &element.uid, spec);
        resource.metadata.version = Some(element.version);
        resource
    }

    /// The model sent to Grafana: the whole spec minus service-managed keys
    fn model_for(&self, resource: &Resource) -> Value {
        Value::Object(self.unprepare(resource).spec)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl Handler for LibraryPanelHandler {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn api_version(&self) -> String {
        self.provider.api_version().to_string()
    }

    fn get_extension(&self) -> &'static str {
        "json"
    }

    fn validate(&self, resource: &Resource) -> Result<()> {
        if let Some(uid) = resource.get_spec_string("uid") {
            if uid != resource.name() {
                return Err(Error::Validation(format!(
                    "uid '{}' and name '{}', don't match",
                    uid,
                    resource.name()
                )));
            }
        }
        Ok(())
    }

    fn find_resource_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let panel_dir = dir.join(LIBRARY_PANEL_DIR);
        let entries = match std::fs::read_dir(&panel_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::manifest(&panel_dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::manifest(&panel_dir, e))?;
            if !entry
                .file_name()
                .to_string_lossy()
                .starts_with(LIBRARY_PANEL_PREFIX)
            {
                continue;
            }

            // Follows symlinks, so linked panel files are picked up too
            let path = entry.path();
            let is_file = std::fs::metadata(&path)
                .map_err(|e| Error::manifest(&path, e))?
                .is_file();
            if is_file {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    fn resource_file_path(&self, resource: &Resource, filetype: &str) -> String {
        format!(
            "{}/{}{}.{}",
            LIBRARY_PANEL_DIR,
            LIBRARY_PANEL_PREFIX,
            resource.name(),
            filetype
        )
    }

    fn parse(&self, manifest: Resource) -> Result<Vec<Resource>> {
        Ok(vec![manifest])
    }

    fn unprepare(&self, resource: &Resource) -> Resource {
        let mut resource = resource.clone();
        resource.delete_spec_key(ID_KEY);
        resource
    }

    fn prepare(&self, _existing: &Resource, resource: &Resource) -> Resource {
        resource.clone()
    }

    fn get_uid(&self, resource: &Resource) -> Result<String> {
        Ok(resource.name().to_string())
    }

    async fn get_by_uid(&self, uid: &str) -> Result<Resource> {
        let client = self.provider.client()?;

        tracing::info!("LibraryPanel.get_by_uid: UID:{}", uid);
        let element = match library_elements::get_by_uid(&client, uid).await {
            Ok(element) => element,
            Err(err) if api_status(&err) == Some(StatusCode::NOT_FOUND) => {
                tracing::info!("LibraryPanel.get_by_uid: {} not found", uid);
                return Err(Error::NotFound {
                    kind: KIND.to_string(),
                    uid: uid.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let resource = self.element_to_resource(element);
        if let Ok(json) = resource.spec_as_json() {
            tracing::debug!("{}", json);
        }
        Ok(resource)
    }

    async fn list_remote(&self) -> Result<Vec<String>> {
        let client = self.provider.client()?;

        let elements = library_elements::list(&client).await?;
        tracing::info!("LibraryPanel.list_remote: found {} panels", elements.len());

        let uids = elements
            .into_iter()
            .map(|element| {
                tracing::info!("LibraryPanel.list_remote: - UID:{}", element.uid);
                element.uid
            })
            .collect();
        Ok(uids)
    }

    async fn add(&self, resource: &Resource) -> Result<()> {
        let command = CreateLibraryElementCommand {
            folder_uid: resource.get_spec_string("folderUid"),
            kind: PANEL_KIND,
            model: self.model_for(resource),
            name: resource.name().to_string(),
            uid: resource.uid(),
        };

        let client = self.provider.client()?;

        if let Ok(json) = resource.spec_as_json() {
            tracing::debug!("{}", json);
        }
        tracing::info!("LibraryPanel.add: Name:{}", command.name);
        tracing::info!("LibraryPanel.add: UID:{}", command.uid);

        library_elements::create(&client, &command).await?;
        Ok(())
    }

    async fn update(&self, existing: &Resource, resource: &Resource) -> Result<()> {
        let command = PatchLibraryElementCommand {
            folder_uid: resource.get_spec_string("folderUid"),
            kind: PANEL_KIND,
            model: self.model_for(resource),
            name: resource.name().to_string(),
            uid: resource.uid(),
            version: existing.metadata.version.or(resource.metadata.version),
        };

        let client = self.provider.client()?;

        tracing::info!("LibraryPanel.update: UID:{}", command.uid);
        library_elements::update(&client, &command.uid, &command).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grafana::client::GrafanaClient;
    use crate::resource::handler::Provider;
    use crate::resource::model::API_VERSION;
    use serde_json::json;

    struct NoClientProvider;

    impl Provider for NoClientProvider {
        fn api_version(&self) -> &str {
            API_VERSION
        }
    }

    impl ClientProvider for NoClientProvider {
        fn client(&self) -> anyhow::Result<GrafanaClient> {
            Err(anyhow::anyhow!("no Grafana URL configured"))
        }
    }

    fn handler() -> LibraryPanelHandler {
        LibraryPanelHandler::new(Arc::new(NoClientProvider))
    }

    fn panel(name: &str, spec: Value) -> Resource {
        Resource::new(API_VERSION, KIND, name, spec.as_object().cloned().unwrap())
    }

    #[test]
    fn test_validate_accepts_matching_or_missing_uid() {
        let handler = handler();
        assert!(handler.validate(&panel("cpu", json!({"uid": "cpu"}))).is_ok());
        assert!(handler.validate(&panel("cpu", json!({"title": "CPU"}))).is_ok());
    }

    #[test]
    fn test_validate_rejects_mismatched_uid() {
        let err = handler()
            .validate(&panel("cpu", json!({"uid": "memory"})))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.to_string(), "uid 'memory' and name 'cpu', don't match");
    }

    #[test]
    fn test_get_uid_is_name() {
        let resource = panel("cpu", json!({"uid": "cpu"}));
        assert_eq!(handler().get_uid(&resource).unwrap(), "cpu");
    }

    #[test]
    fn test_resource_file_path() {
        let resource = panel("cpu", json!({}));
        assert_eq!(
            handler().resource_file_path(&resource, "json"),
            "library-panel/library-panel-cpu.json"
        );
        assert_eq!(
            handler().resource_file_path(&resource, "yaml"),
            "library-panel/library-panel-cpu.yaml"
        );
    }

    #[test]
    fn test_unprepare_strips_id_only() {
        let handler = handler();
        let resource = panel("cpu", json!({"id": 42, "uid": "cpu", "title": "CPU"}));
        let unprepared = handler.unprepare(&resource);

        assert_eq!(unprepared.get_spec_value("id"), None);
        assert_eq!(unprepared.get_spec_string("title").as_deref(), Some("CPU"));
        assert_eq!(unprepared.name(), "cpu");
        assert_eq!(handler.unprepare(&unprepared), unprepared);
        // The input is untouched
        assert_eq!(resource.get_spec_value("id"), Some(&json!(42)));
    }

    #[test]
    fn test_prepare_returns_resource_unchanged() {
        let existing = panel("cpu", json!({"id": 1}));
        let resource = panel("cpu", json!({"title": "new"}));
        assert_eq!(handler().prepare(&existing, &resource), resource);
    }

    #[test]
    fn test_parse_wraps_single_manifest() {
        let resource = panel("cpu", json!({}));
        assert_eq!(handler().parse(resource.clone()).unwrap(), vec![resource]);
    }

    #[test]
    fn test_element_to_resource_overlays_id_and_version() {
        let element = LibraryElement {
            id: 9,
            uid: "cpu".to_string(),
            name: "CPU".to_string(),
            kind: PANEL_KIND,
            model: json!({"uid": "cpu", "title": "CPU", "type": "stat"}),
            version: 4,
            ..Default::default()
        };

        let resource = handler().element_to_resource(element);
        assert_eq!(resource.name(), "cpu");
        assert_eq!(resource.kind(), KIND);
        assert_eq!(resource.api_version, API_VERSION);
        assert_eq!(resource.get_spec_value("id"), Some(&json!(9)));
        assert_eq!(resource.get_spec_string("type").as_deref(), Some("stat"));
        assert_eq!(resource.metadata.version, Some(4));
    }

    #[test]
    fn test_element_with_non_object_model() {
        let element = LibraryElement {
            id: 1,
            uid: "odd".to_string(),
            model: json!("not an object"),
            ..Default::default()
        };
        let resource = handler().element_to_resource(element);
        assert_eq!(resource.spec().len(), 1);
        assert_eq!(resource.get_spec_value("id"), Some(&json!(1)));
    }

    #[test]
    fn test_element_id_replaces_model_id() {
        let element = LibraryElement {
            id: 9,
            uid: "cpu".to_string(),
            model: json!({"id": 2, "title": "CPU"}),
            ..Default::default()
        };
        let handler = handler();
        let resource = handler.element_to_resource(element);
        assert_eq!(resource.get_spec_value("id"), Some(&json!(9)));
        assert_eq!(handler.model_for(&resource), json!({"title": "CPU"}));
    }

    #[test]
    fn test_model_excludes_id() {
        let resource = panel("cpu", json!({"id": 3, "title": "CPU"}));
        assert_eq!(handler().model_for(&resource), json!({"title": "CPU"}));
    }

    #[test]
    fn test_find_resource_files_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = handler().find_resource_files(dir.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_find_resource_files_matches_prefix_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let panels = dir.path().join("library-panel");
        std::fs::create_dir_all(panels.join("library-panel-subdir")).unwrap();
        for name in ["library-panel-b.json", "library-panel-a.yaml", "other.json"] {
            std::fs::write(panels.join(name), "{}").unwrap();
        }

        let files = handler().find_resource_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![
                panels.join("library-panel-a.yaml"),
                panels.join("library-panel-b.json"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_find_resource_files_follows_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let panels = dir.path().join("library-panel");
        std::fs::create_dir_all(&panels).unwrap();
        std::fs::write(panels.join("library-panel-a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("shared.json"), "{}").unwrap();
        std::os::unix::fs::symlink("../shared.json", panels.join("library-panel-b.json")).unwrap();
        std::fs::create_dir_all(dir.path().join("elsewhere")).unwrap();
        std::os::unix::fs::symlink("../elsewhere", panels.join("library-panel-dir")).unwrap();

        let files = handler().find_resource_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![
                panels.join("library-panel-a.json"),
                panels.join("library-panel-b.json"),
            ]
        );
    }

    #[tokio::test]
    async fn test_client_failure_is_transport_error() {
        let handler = handler();
        let err = handler.list_remote().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));

        let err = handler.get_remote(&panel("cpu", json!({}))).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(err.to_string(), "no Grafana URL configured");
    }
}
