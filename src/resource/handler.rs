//! Handler and provider abstractions
//!
//! A [`Handler`] adapts one resource kind to the remote service. The
//! reconciliation driver only ever talks to handlers through this trait.

use super::model::Resource;
use crate::error::Result;
use crate::grafana::client::GrafanaClient;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Something that knows which API version its resources carry
pub trait Provider: Send + Sync {
    fn api_version(&self) -> &str;
}

/// A provider able to hand out an authenticated Grafana client
pub trait ClientProvider: Provider {
    fn client(&self) -> anyhow::Result<GrafanaClient>;
}

/// Adapter between declared resources of one kind and the remote service
#[async_trait]
pub trait Handler: Send + Sync {
    /// Resource kind handled, e.g. `LibraryPanel`
    fn kind(&self) -> &'static str;

    fn api_version(&self) -> String;

    /// Default file extension for resources of this kind
    fn get_extension(&self) -> &'static str;

    /// Check a declared resource for internal consistency
    fn validate(&self, resource: &Resource) -> Result<()>;

    /// Files under `dir` that hold resources of this kind, lexically ordered
    fn find_resource_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Path, relative to the resources directory, a resource is written to
    fn resource_file_path(&self, resource: &Resource, filetype: &str) -> String;

    /// Turn one parsed manifest into the resources it declares
    fn parse(&self, manifest: Resource) -> Result<Vec<Resource>>;

    /// Strip service-managed fields so a remote resource can be compared
    fn unprepare(&self, resource: &Resource) -> Resource;

    /// Get a resource ready for dispatch to the remote service
    fn prepare(&self, existing: &Resource, resource: &Resource) -> Resource;

    fn get_uid(&self, resource: &Resource) -> Result<String>;

    async fn get_by_uid(&self, uid: &str) -> Result<Resource>;

    async fn get_remote(&self, resource: &Resource) -> Result<Resource> {
        self.get_by_uid(resource.name()).await
    }

    /// UIDs of every remote resource of this kind
    async fn list_remote(&self) -> Result<Vec<String>>;

    async fn add(&self, resource: &Resource) -> Result<()>;

    async fn update(&self, existing: &Resource, resource: &Resource) -> Result<()>;
}
