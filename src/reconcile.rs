//! Reconciliation driver
//!
//! Pushes declared resources to Grafana (`apply`), pulls remote resources
//! to disk (`pull`), and loads resource files through their handlers.

use crate::error::{Error, Result};
use crate::resource::manifest::{self, Format};
use crate::resource::{Handler, Registry, Resource};
use std::fmt;
use std::path::{Path, PathBuf};

/// What `apply` did (or would do, in a dry run) to one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => f.write_str("created"),
            Outcome::Updated => f.write_str("updated"),
            Outcome::Unchanged => f.write_str("unchanged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub key: String,
    pub outcome: Outcome,
}

/// Load every resource file under `dir` that a registered handler claims
pub fn load_resources(registry: &Registry, dir: &Path) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();

    for handler in registry.handlers() {
        for path in handler.find_resource_files(dir)? {
            tracing::debug!("Loading {:?}", path);
            let manifest = manifest::read_resource(&path)?;
            if manifest.kind() != handler.kind() {
                return Err(Error::manifest(
                    &path,
                    format!(
                        "expected kind {}, found {}",
                        handler.kind(),
                        manifest.kind()
                    ),
                ));
            }
            resources.extend(handler.parse(manifest)?);
        }
    }

    tracing::info!("Loaded {} resources from {:?}", resources.len(), dir);
    Ok(resources)
}

/// Bring one resource's remote state in line with its declaration
pub async fn apply_one(
    handler: &dyn Handler,
    resource: &Resource,
    dry_run: bool,
) -> Result<Outcome> {
    handler.validate(resource)?;

    let existing = match handler.get_remote(resource).await {
        Ok(existing) => existing,
        Err(Error::NotFound { .. }) => {
            if !dry_run {
                handler.add(resource).await?;
            }
            return Ok(Outcome::Created);
        }
        Err(err) => return Err(err),
    };

    let remote = handler.unprepare(&existing);
    let local = handler.unprepare(resource);
    if remote.spec == local.spec {
        return Ok(Outcome::Unchanged);
    }

    if !dry_run {
        let prepared = handler.prepare(&existing, resource);
        handler.update(&existing, &prepared).await?;
    }
    Ok(Outcome::Updated)
}

/// Apply every resource in order; the first failure stops the run
pub async fn apply(
    registry: &Registry,
    resources: &[Resource],
    dry_run: bool,
) -> Result<Vec<ApplyResult>> {
    let mut results = Vec::with_capacity(resources.len());

    for resource in resources {
        let handler = registry.handler(resource.kind())?;
        let outcome = apply_one(handler.as_ref(), resource, dry_run).await?;
        let suffix = if dry_run { " (dry run)" } else { "" };
        tracing::info!("{} {}{}", resource.key(), outcome, suffix);
        results.push(ApplyResult {
            key: resource.key(),
            outcome,
        });
    }

    Ok(results)
}

/// Write every remote resource of every registered kind under `dir`
pub async fn pull(registry: &Registry, dir: &Path, format: Format) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for handler in registry.handlers() {
        let uids = handler.list_remote().await?;
        tracing::info!("Pulling {} {} resources", uids.len(), handler.kind());

        for uid in uids {
            if !is_safe_file_name(&uid) {
                tracing::warn!(
                    "Skipping {} '{}': uid cannot be used as a file name",
                    handler.kind(),
                    uid
                );
                continue;
            }

            let resource = handler.unprepare(&handler.get_by_uid(&uid).await?);
            let relative = handler.resource_file_path(&resource, format.extension());
            written.push(manifest::write_resource(dir, &relative, &resource, format)?);
        }
    }

    Ok(written)
}

/// A uid can name a file under the resources directory only if it stays
/// a single path component
fn is_safe_file_name(uid: &str) -> bool {
    !uid.is_empty() && uid != "." && uid != ".." && !uid.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_names() {
        assert!(is_safe_file_name("cpu-usage"));
        assert!(is_safe_file_name("team a.cpu"));
        assert!(!is_safe_file_name(""));
        assert!(!is_safe_file_name("."));
        assert!(!is_safe_file_name(".."));
        assert!(!is_safe_file_name("team a/cpu"));
        assert!(!is_safe_file_name("../../escaped"));
        assert!(!is_safe_file_name("a\\b"));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Created.to_string(), "created");
        assert_eq!(Outcome::Unchanged.to_string(), "unchanged");
    }
}
