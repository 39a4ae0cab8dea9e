//! Resource files
//!
//! Reads and writes resources as JSON or YAML, picking the format from the
//! file extension.

use super::model::Resource;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk encoding of a resource file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }
}

/// Encode a resource in the given format
pub fn encode(resource: &Resource, format: Format) -> Result<String> {
    let encoded = match format {
        Format::Json => resource.to_json().map_err(|e| e.to_string()),
        Format::Yaml => resource.to_yaml().map_err(|e| e.to_string()),
    };
    encoded.map_err(|message| Error::Encode {
        key: resource.key(),
        message,
    })
}

/// Read one resource file
pub fn read_resource(path: &Path) -> Result<Resource> {
    let Some(format) = Format::from_path(path) else {
        return Err(Error::manifest(path, "unsupported file type"));
    };

    let content = std::fs::read_to_string(path).map_err(|e| Error::manifest(path, e))?;
    match format {
        Format::Json => serde_json::from_str(&content).map_err(|e| Error::manifest(path, e)),
        Format::Yaml => serde_yaml::from_str(&content).map_err(|e| Error::manifest(path, e)),
    }
}

/// Write a resource under `dir` at `relative_path`, creating parent
/// directories. Returns the full path written.
pub fn write_resource(
    dir: &Path,
    relative_path: &str,
    resource: &Resource,
    format: Format,
) -> Result<PathBuf> {
    let path = dir.join(relative_path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::manifest(parent, e))?;
    }

    let mut content = encode(resource, format)?;
    if !content.ends_with('\n') {
        content.push('\n');
    }
    std::fs::write(&path, content).map_err(|e| Error::manifest(&path, e))?;

    Ok(path)
}
