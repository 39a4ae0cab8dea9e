//! Error type shared by handlers and the reconciliation driver

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// The declared resource is inconsistent with itself
    #[error("{0}")]
    Validation(String),

    /// The remote service has no element with this UID
    #[error("{kind} '{uid}' not found")]
    NotFound { kind: String, uid: String },

    /// No handler is registered for a resource kind
    #[error("no handler registered for kind '{0}'")]
    UnknownKind(String),

    /// A resource file could not be read, parsed or written
    #[error("{path}: {message}")]
    Manifest { path: PathBuf, message: String },

    /// A resource could not be serialized
    #[error("failed to encode {key}: {message}")]
    Encode { key: String, message: String },

    /// Any failure talking to the remote service, including client setup
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub(crate) fn manifest(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Manifest {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
