//! Error types for vaulty-core

use crate::issue::IssuesCollection;
use crate::vault::VaultError;

/// Result type for vaulty-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vaulty-core operations
///
/// Service operations on [`crate::Context`] only fail with [`Error::Issues`];
/// the other variants are routed through the issue collector first.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Snapshot of the collected issues at the point of failure
    #[error("Issues encountered")]
    Issues(IssuesCollection),

    /// Error response or transport failure from the vault
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Template lookup or render failure
    #[error(transparent)]
    Template(#[from] minijinja::Error),

    /// Invalid template selection pattern
    #[error(transparent)]
    Glob(#[from] globset::Error),

    /// Unreadable local secrets file
    #[error(transparent)]
    Dotenv(#[from] dotenvy::Error),

    /// Filesystem error from vaulty-fs
    #[error(transparent)]
    Fs(#[from] vaulty_fs::Error),

    /// Git error from vaulty-git
    #[error(transparent)]
    Git(#[from] vaulty_git::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Anything else worth reporting as-is
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// The issue snapshot carried by a collector error.
    pub fn issues(&self) -> Option<&IssuesCollection> {
        match self {
            Self::Issues(collection) => Some(collection),
            _ => None,
        }
    }
}
