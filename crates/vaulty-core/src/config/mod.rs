//! Project configuration
//!
//! The configuration names the secrets a project needs, how templates are
//! recognised and which ignore files narrow template discovery.

mod resolver;
pub mod validation;

pub use resolver::{CONFIG_FILE_NAMES, PROJECT_MARKERS, find_config_file};
pub use validation::{ConfigInput, Violation, normalize_extension};

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::context::Context;

/// Default template extension.
pub const DEFAULT_EXTENSION: &str = ".vaulty";

/// `source` value of a configuration that was not loaded from a file.
pub const DEFAULT_SOURCE: &str = "default";

/// Default ignore file patterns.
pub fn default_ignore_files() -> Vec<String> {
    vec!["**/.gitignore".to_string(), "**/.vaultyignore".to_string()]
}

/// Where a secret lives. `token` is the *name* of a token, not its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretConfig {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub path: String,
    pub token: String,
}

/// Resolved project configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub cwd: PathBuf,
    /// Project root, the key of the project in the store.
    pub project: PathBuf,
    pub extension: String,
    pub gitignore: bool,
    pub ignore_files: Vec<String>,
    pub secrets: BTreeMap<String, SecretConfig>,
    /// Configuration file path, or [`DEFAULT_SOURCE`].
    pub source: String,
}

impl Config {
    /// Defaults for a project root.
    pub fn with_defaults(cwd: PathBuf, project: PathBuf, source: Option<String>) -> Self {
        Self {
            cwd,
            project,
            extension: DEFAULT_EXTENSION.to_string(),
            gitignore: true,
            ignore_files: default_ignore_files(),
            secrets: BTreeMap::new(),
            source: source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        }
    }

    /// Overlay validated input on top of `self`.
    pub fn merge(mut self, input: ConfigInput) -> Self {
        if let Some(extension) = input.extension {
            self.extension = extension;
        }
        if let Some(gitignore) = input.gitignore {
            self.gitignore = gitignore;
        }
        if let Some(ignore_files) = input.ignore_files {
            self.ignore_files = ignore_files;
        }
        if let Some(secrets) = input.secrets {
            self.secrets = secrets;
        }
        self
    }

    /// Key used for this project in the store.
    pub fn project_key(&self) -> String {
        self.project.to_string_lossy().into_owned()
    }

    /// Secrets whose token is `token`.
    pub fn secrets_using(&self, token: &str) -> impl Iterator<Item = (&String, &SecretConfig)> {
        self.secrets
            .iter()
            .filter(move |(_, secret)| secret.token == token)
    }
}

impl Context {
    /// Defaults for the current project, without reading any config file.
    pub fn default_config(&self) -> Config {
        resolver::default_config(self.options(), None)
    }

    /// The project configuration, resolved once per context.
    ///
    /// A configuration file that fails validation is reported and replaced
    /// by the defaults. A missing project root is fatal.
    pub fn config(&self) -> Result<Arc<Config>> {
        let resolved = self.config.get_or_init(|| {
            resolver::resolve(self.options(), self.issues())
                .ok()
                .map(Arc::new)
        });
        match resolved {
            Some(config) => Ok(Arc::clone(config)),
            None => Err(self.issues().error()),
        }
    }
}
