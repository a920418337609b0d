//! Configuration file discovery and loading

use std::path::{Path, PathBuf};

use serde_json::Value;
use vaulty_fs::{ConfigStore, NormalizedPath, find_up, io};

use super::validation::{format_violations, validate};
use super::Config;
use crate::context::Options;
use crate::issue::{IssueInput, IssuesCollector, Scope};
use crate::Result;

const PACKAGE_JSON: &str = "package.json";
const PACKAGE_KEY: &str = "vaulty";

/// Configuration file names, in lookup order within one directory.
///
/// `package.json` only counts when it has a `vaulty` key.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    PACKAGE_JSON,
    ".vaultyrc",
    ".vaultyrc.json",
    ".vaultyrc.yaml",
    ".vaultyrc.yml",
    ".vaultyrc.toml",
    "vaulty.config.json",
    "vaulty.config.yaml",
    "vaulty.config.yml",
    "vaulty.config.toml",
];

/// Files that mark a project root when no configuration file exists.
pub const PROJECT_MARKERS: &[&str] = &[
    PACKAGE_JSON,
    "Cargo.toml",
    "pyproject.toml",
    "go.mod",
    ".git",
];

/// Nearest configuration file at or above `cwd`.
pub fn find_config_file(cwd: &Path) -> Option<PathBuf> {
    let start = dunce::canonicalize(cwd).unwrap_or_else(|_| cwd.to_path_buf());
    start.ancestors().find_map(|dir| {
        CONFIG_FILE_NAMES.iter().find_map(|name| {
            let candidate = dir.join(name);
            if !candidate.is_file() {
                return None;
            }
            if *name == PACKAGE_JSON && !package_has_config(&candidate) {
                return None;
            }
            Some(candidate)
        })
    })
}

fn package_has_config(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok())
        .is_some_and(|package| package.get(PACKAGE_KEY).is_some())
}

/// Raw configuration value stored in `path`.
fn load_raw(path: &Path) -> std::result::Result<Value, String> {
    let normalized = NormalizedPath::new(path);
    let content = io::read_text(&normalized).map_err(|e| e.to_string())?;

    if path.file_name().is_some_and(|name| name == PACKAGE_JSON) {
        let package: Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        return Ok(package.get(PACKAGE_KEY).cloned().unwrap_or(Value::Null));
    }

    if content.trim().is_empty() {
        return Ok(Value::Null);
    }

    ConfigStore::new()
        .parse::<Value>(&normalized, &content)
        .map_err(|e| e.to_string())
}

fn absolute(cwd: &Path) -> PathBuf {
    dunce::canonicalize(cwd).unwrap_or_else(|_| cwd.to_path_buf())
}

/// Defaults for the project containing `options.cwd`.
///
/// The project root is the directory of `config_path` when given, else the
/// directory of the nearest project marker. It is empty when neither exists.
pub(super) fn default_config(options: &Options, config_path: Option<&Path>) -> Config {
    let cwd = absolute(&options.cwd);
    let project = match config_path {
        Some(path) => path.parent().map(Path::to_path_buf),
        None => find_up(&cwd, PROJECT_MARKERS)
            .and_then(|marker| marker.parent().map(Path::to_path_buf)),
    }
    .unwrap_or_default();

    Config::with_defaults(
        cwd,
        project,
        config_path.map(|p| p.to_string_lossy().into_owned()),
    )
}

/// Locate, load and validate the configuration.
pub(super) fn resolve(options: &Options, issues: &IssuesCollector) -> Result<Config> {
    let cwd = absolute(&options.cwd);

    let config_path = match &options.config {
        Some(explicit) => {
            let path = absolute(&cwd.join(explicit));
            if !path.is_file() {
                let issues = issues.scoped(Scope::Config, Some(path.to_string_lossy()));
                return Err(issues.fail(IssueInput::error("Configuration file not found")));
            }
            Some(path)
        }
        None => find_config_file(&cwd),
    };

    let defaults = default_config(options, config_path.as_deref());
    let issues = issues.scoped(Scope::Config, Some(defaults.source.clone()));

    if defaults.project.as_os_str().is_empty() {
        return Err(issues.fail(IssueInput::error(format!(
            "No project found from {}",
            cwd.display()
        ))));
    }

    let Some(path) = config_path else {
        tracing::debug!(project = %defaults.project.display(), "no configuration file, using defaults");
        return Ok(defaults);
    };
    tracing::debug!(path = %path.display(), "loading configuration");

    let raw = match load_raw(&path) {
        Ok(raw) => raw,
        Err(message) => {
            issues.add(IssueInput::error(format!(
                "Invalid configuration file\n- {message}"
            )));
            return Ok(defaults);
        }
    };

    match validate(&raw) {
        Ok(input) => Ok(defaults.merge(input)),
        Err(violations) => {
            issues.add(IssueInput::error(format!(
                "Invalid configuration file\n{}",
                format_violations(&violations)
            )));
            Ok(defaults)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn package_json_without_key_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), r#"{"name": "x"}"#).unwrap();
        fs::write(temp.path().join(".vaultyrc.yml"), "extension: .secret\n").unwrap();

        let found = find_config_file(temp.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), ".vaultyrc.yml");
    }

    #[test]
    fn package_json_with_key_wins() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("package.json"),
            r#"{"name": "x", "vaulty": {"extension": "secret"}}"#,
        )
        .unwrap();
        fs::write(temp.path().join(".vaultyrc.yml"), "extension: .other\n").unwrap();

        let found = find_config_file(temp.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "package.json");
        assert_eq!(
            load_raw(&found).unwrap(),
            serde_json::json!({"extension": "secret"})
        );
    }

    #[test]
    fn search_walks_up() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".vaultyrc"), "gitignore: false\n").unwrap();
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dunce::canonicalize(temp.path().join(".vaultyrc")).unwrap());
    }

    #[test]
    fn empty_rc_is_null() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".vaultyrc");
        fs::write(&path, "\n").unwrap();
        assert_eq!(load_raw(&path).unwrap(), Value::Null);
    }
}
