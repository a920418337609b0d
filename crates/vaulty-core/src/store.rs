//! Token store
//!
//! A YAML file in the home directory holding token values per project. It
//! must only be readable by its owner; anything else is reported with a
//! `chmod` fix. Writes always replace the whole file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::MutexGuard;

use serde::{Deserialize, Serialize};
use vaulty_fs::{ConfigStore, NormalizedPath, file_mode, format_mode, io};

use crate::context::Context;
use crate::fix::FixKind;
use crate::issue::{CollectExt, IssueInput, IssuesCollector, Scope};
use crate::Result;

/// Store file name inside the home directory.
pub const STORE_FILENAME: &str = ".vaulty-store";

/// Owner read/write only.
pub const STORE_FILE_MODE: u32 = 0o600;

/// Tokens saved for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreProject {
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,
}

/// Store file content, keyed by absolute project root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreData {
    #[serde(default)]
    pub projects: BTreeMap<String, StoreProject>,
}

/// The store file and its parsed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    pub source: PathBuf,
    pub exists: bool,
    pub data: StoreData,
}

/// Read the store at `source`, reporting permission and content problems.
///
/// Never fails: unreadable or invalid content yields an empty store.
fn read_store(source: &Path, issues: &IssuesCollector) -> Store {
    let exists = source.is_file();
    if !exists {
        return Store {
            source: source.to_path_buf(),
            exists,
            data: StoreData::default(),
        };
    }

    if let Some(mode) = file_mode(source) {
        if mode != STORE_FILE_MODE {
            issues.add(
                IssueInput::warn(format!(
                    "Permissions are not valid ({} instead of {})",
                    format_mode(mode),
                    format_mode(STORE_FILE_MODE)
                ))
                .with_fix(FixKind::Chmod {
                    path: source.to_path_buf(),
                    mode: STORE_FILE_MODE,
                }),
            );
        }
    }

    let raw = std::fs::read_to_string(source)
        .ok()
        .filter(|content| !content.trim().is_empty())
        .and_then(|content| serde_yaml::from_str::<serde_yaml::Value>(&content).ok())
        .filter(|value| !value.is_null());

    let Some(raw) = raw else {
        issues.add(IssueInput::error("Problem reading the store file").with_fix(FixKind::ResetStore));
        return Store {
            source: source.to_path_buf(),
            exists,
            data: StoreData::default(),
        };
    };

    let data = match serde_yaml::from_value::<StoreData>(raw) {
        Ok(data) => data,
        Err(e) => {
            issues.add(
                IssueInput::error(format!("Invalid store file\n- {e}"))
                    .with_fix(FixKind::ResetStore),
            );
            StoreData::default()
        }
    };

    Store {
        source: source.to_path_buf(),
        exists,
        data,
    }
}

impl Context {
    /// Path of the store file.
    pub fn store_path(&self) -> Result<PathBuf> {
        let home = self.options().home_dir.clone().or_else(dirs::home_dir);
        match home {
            Some(home) => Ok(home.join(STORE_FILENAME)),
            None => Err(self
                .issues()
                .scoped(Scope::Store, None::<String>)
                .fail(IssueInput::error("Unable to locate the home directory"))),
        }
    }

    fn store_issues(&self, source: &Path) -> IssuesCollector {
        self.issues()
            .scoped(Scope::Store, Some(source.to_string_lossy()))
    }

    /// Lock the cached store, reading it on first access.
    fn locked_store(&self) -> Result<MutexGuard<'_, Option<Store>>> {
        let mut cached = self.store.lock().unwrap_or_else(|e| e.into_inner());
        if cached.is_none() {
            let source = self.store_path()?;
            tracing::debug!(path = %source.display(), "reading store");
            *cached = Some(read_store(&source, &self.store_issues(&source)));
        }
        Ok(cached)
    }

    /// The store, read once per context.
    pub fn store(&self) -> Result<Store> {
        let cached = self.locked_store()?;
        Ok(cached.clone().unwrap_or_else(|| Store {
            source: PathBuf::from(STORE_FILENAME),
            exists: false,
            data: StoreData::default(),
        }))
    }

    /// Apply `update` to the store data and rewrite the whole file.
    pub(crate) fn update_store(&self, update: impl FnOnce(&mut StoreData)) -> Result<()> {
        let mut cached = self.locked_store()?;
        let Some(store) = cached.as_mut() else {
            return Err(self.issues().error());
        };
        let mut data = store.data.clone();
        update(&mut data);
        write_file(&store.source, &data, &self.store_issues(&store.source))?;
        store.data = data;
        store.exists = true;
        Ok(())
    }

    /// Replace the store content.
    pub fn write_store(&self, data: StoreData) -> Result<()> {
        self.update_store(|current| *current = data)
    }

    /// Delete the store file. No-op when it does not exist.
    pub fn delete_store(&self) -> Result<()> {
        let mut cached = self.locked_store()?;
        let Some(store) = cached.as_mut() else {
            return Err(self.issues().error());
        };
        io::remove_file(&NormalizedPath::new(&store.source))
            .collect_into(&self.store_issues(&store.source))?;
        store.exists = false;
        store.data = StoreData::default();
        Ok(())
    }

    /// Delete the store and recreate it empty.
    pub fn reset_store(&self) -> Result<()> {
        self.delete_store()?;
        self.write_store(StoreData::default())
    }
}

fn write_file(source: &Path, data: &StoreData, issues: &IssuesCollector) -> Result<()> {
    tracing::debug!(path = %source.display(), "writing store");
    ConfigStore::new()
        .save(&NormalizedPath::new(source), data, Some(STORE_FILE_MODE))
        .collect_into(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueFilters;
    use std::fs;
    use tempfile::TempDir;

    fn read(content: &str) -> (Store, IssuesCollector) {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join(STORE_FILENAME);
        fs::write(&source, content).unwrap();
        vaulty_fs::set_file_mode(&source, STORE_FILE_MODE).unwrap();
        let issues = IssuesCollector::new();
        (read_store(&source, &issues), issues)
    }

    #[test]
    fn missing_store_is_empty_without_issues() {
        let temp = TempDir::new().unwrap();
        let issues = IssuesCollector::new();
        let store = read_store(&temp.path().join(STORE_FILENAME), &issues);

        assert!(!store.exists);
        assert_eq!(store.data, StoreData::default());
        assert_eq!(issues.counts(&IssueFilters::all()).total, 0);
    }

    #[test]
    fn valid_store_parses() {
        let (store, issues) = read("projects:\n  /work/app:\n    tokens:\n      main: s.abc\n");

        assert_eq!(store.data.projects["/work/app"].tokens["main"], "s.abc");
        assert_eq!(issues.counts(&IssueFilters::all()).total, 0);
    }

    #[test]
    fn unparsable_store_offers_reset() {
        let (store, issues) = read("projects: [unclosed\n");

        assert_eq!(store.data, StoreData::default());
        let collection = issues.get(&IssueFilters::all());
        assert_eq!(collection.issues[0].message, "Problem reading the store file");
        assert_eq!(collection.issues[0].fix, Some(FixKind::ResetStore));
    }

    #[test]
    fn unknown_keys_make_store_invalid() {
        let (_, issues) = read("projects: {}\nextra: 1\n");

        let collection = issues.get(&IssueFilters::all());
        assert_eq!(collection.counts.errors, 1);
        assert!(collection.issues[0].message.starts_with("Invalid store file\n- "));
    }

    #[cfg(unix)]
    #[test]
    fn loose_permissions_warn_with_chmod_fix() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join(STORE_FILENAME);
        fs::write(&source, "projects: {}\n").unwrap();
        vaulty_fs::set_file_mode(&source, 0o644).unwrap();

        let issues = IssuesCollector::new();
        read_store(&source, &issues);

        let collection = issues.get(&IssueFilters::all());
        assert_eq!(collection.counts.warnings, 1);
        assert_eq!(
            collection.issues[0].message,
            "Permissions are not valid (644 instead of 600)"
        );
        assert_eq!(
            collection.issues[0].fix,
            Some(FixKind::Chmod {
                path: source,
                mode: 0o600
            })
        );
    }
}
