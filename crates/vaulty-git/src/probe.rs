//! Ignore-status probes backed by git2

use std::path::{Path, PathBuf};

use git2::Repository;

use crate::{Error, Result};

/// How git sees a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreStatus {
    /// No enclosing repository was found.
    NotInRepository,
    /// Matched by an ignore rule and not tracked.
    Ignored,
    /// Would be picked up by `git add`, or is already tracked.
    Exposed,
}

impl IgnoreStatus {
    /// `true` when the file could end up in a commit.
    pub fn is_exposed(self) -> bool {
        matches!(self, Self::Exposed)
    }
}

/// A discovered repository and its canonical working directory.
pub struct GitProbe {
    repo: Repository,
    workdir: PathBuf,
}

impl GitProbe {
    /// Discover the repository enclosing `path`.
    ///
    /// `path` does not need to exist; discovery starts from its nearest
    /// existing ancestor. Returns `Ok(None)` when there is no repository.
    pub fn discover(path: &Path) -> Result<Option<Self>> {
        let Some(start) = nearest_existing(path) else {
            return Ok(None);
        };

        let repo = match Repository::discover(&start) {
            Ok(repo) => repo,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let workdir = repo
            .workdir()
            .ok_or_else(|| Error::BareRepository {
                path: repo.path().to_path_buf(),
            })?
            .to_path_buf();
        let workdir = dunce::canonicalize(&workdir).unwrap_or(workdir);

        tracing::trace!(workdir = %workdir.display(), "discovered git repository");
        Ok(Some(Self { repo, workdir }))
    }

    /// The repository's working directory.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Path of `path` relative to the working directory, using `/`.
    fn relative(&self, path: &Path) -> Result<String> {
        let absolute = canonical_lenient(path);
        let relative = absolute
            .strip_prefix(&self.workdir)
            .map_err(|_| Error::OutsideWorkTree {
                path: absolute.clone(),
                workdir: self.workdir.clone(),
            })?;
        Ok(relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }

    /// Whether `path` is recorded in the index.
    pub fn is_tracked(&self, path: &Path) -> Result<bool> {
        let relative = self.relative(path)?;
        let index = self.repo.index()?;
        Ok(index.get_path(Path::new(&relative), 0).is_some())
    }

    /// Classify `path`. Tracked files are exposed even if an ignore rule
    /// matches them.
    pub fn status(&self, path: &Path) -> Result<IgnoreStatus> {
        let relative = self.relative(path)?;
        if relative.is_empty() {
            return Ok(IgnoreStatus::Exposed);
        }

        if self.is_tracked(path)? {
            return Ok(IgnoreStatus::Exposed);
        }

        if self.repo.is_path_ignored(Path::new(&relative))? {
            Ok(IgnoreStatus::Ignored)
        } else {
            Ok(IgnoreStatus::Exposed)
        }
    }
}

/// Classify `path` against the repository that encloses it, if any.
pub fn ignore_status(path: &Path) -> Result<IgnoreStatus> {
    match GitProbe::discover(path)? {
        Some(probe) => probe.status(path),
        None => Ok(IgnoreStatus::NotInRepository),
    }
}

fn nearest_existing(path: &Path) -> Option<PathBuf> {
    let mut current = Some(path);
    while let Some(candidate) = current {
        if candidate.is_dir() {
            return Some(candidate.to_path_buf());
        }
        current = candidate.parent();
    }
    None
}

/// Canonicalize the longest existing prefix and re-append the rest.
fn canonical_lenient(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if let Ok(canonical) = dunce::canonicalize(current) {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (current.file_name(), current.parent()) {
            (Some(name), Some(parent)) => {
                missing.push(name.to_os_string());
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_lenient_keeps_missing_tail() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = dunce::canonicalize(temp.path()).unwrap();
        let path = temp.path().join("a/b/.env");
        assert_eq!(canonical_lenient(&path), root.join("a/b/.env"));
    }

    #[test]
    fn nearest_existing_walks_up() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("missing/dir/file");
        assert_eq!(nearest_existing(&path).unwrap(), temp.path());
    }

    #[test]
    fn outside_repository_is_reported() {
        let temp = tempfile::TempDir::new().unwrap();
        let status = ignore_status(&temp.path().join(".env")).unwrap();
        assert_eq!(status, IgnoreStatus::NotInRepository);
    }
}
