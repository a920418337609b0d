//! Upward file discovery

use std::path::{Path, PathBuf};

/// Walk from `start` towards the filesystem root and return the first path
/// `dir/name` that exists, trying `names` in order inside each directory.
pub fn find_up<S: AsRef<str>>(start: &Path, names: &[S]) -> Option<PathBuf> {
    let start = dunce::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());
    let mut current = Some(start.as_path());

    while let Some(dir) = current {
        for name in names {
            let candidate = dir.join(name.as_ref());
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "found upward match");
                return Some(candidate);
            }
        }
        current = dir.parent();
    }

    None
}
