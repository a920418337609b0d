//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::time::SystemTime;

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result, permissions};

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so readers never observe a partial file.
/// When `mode` is given it is applied to the temporary file before the
/// rename, so the destination never exists with looser permissions.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], mode: Option<u32>) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: native_path.clone(),
        })?;

    if let Some(mode) = mode {
        permissions::set_file_mode(&temp_path, mode)?;
    }

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))?;

    tracing::debug!(path = %path, bytes = content.len(), "wrote file atomically");
    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically, keeping the mode of an existing
/// file.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    let mode = permissions::file_mode(path.to_native());
    write_atomic(path, content.as_bytes(), mode)
}

/// Remove a file.
///
/// Returns `false` when there was nothing to remove.
pub fn remove_file(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    match fs::remove_file(&native_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}

/// Last modification time of a file, `None` if it does not exist.
pub fn modified(path: &NormalizedPath) -> Option<SystemTime> {
    fs::metadata(path.to_native())
        .and_then(|meta| meta.modified())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn remove_file_missing_is_noop() {
        let temp = TempDir::new().unwrap();
        let path = NormalizedPath::new(temp.path().join("absent"));
        assert!(!remove_file(&path).unwrap());
    }

    #[test]
    fn modified_is_none_for_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(modified(&NormalizedPath::new(temp.path().join("nope"))).is_none());
    }
}
