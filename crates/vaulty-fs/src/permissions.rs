//! Unix permission probes

use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Permission bits (`0o777` mask) of a file, `None` if it does not exist.
///
/// Always `None` on platforms without Unix permissions.
pub fn file_mode(path: impl AsRef<Path>) -> Option<u32> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path.as_ref())
            .ok()
            .map(|meta| meta.permissions().mode() & 0o777)
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        None
    }
}

/// Set the permission bits of a file.
pub fn set_file_mode(path: impl AsRef<Path>, mode: u32) -> Result<()> {
    let path = path.as_ref();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .map_err(|e| Error::io(path, e))?;
    }
    #[cfg(not(unix))]
    {
        let _ = (mode, fs::metadata(path).map_err(|e| Error::io(path, e))?);
    }
    Ok(())
}

/// Render permission bits the way `chmod` takes them, e.g. `600`.
pub fn format_mode(mode: u32) -> String {
    format!("{:o}", mode & 0o777)
}

/// Whether a file could be written at `path`.
///
/// The parent directory must exist and be writeable; an existing file must
/// not be read-only.
pub fn is_path_writeable(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    let Some(parent) = path.parent() else {
        return false;
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };

    let dir_writeable = fs::metadata(parent)
        .map(|meta| meta.is_dir() && !meta.permissions().readonly())
        .unwrap_or(false);

    let file_writeable = match fs::metadata(path) {
        Ok(meta) => !meta.permissions().readonly(),
        Err(_) => true,
    };

    dir_writeable && file_writeable
}
