//! [`TestProject`] builder for vaulty test scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Store file name under the isolated home directory.
pub const STORE_FILE: &str = ".vaulty-store";

/// A temporary project directory paired with a temporary home directory.
///
/// The project gets a `package.json` marker so root detection stops there.
///
/// # Example
///
/// ```rust,no_run
/// use vaulty_test_utils::project::TestProject;
///
/// let project = TestProject::new();
/// project.write_config(".vaultyrc.yml", "extension: .vaulty\n");
/// project.write_file(".env.vaulty", "A={{ secrets.app.key }}\n");
/// project.assert_file_exists(".env.vaulty");
/// ```
pub struct TestProject {
    project_dir: TempDir,
    home_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create a project with a `package.json` marker and an empty home.
    pub fn new() -> Self {
        let project = Self::bare();
        project.write_file("package.json", "{\"name\": \"fixture\"}\n");
        project
    }

    /// Create a project directory without any project marker.
    pub fn bare() -> Self {
        Self {
            project_dir: TempDir::new().unwrap(),
            home_dir: TempDir::new().unwrap(),
        }
    }

    /// Root of the project directory.
    pub fn root(&self) -> &Path {
        self.project_dir.path()
    }

    /// Isolated home directory.
    pub fn home(&self) -> &Path {
        self.home_dir.path()
    }

    /// Path of the store file inside the isolated home.
    pub fn store_path(&self) -> PathBuf {
        self.home().join(STORE_FILE)
    }

    /// Initialise the project as a real git repository.
    pub fn init_git(&self) -> git2::Repository {
        crate::git::real_git_repo(self.root())
    }

    /// Write `content` to `path` relative to the project root, creating
    /// parent directories.
    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("write_file: failed to write {}: {e}", full_path.display()));
        full_path
    }

    /// Write a config file at the project root.
    pub fn write_config(&self, name: &str, content: &str) -> PathBuf {
        self.write_file(name, content)
    }

    /// Write the store file with `content` and the given unix mode.
    pub fn write_store(&self, content: &str, mode: u32) -> PathBuf {
        let path = self.store_path();
        fs::write(&path, content).unwrap();
        set_mode(&path, mode);
        path
    }

    /// Read a project file to a string.
    pub fn read_file(&self, path: &str) -> String {
        let full_path = self.root().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Assert that `path` (relative to the project root) exists.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the project root) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}
