use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vaulty_git::{GitProbe, IgnoreStatus, ignore_status};
use vaulty_test_utils::git::{real_git_repo, real_git_repo_with_commit};

#[test]
fn test_ignored_file_is_ignored() {
    let temp = TempDir::new().unwrap();
    real_git_repo(temp.path());
    fs::write(temp.path().join(".gitignore"), ".env\n").unwrap();

    let status = ignore_status(&temp.path().join(".env")).unwrap();
    assert_eq!(status, IgnoreStatus::Ignored);
}

#[test]
fn test_unignored_file_is_exposed() {
    let temp = TempDir::new().unwrap();
    real_git_repo(temp.path());

    let status = ignore_status(&temp.path().join(".env")).unwrap();
    assert_eq!(status, IgnoreStatus::Exposed);
    assert!(status.is_exposed());
}

#[test]
fn test_missing_nested_output_uses_directory_rules() {
    let temp = TempDir::new().unwrap();
    real_git_repo(temp.path());
    fs::write(temp.path().join(".gitignore"), "secrets/\n").unwrap();

    let status = ignore_status(&temp.path().join("secrets/deep/app.env")).unwrap();
    assert_eq!(status, IgnoreStatus::Ignored);
}

#[test]
fn test_tracked_file_is_exposed_even_when_ignored() {
    let temp = TempDir::new().unwrap();
    real_git_repo_with_commit(temp.path());

    // README.md is committed by the fixture
    fs::write(temp.path().join(".gitignore"), "README.md\n").unwrap();

    let probe = GitProbe::discover(temp.path()).unwrap().unwrap();
    assert!(probe.is_tracked(&temp.path().join("README.md")).unwrap());
    assert_eq!(
        probe.status(&temp.path().join("README.md")).unwrap(),
        IgnoreStatus::Exposed
    );
}

#[test]
fn test_discover_from_subdirectory() {
    let temp = TempDir::new().unwrap();
    real_git_repo(temp.path());
    fs::create_dir_all(temp.path().join("a/b")).unwrap();

    let probe = GitProbe::discover(&temp.path().join("a/b")).unwrap().unwrap();
    assert_eq!(probe.workdir(), dunce_root(&temp));
}

fn dunce_root(temp: &TempDir) -> std::path::PathBuf {
    std::fs::canonicalize(temp.path()).unwrap()
}
