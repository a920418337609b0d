//! Git repository fixtures at three realism levels.
//!
//! Pick the cheapest one the test needs.

use std::fs;
use std::path::Path;

/// Creates a `.git` directory skeleton without an object store.
///
/// Realism level: **FAKE**. Enough for project root detection, not for
/// anything that opens the repository.
///
/// # Panics
/// Panics if the filesystem operations fail.
pub fn fake_git_dir(path: &Path) {
    fs::create_dir_all(path.join(".git/refs/heads"))
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to create .git: {e}"));
    fs::write(path.join(".git/HEAD"), "ref: refs/heads/main\n")
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to write HEAD: {e}"));
}

/// Initialises a real git repository with `git2` and an empty history.
///
/// Realism level: **REAL**. Use for ignore-rule tests where nothing needs
/// to be tracked yet.
///
/// # Panics
/// Panics if `git2::Repository::init` fails.
pub fn real_git_repo(path: &Path) -> git2::Repository {
    git2::Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "real_git_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// Initialises a real repository and commits a `README.md`.
///
/// Realism level: **REAL WITH HISTORY**. Use when a test needs a tracked
/// file in the index.
///
/// # Panics
/// Panics if any git operation fails.
pub fn real_git_repo_with_commit(path: &Path) -> git2::Repository {
    let repo = real_git_repo(path);
    fs::write(path.join("README.md"), "# Test")
        .unwrap_or_else(|e| panic!("real_git_repo_with_commit: failed to write README.md: {e}"));
    commit_paths(&repo, &["README.md"], "Initial commit");
    repo
}

/// Stage `paths` (relative to the work tree) and commit them on HEAD.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_paths(repo: &git2::Repository, paths: &[&str], message: &str) {
    let mut index = repo.index().unwrap();
    for path in paths {
        index
            .add_path(Path::new(path))
            .unwrap_or_else(|e| panic!("commit_paths: failed to stage {path}: {e}"));
    }
    index.write().unwrap();

    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let signature = git2::Signature::now("Test User", "test@test.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parents,
    )
    .unwrap_or_else(|e| panic!("commit_paths: failed to commit: {e}"));
}
