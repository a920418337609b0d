//! Template discovery
//!
//! Walks the project root for files ending with the template extension,
//! honouring the configured ignore files, then narrows the result with
//! include/exclude glob patterns.

use std::collections::BTreeSet;
use std::path::Path;

use globset::GlobBuilder;
use ignore::WalkBuilder;

use crate::config::Config;

/// Selection used when no pattern is given.
pub const DEFAULT_PATTERN: &str = "**/*";

/// File names of the ignore files named by the configuration.
///
/// Patterns like `**/.gitignore` contribute their last segment, and
/// `.gitignore` is always used when `gitignore` is enabled.
fn ignore_file_names(config: &Config) -> BTreeSet<String> {
    let mut names: BTreeSet<String> = config
        .ignore_files
        .iter()
        .filter_map(|pattern| pattern.rsplit('/').next())
        .filter(|name| !name.is_empty() && !name.contains(['*', '?', '[']))
        .map(String::from)
        .collect();
    if config.gitignore {
        names.insert(".gitignore".to_string());
    }
    names
}

/// Templates under the project root, relative with `/` separators, sorted.
///
/// A file named exactly like the extension (the local secret cache) is not a
/// template.
pub fn discover(config: &Config) -> Vec<String> {
    let root = config.project.as_path();
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .parents(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .require_git(false)
        .follow_links(false);
    for name in ignore_file_names(config) {
        builder.add_custom_ignore_filename(name);
    }
    builder.filter_entry(|entry| entry.file_name() != ".git");

    let mut found = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry during template discovery");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|kind| kind.is_file()) {
            continue;
        }
        let is_template = entry.file_name().to_str().is_some_and(|name| {
            name.len() > config.extension.len() && name.ends_with(&config.extension)
        });
        if !is_template {
            continue;
        }
        if let Some(relative) = relative_name(root, entry.path()) {
            found.push(relative);
        }
    }

    found.sort();
    tracing::debug!(root = %root.display(), count = found.len(), "discovered templates");
    found
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

/// Keep the paths selected by `patterns`.
///
/// Patterns apply in order: a plain pattern adds its matches, a pattern
/// starting with `!` removes them. No pattern selects everything.
pub fn select(found: &[String], patterns: &[String]) -> Result<Vec<String>, globset::Error> {
    let default = [DEFAULT_PATTERN.to_string()];
    let patterns = if patterns.is_empty() {
        &default[..]
    } else {
        patterns
    };

    let mut selected = vec![false; found.len()];
    for pattern in patterns {
        let (exclude, glob) = match pattern.strip_prefix('!') {
            Some(glob) => (true, glob),
            None => (false, pattern.as_str()),
        };
        let matcher = GlobBuilder::new(glob.trim_start_matches("./"))
            .literal_separator(true)
            .build()?
            .compile_matcher();
        for (index, path) in found.iter().enumerate() {
            if matcher.is_match(path) {
                selected[index] = !exclude;
            }
        }
    }

    Ok(found
        .iter()
        .zip(selected)
        .filter_map(|(path, keep)| keep.then(|| path.clone()))
        .collect())
}
