use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::grammar::Language;

/// Find every supported source file under `root`, relative to `root`.
///
/// Hidden directories and `output_dir` are never entered. The config's
/// include/exclude prefixes decide which of the remaining files are kept.
/// Paths come back sorted so batch runs are reproducible.
pub fn scan(root: &Path, config: &Config, output_dir: &Path) -> Vec<PathBuf> {
    let output_dir = comparable(output_dir);
    let mut found = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            return e.depth() == 0 || !(is_hidden(e) || is_output_dir(e, &output_dir));
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {e}");
                continue;
            },
        };
        if !entry.file_type().is_file() || Language::for_path(entry.path()).is_err() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path()).to_path_buf();
        if !config.should_scan(&crate::slicer::to_slash(&relative)) {
            tracing::debug!(path = %relative.display(), "excluded by config");
            continue;
        }
        found.push(relative);
    }

    tracing::debug!(files = found.len(), root = %root.display(), "scanned sources");
    return found;
}

/// `path` resolved through the filesystem when it exists, else made absolute
/// and normalized lexically. Relative and absolute spellings of one directory
/// compare equal.
fn comparable(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    return match std::path::absolute(path) {
        Ok(absolute) => normalize_path(&absolute),
        Err(_) => normalize_path(path),
    };
}

/// Whether `entry` is the directory generated output is written to.
fn is_output_dir(entry: &DirEntry, output_dir: &Path) -> bool {
    return entry.file_type().is_dir() && comparable(entry.path()) == output_dir;
}

/// Dot-prefixed file or directory name.
fn is_hidden(entry: &DirEntry) -> bool {
    return entry.file_name().to_str().is_some_and(|name| return name.starts_with('.'));
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    return components.iter().collect();
}

/// Handle a single path component during normalization.
/// Pops the last component for `..` when possible, preserves it otherwise.
fn push_normalized_component<'a>(components: &mut Vec<Component<'a>>, component: Component<'a>) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => {
            let can_pop = matches!(
                components.last(),
                Some(c) if !matches!(c, Component::ParentDir | Component::RootDir)
            );
            if can_pop {
                components.pop();
            } else {
                components.push(component);
            }
        },
        other => components.push(other),
    }
}
