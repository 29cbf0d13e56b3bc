//! Repository directory resolution.

use std::path::{Path, PathBuf};

/// Resolves a repository id from a request path to a directory under `root`.
///
/// Returns `None` when the id walks out of the root or the directory does
/// not exist; the caller maps that to 404.
pub fn resolve_repository(root: &Path, repo: &str) -> Option<PathBuf> {
    let repo = repo.trim_start_matches('/');
    if repo.split('/').any(|segment| segment == "..") {
        return None;
    }

    let dir = root.join(repo);
    if dir.is_dir() { Some(dir) } else { None }
}
