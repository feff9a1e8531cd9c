// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// This is intentionally robust:
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
/// - Removed files can't be canonicalized, so as a last resort we
///   canonicalize the parent directory and re-attach the file name.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    // Fast path: event path already starts with our root.
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    // More robust path: canonicalize both, then try again. This helps on
    // platforms (notably macOS) where different absolute prefixes may be used
    // for the same underlying directory (e.g. symlinks, /private/var/...).
    let root_canon = root.canonicalize().ok()?;
    let path_canon = canonicalize_lenient(path)?;
    path_canon.strip_prefix(&root_canon).ok().map(to_slash)
}

/// Canonicalize `path`, tolerating a final component that no longer exists.
fn canonicalize_lenient(path: &Path) -> Option<PathBuf> {
    if let Ok(p) = path.canonicalize() {
        return Some(p);
    }
    let parent = path.parent()?;
    let name = path.file_name()?;
    parent.canonicalize().ok().map(|p| p.join(name))
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}
