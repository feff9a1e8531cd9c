// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use tracing::warn;

use crate::types::WatchConfig;
use crate::watch::path_utils::relative_str;

/// Characters that turn a path component into a glob component.
const GLOB_CHARS: &[char] = &['*', '?', '[', '{'];

/// Split a shell-style watch pattern into a [`WatchConfig`].
///
/// The leading components up to (but excluding) the first component that
/// contains a glob character, or that looks like a file name, become the
/// watched directory. The rest is the glob matched against paths relative
/// to that directory:
///
/// | raw                  | directory | pattern    | recursive |
/// |----------------------|-----------|------------|-----------|
/// | `./src/**/*.php`     | `src`     | `**/*.php` | yes       |
/// | `./src/*.php`        | `src`     | `*.php`    | no        |
/// | `./src/worker.php`   | `src`     | `worker.php` | no      |
/// | `./src`              | `src`     | `**`       | yes       |
///
/// Relative directories are made absolute against `base`.
pub fn parse_watch_pattern(raw: &str, base: &Path) -> Result<WatchConfig> {
    let normalized = raw.trim().replace('\\', "/");
    if normalized.is_empty() {
        bail!("watch pattern is empty");
    }

    let absolute = normalized.starts_with('/');
    let parts: Vec<&str> = normalized
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();

    let split_at = parts
        .iter()
        .enumerate()
        .position(|(i, part)| {
            let is_glob = part.contains(GLOB_CHARS);
            let is_file_name = i == parts.len() - 1 && looks_like_file_name(part);
            is_glob || is_file_name
        })
        .unwrap_or(parts.len());

    let (dir_parts, glob_parts) = parts.split_at(split_at);

    let mut directory = if absolute {
        PathBuf::from("/")
    } else {
        base.to_path_buf()
    };
    for part in dir_parts {
        directory.push(part);
    }
    let directory = std::path::absolute(&directory)
        .with_context(|| format!("resolving watch directory {:?}", directory))?;

    let (pattern, recursive) = if glob_parts.is_empty() {
        ("**".to_string(), true)
    } else {
        let pattern = glob_parts.join("/");
        let recursive = pattern.contains("**");
        (pattern, recursive)
    };

    Ok(WatchConfig {
        directory,
        pattern,
        recursive,
    })
}

fn looks_like_file_name(part: &str) -> bool {
    part != "." && part != ".." && part.contains('.')
}

/// Compile a watch glob.
///
/// `*` and `?` never cross a `/`; `**` spans any number of directories.
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// A [`WatchConfig`] with its glob compiled once.
///
/// Sessions hold one of these so that matching an event does not recompile
/// the pattern.
#[derive(Clone)]
pub struct WatchMatcher {
    config: WatchConfig,
    glob: Option<GlobMatcher>,
}

impl fmt::Debug for WatchMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchMatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WatchMatcher {
    /// Build a matcher. An invalid glob produces a matcher that never
    /// matches; config validation rejects those before they get here.
    pub fn new(config: WatchConfig) -> Self {
        let glob = match compile_pattern(&config.pattern) {
            Ok(g) => Some(g),
            Err(err) => {
                warn!(
                    pattern = %config.pattern,
                    error = %err,
                    "watch pattern does not compile; it will never match"
                );
                None
            }
        };
        Self { config, glob }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Returns true if a change to `path` is of interest to this watch
    /// target.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(glob) = &self.glob else {
            return false;
        };
        let Some(rel) = relative_str(&self.config.directory, path) else {
            return false;
        };
        if rel.is_empty() {
            // The watched directory itself.
            return false;
        }
        if !self.config.recursive && rel.contains('/') {
            return false;
        }
        glob.is_match(&rel)
    }
}

/// Whether a change to `path` is of interest to `config`.
///
/// One-shot form of [`WatchMatcher::matches`].
pub fn matches_pattern(path: &Path, config: &WatchConfig) -> bool {
    WatchMatcher::new(config.clone()).matches(path)
}
