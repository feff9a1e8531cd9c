use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Kind of filesystem change carried by a [`ChangeEvent`].
///
/// Only these four kinds are ever delivered to the reload coordinator;
/// access notifications and other metadata noise are filtered out by the
/// session that produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Updated,
    Renamed,
    Removed,
}

impl ChangeKind {
    /// The full set of kinds a watch session is configured to report.
    pub const ALL: [ChangeKind; 4] = [
        ChangeKind::Created,
        ChangeKind::Updated,
        ChangeKind::Renamed,
        ChangeKind::Removed,
    ];
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Renamed => "renamed",
            ChangeKind::Removed => "removed",
        };
        f.write_str(s)
    }
}

/// A single path change reported by a watch session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// One watch target: a directory plus the glob its changes must match.
///
/// `pattern` is evaluated against the changed path *relative to*
/// `directory`, with forward slashes (e.g. `"lib/foo.php"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub directory: PathBuf,
    pub pattern: String,
    pub recursive: bool,
}

impl WatchConfig {
    pub fn new(directory: impl Into<PathBuf>, pattern: impl Into<String>, recursive: bool) -> Self {
        Self {
            directory: directory.into(),
            pattern: pattern.into(),
            recursive,
        }
    }
}

/// One group of identical worker processes.
///
/// The coordinator never looks inside this; it is handed as-is to the
/// [`WorkerRestarter`](crate::exec::WorkerRestarter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Name of the `[worker.<name>]` table this group came from.
    pub name: String,
    pub script: PathBuf,
    pub instances: usize,
    pub env: BTreeMap<String, String>,
    /// Program used to run `script`. If `None`, the script is executed
    /// directly and must be executable.
    pub interpreter: Option<String>,
}

impl WorkerConfig {
    pub fn new(name: impl Into<String>, script: impl Into<PathBuf>, instances: usize) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
            instances,
            env: BTreeMap::new(),
            interpreter: None,
        }
    }
}
