// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Result, WorkerwatchError};
use crate::types::{WatchConfig, WorkerConfig};
use crate::watch::patterns::parse_watch_pattern;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [watch]
/// patterns = ["./src/**/*.php", "./config"]
///
/// [worker.app]
/// script = "worker.php"
/// instances = 2
/// interpreter = "php"
/// env = { APP_ENV = "dev" }
/// ```
///
/// The `[watch]` section is optional; without it workers run but are never
/// restarted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// File watcher settings from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,

    /// All worker groups from `[worker.<name>]`.
    #[serde(default)]
    pub worker: BTreeMap<String, WorkerSection>,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on every pattern parsing and every worker group being
/// runnable.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub worker: BTreeMap<String, WorkerSection>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchSection {
    /// Shell-style patterns such as `"./src/**/*.php"`.
    ///
    /// The leading directory part selects what is watched; the rest is the
    /// glob a changed file must match. `**` makes the watch recursive.
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// `[worker.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSection {
    /// Script driving the worker process.
    pub script: String,

    /// Number of identical processes to keep running.
    #[serde(default = "default_instances")]
    pub instances: usize,

    /// Extra environment variables for every instance.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Optional program used to run the script (e.g. `"php"`, `"python3"`).
    #[serde(default)]
    pub interpreter: Option<String>,
}

fn default_instances() -> usize {
    1
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        watch: WatchSection,
        worker: BTreeMap<String, WorkerSection>,
    ) -> Self {
        Self { watch, worker }
    }

    /// Resolve the `[watch]` patterns into watch targets.
    ///
    /// Relative directories are resolved against `base` (normally the
    /// directory holding the config file).
    pub fn watch_configs(&self, base: &Path) -> Result<Vec<WatchConfig>> {
        self.watch
            .patterns
            .iter()
            .map(|p| parse_watch_pattern(p, base).map_err(WorkerwatchError::from))
            .collect()
    }

    /// Resolve the `[worker.<name>]` tables into worker groups, in name
    /// order.
    pub fn worker_configs(&self, base: &Path) -> Vec<WorkerConfig> {
        self.worker
            .iter()
            .map(|(name, w)| WorkerConfig {
                name: name.clone(),
                script: resolve_path(base, &w.script),
                instances: w.instances,
                env: w.env.clone(),
                interpreter: w.interpreter.clone(),
            })
            .collect()
    }
}

/// Workers run with the script's directory as working directory, so the
/// script path itself has to be absolute.
fn resolve_path(base: &Path, raw: &str) -> PathBuf {
    let joined = base.join(raw);
    std::path::absolute(&joined).unwrap_or(joined)
}
