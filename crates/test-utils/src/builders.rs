#![allow(dead_code)]

use std::collections::BTreeMap;

use workerwatch::config::{ConfigFile, RawConfigFile, WatchSection, WorkerSection};
use workerwatch::types::{ChangeEvent, ChangeKind, WatchConfig, WorkerConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                watch: WatchSection::default(),
                worker: BTreeMap::new(),
            },
        }
    }

    pub fn with_worker(mut self, name: &str, worker: WorkerSection) -> Self {
        self.config.worker.insert(name.to_string(), worker);
        self
    }

    pub fn with_watch(mut self, pattern: &str) -> Self {
        self.config.watch.patterns.push(pattern.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `WorkerSection`.
pub struct WorkerSectionBuilder {
    worker: WorkerSection,
}

impl WorkerSectionBuilder {
    pub fn new(script: &str) -> Self {
        Self {
            worker: WorkerSection {
                script: script.to_string(),
                instances: 1,
                env: BTreeMap::new(),
                interpreter: None,
            },
        }
    }

    pub fn instances(mut self, n: usize) -> Self {
        self.worker.instances = n;
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.worker.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn interpreter(mut self, interpreter: &str) -> Self {
        self.worker.interpreter = Some(interpreter.to_string());
        self
    }

    pub fn build(self) -> WorkerSection {
        self.worker
    }
}

/// A single worker group `W` running `worker.sh` once.
pub fn single_worker() -> Vec<WorkerConfig> {
    vec![WorkerConfig::new("W", "/srv/app/worker.sh", 1)]
}

/// Watch `dir` for `pattern`, recursively iff the pattern contains `**`.
pub fn watch_target(dir: &str, pattern: &str) -> WatchConfig {
    WatchConfig::new(dir, pattern, pattern.contains("**"))
}

/// An `Updated` event for `path`.
pub fn updated(path: &str) -> ChangeEvent {
    ChangeEvent::new(path, ChangeKind::Updated)
}
