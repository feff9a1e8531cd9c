// src/config/validate.rs

use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WorkerwatchError};
use crate::watch::patterns::{compile_pattern, parse_watch_pattern};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = WorkerwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.worker))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_workers(cfg)?;
    validate_workers(cfg)?;
    validate_watch_patterns(cfg)?;
    Ok(())
}

fn ensure_has_workers(cfg: &RawConfigFile) -> Result<()> {
    if cfg.worker.is_empty() {
        return Err(WorkerwatchError::ConfigError(
            "config must contain at least one [worker.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_workers(cfg: &RawConfigFile) -> Result<()> {
    for (name, worker) in cfg.worker.iter() {
        if worker.script.trim().is_empty() {
            return Err(WorkerwatchError::ConfigError(format!(
                "worker '{}' has an empty `script`",
                name
            )));
        }
        if worker.instances == 0 {
            return Err(WorkerwatchError::ConfigError(format!(
                "worker '{}': `instances` must be >= 1 (got 0)",
                name
            )));
        }
        if let Some(interpreter) = &worker.interpreter {
            if interpreter.trim().is_empty() {
                return Err(WorkerwatchError::ConfigError(format!(
                    "worker '{}' has an empty `interpreter`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_watch_patterns(cfg: &RawConfigFile) -> Result<()> {
    // The base directory is irrelevant for syntax checks.
    let base = Path::new(".");
    for raw in cfg.watch.patterns.iter() {
        let target = parse_watch_pattern(raw, base).map_err(|e| {
            WorkerwatchError::ConfigError(format!("invalid watch pattern '{}': {}", raw, e))
        })?;
        compile_pattern(&target.pattern).map_err(|e| {
            WorkerwatchError::ConfigError(format!("invalid watch pattern '{}': {:#}", raw, e))
        })?;
    }
    Ok(())
}
