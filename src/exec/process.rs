// src/exec/process.rs

//! Single worker instance spawning.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::types::WorkerConfig;

/// Environment variable telling each instance its index within its group.
pub const INSTANCE_ENV: &str = "WORKERWATCH_INSTANCE";

/// Spawn instance `index` of `worker`.
///
/// - The script is run through `interpreter` when one is configured,
///   otherwise it is executed directly.
/// - The working directory is the script's directory.
/// - `env` is applied on top of the inherited environment.
/// - stdout/stderr are always consumed so pipes never fill; lines are logged
///   at debug.
/// - The child is killed if its handle is dropped.
pub fn spawn_instance(worker: &WorkerConfig, index: usize) -> Result<Child> {
    let mut cmd = match &worker.interpreter {
        Some(interpreter) => {
            let mut c = Command::new(interpreter);
            c.arg(&worker.script);
            c
        }
        None => Command::new(&worker.script),
    };

    if let Some(dir) = worker.script.parent().filter(|d| !d.as_os_str().is_empty()) {
        cmd.current_dir(dir);
    }

    cmd.envs(&worker.env)
        .env(INSTANCE_ENV, index.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().with_context(|| {
        format!(
            "spawning instance {} of worker '{}' ({})",
            index,
            worker.name,
            worker.script.display()
        )
    })?;

    info!(
        worker = %worker.name,
        instance = index,
        pid = ?child.id(),
        "worker instance started"
    );

    if let Some(stdout) = child.stdout.take() {
        relay_output(worker.name.clone(), index, "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        relay_output(worker.name.clone(), index, "stderr", stderr);
    }

    Ok(child)
}

fn relay_output<R>(worker: String, index: usize, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(worker = %worker, instance = index, stream, "{}", line);
        }
    });
}
