// src/exec/pool.rs

//! Owner of every running worker process.

use tokio::process::Child;
use tracing::{debug, error, info, warn};

use crate::exec::process::spawn_instance;
use crate::types::WorkerConfig;

/// Internal handle for a running worker instance.
#[derive(Debug)]
struct WorkerInstance {
    worker: String,
    index: usize,
    child: Child,
}

/// The set of worker processes currently supervised.
///
/// Instances are started per [`WorkerConfig`] (`instances` copies each).
/// There is no automatic respawn when an instance exits on its own; the
/// next restart brings the whole pool back to its configured size.
#[derive(Debug, Default)]
pub struct WorkerPool {
    instances: Vec<WorkerInstance>,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start every instance of every worker group.
    ///
    /// An instance that fails to spawn is logged and skipped; the others
    /// still start. Returns the number of instances started.
    pub fn start(&mut self, workers: &[WorkerConfig]) -> usize {
        let mut started = 0;
        for worker in workers {
            for index in 0..worker.instances {
                match spawn_instance(worker, index) {
                    Ok(child) => {
                        self.instances.push(WorkerInstance {
                            worker: worker.name.clone(),
                            index,
                            child,
                        });
                        started += 1;
                    }
                    Err(err) => {
                        let err = format!("{err:#}");
                        error!(
                            worker = %worker.name,
                            instance = index,
                            error = %err,
                            "failed to start worker instance"
                        );
                    }
                }
            }
        }
        started
    }

    /// Stop every instance, then start the given groups again.
    pub async fn restart(&mut self, workers: &[WorkerConfig]) {
        info!("restarting workers");
        self.stop_all().await;
        let started = self.start(workers);
        info!(started, "workers restarted");
    }

    /// Kill and reap every instance.
    pub async fn shutdown(&mut self) {
        self.stop_all().await;
        info!("worker pool shut down");
    }

    /// Number of instances that have not exited yet.
    pub fn running(&mut self) -> usize {
        let mut running = 0;
        for instance in &mut self.instances {
            if matches!(instance.child.try_wait(), Ok(None)) {
                running += 1;
            }
        }
        running
    }

    async fn stop_all(&mut self) {
        for mut instance in self.instances.drain(..) {
            match instance.child.try_wait() {
                Ok(Some(status)) => {
                    debug!(
                        worker = %instance.worker,
                        instance = instance.index,
                        ?status,
                        "worker instance had already exited"
                    );
                    continue;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        worker = %instance.worker,
                        instance = instance.index,
                        error = %err,
                        "failed to poll worker instance"
                    );
                }
            }

            if let Err(err) = instance.child.kill().await {
                warn!(
                    worker = %instance.worker,
                    instance = instance.index,
                    error = %err,
                    "failed to kill worker instance"
                );
            } else {
                debug!(
                    worker = %instance.worker,
                    instance = instance.index,
                    "worker instance stopped"
                );
            }
        }
    }
}
