// src/coordinator/mod.rs

//! Reload coordinator.
//!
//! Turns bursts of filesystem events from any number of watch sessions into
//! serialized "restart all workers" actions:
//!
//! - at most one restart runs at a time; events that arrive meanwhile are
//!   dropped, not queued;
//! - events from a superseded watch generation never trigger a restart;
//! - [`ReloadCoordinator::stop_watch`] does not return while a restart is
//!   still running.
//!
//! The shared atomics live in [`state`]; the per-event procedure lives in
//! [`handler`].

pub mod handler;
pub mod state;

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::exec::WorkerRestarter;
use crate::types::{WatchConfig, WorkerConfig};
use crate::watch::patterns::WatchMatcher;
use crate::watch::session::{EventStream, SessionFactory, SessionOptions, WatchSession};

use handler::spawn_delivery;
pub use handler::{handle_batch, handle_event, SessionContext};
pub use state::{DrainSignal, ReloadState};

/// Owns the watch sessions of the live generation and the reload state.
///
/// Must be used from within a Tokio runtime: delivery loops and restarts
/// run as spawned tasks.
pub struct ReloadCoordinator {
    factory: Arc<dyn SessionFactory>,
    restarter: Arc<dyn WorkerRestarter>,
    state: Arc<ReloadState>,
    sessions: Vec<Box<dyn WatchSession>>,
    deliveries: Vec<JoinHandle<()>>,
}

impl fmt::Debug for ReloadCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadCoordinator")
            .field("state", &self.state)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl ReloadCoordinator {
    pub fn new(factory: Arc<dyn SessionFactory>, restarter: Arc<dyn WorkerRestarter>) -> Self {
        Self {
            factory,
            restarter,
            state: Arc::new(ReloadState::new()),
            sessions: Vec::new(),
            deliveries: Vec::new(),
        }
    }

    /// Shared reload state (for tests and diagnostics).
    pub fn state(&self) -> &Arc<ReloadState> {
        &self.state
    }

    /// The live watch generation.
    pub fn epoch(&self) -> u64 {
        self.state.epoch()
    }

    /// Whether any watch session of the live generation is active.
    pub fn is_watching(&self) -> bool {
        !self.sessions.is_empty()
    }

    /// Start watching `watch` targets and restart `workers` on matching
    /// changes.
    ///
    /// - Does nothing if either list is empty.
    /// - Re-initializing while watching stops the previous generation first.
    /// - Either every session starts or none does: any construction or start
    ///   failure tears down what was built and returns the error.
    pub async fn init_watch(
        &mut self,
        watch: &[WatchConfig],
        workers: &[WorkerConfig],
    ) -> Result<()> {
        if watch.is_empty() || workers.is_empty() {
            debug!(
                watch_targets = watch.len(),
                workers = workers.len(),
                "nothing to watch or nothing to restart; watcher disabled"
            );
            return Ok(());
        }

        if self.is_watching() {
            self.stop_watch().await;
        }

        let epoch = self.state.bump_epoch();
        let workers = Arc::new(workers.to_vec());

        let mut built: Vec<(Box<dyn WatchSession>, EventStream, &WatchConfig)> =
            Vec::with_capacity(watch.len());
        for config in watch {
            let (sink, events) = mpsc::unbounded_channel();
            let options = SessionOptions::for_reload(config.recursive);
            match self
                .factory
                .new_session(std::slice::from_ref(&config.directory), sink, &options)
            {
                Ok(session) => built.push((session, events, config)),
                Err(err) => {
                    error!(
                        directory = %config.directory.display(),
                        error = %err,
                        "failed to create watch session"
                    );
                    teardown(built.into_iter().map(|(s, _, _)| s));
                    return Err(err);
                }
            }
        }

        for index in 0..built.len() {
            if let Err(err) = built[index].0.start() {
                error!(
                    directory = %built[index].2.directory.display(),
                    error = %err,
                    "failed to start watch session"
                );
                teardown(built.into_iter().map(|(s, _, _)| s));
                return Err(err);
            }
        }

        self.state.release_gate();

        for (session, events, config) in built {
            let ctx = SessionContext {
                matcher: WatchMatcher::new(config.clone()),
                epoch,
                state: Arc::clone(&self.state),
                workers: Arc::clone(&workers),
                restarter: Arc::clone(&self.restarter),
            };
            self.deliveries.push(spawn_delivery(ctx, events));
            self.sessions.push(session);
            info!(
                directory = %config.directory.display(),
                pattern = %config.pattern,
                recursive = config.recursive,
                "watching for changes"
            );
        }

        Ok(())
    }

    /// Stop watching and wait for an in-flight restart to finish.
    ///
    /// 1. Block the gate so no new reload can begin.
    /// 2. Bump the epoch, invalidating the current generation's events.
    /// 3. Stop and destroy every session; failures are logged only.
    /// 4. End the delivery tasks, then wait for the drain to reach zero.
    ///
    /// Does nothing if no session is active.
    pub async fn stop_watch(&mut self) {
        if self.sessions.is_empty() && self.deliveries.is_empty() {
            return;
        }
        info!("stopping watcher");

        self.state.block_gate();
        self.state.bump_epoch();

        for mut session in self.sessions.drain(..) {
            if let Err(err) = session.stop() {
                error!(?session, error = %err, "failed to stop watch session");
            }
            if let Err(err) = session.destroy() {
                error!(?session, error = %err, "failed to destroy watch session");
            }
        }

        for delivery in self.deliveries.drain(..) {
            delivery.abort();
            if let Err(err) = delivery.await {
                if !err.is_cancelled() {
                    warn!(error = %err, "delivery task failed");
                }
            }
        }

        let in_flight = self.state.drain().in_flight();
        if in_flight > 0 {
            info!(in_flight, "waiting for in-flight reload to finish");
        }
        self.state.drain().wait().await;

        info!("watcher stopped");
    }
}

impl Drop for ReloadCoordinator {
    fn drop(&mut self) {
        for delivery in &self.deliveries {
            delivery.abort();
        }
    }
}

/// Best-effort destruction of sessions that were never installed.
fn teardown(sessions: impl IntoIterator<Item = Box<dyn WatchSession>>) {
    for mut session in sessions {
        if let Err(err) = session.stop() {
            warn!(?session, error = %err, "failed to stop watch session during teardown");
        }
        if let Err(err) = session.destroy() {
            warn!(?session, error = %err, "failed to destroy watch session during teardown");
        }
    }
}
