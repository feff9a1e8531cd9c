// src/coordinator/handler.rs

//! Per-event reload decision procedure.

use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::coordinator::state::ReloadState;
use crate::exec::WorkerRestarter;
use crate::types::{ChangeEvent, WorkerConfig};
use crate::watch::patterns::WatchMatcher;
use crate::watch::session::EventStream;

/// Everything a session's delivery task needs to decide on its events.
///
/// `epoch` is the generation the session was created in; it never changes.
#[derive(Clone)]
pub struct SessionContext {
    pub matcher: WatchMatcher,
    pub epoch: u64,
    pub state: Arc<ReloadState>,
    pub workers: Arc<Vec<WorkerConfig>>,
    pub restarter: Arc<dyn WorkerRestarter>,
}

/// Spawn the delivery task for one session.
///
/// Consumes batches until the session closes its sink (on destroy) or the
/// task is aborted by shutdown.
pub(crate) fn spawn_delivery(
    ctx: SessionContext,
    mut events: EventStream,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(batch) = events.recv().await {
            handle_batch(&ctx, batch).await;
        }
        debug!(
            directory = %ctx.matcher.config().directory.display(),
            epoch = ctx.epoch,
            "delivery loop finished"
        );
    })
}

/// Run the decision procedure over a batch, in order, stopping at the first
/// event that triggers a reload. Returns true if one did.
pub async fn handle_batch(ctx: &SessionContext, batch: Vec<ChangeEvent>) -> bool {
    for event in &batch {
        if handle_event(ctx, event).await {
            return true;
        }
    }
    false
}

/// Decide whether `event` triggers a worker restart. Returns true if it did.
///
/// 1. The path must match the session's watch pattern.
/// 2. The gate must move from idle to reloading; otherwise a reload is
///    already running (or shutdown began) and the event is dropped.
/// 3. Wait until no previous reload is still finishing.
/// 4. Enter the drain, then re-check the epoch: an event from a superseded
///    generation releases everything and is dropped.
/// 5. Spawn the restart. Its task releases the gate and then leaves the
///    drain once the restart has completed.
///
/// Steps 4 and 5 contain no await point.
pub async fn handle_event(ctx: &SessionContext, event: &ChangeEvent) -> bool {
    if !ctx.matcher.matches(&event.path) {
        trace!(path = %event.path.display(), kind = %event.kind, "change does not match watch pattern");
        return false;
    }

    if !ctx.state.try_begin_reload() {
        debug!(
            path = %event.path.display(),
            "reload already in progress; coalescing change"
        );
        return false;
    }

    ctx.state.drain().wait().await;

    ctx.state.drain().enter();
    if ctx.epoch != ctx.state.epoch() {
        ctx.state.release_gate();
        ctx.state.drain().exit();
        debug!(
            path = %event.path.display(),
            event_epoch = ctx.epoch,
            live_epoch = ctx.state.epoch(),
            "discarding change from a stale watch generation"
        );
        return false;
    }

    info!(
        path = %event.path.display(),
        kind = %event.kind,
        "filesystem change detected, restarting workers..."
    );

    let state = Arc::clone(&ctx.state);
    let workers = Arc::clone(&ctx.workers);
    let restarter = Arc::clone(&ctx.restarter);
    tokio::spawn(async move {
        restarter.restart_workers(&workers).await;
        state.release_gate();
        state.drain().exit();
        debug!("reload finished");
    });

    true
}
