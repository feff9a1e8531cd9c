// src/watch/notify_session.rs

//! Watch sessions backed by `notify` with `notify-debouncer-full`.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer_opt, DebounceEventResult, Debouncer, RecommendedCache};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::types::{ChangeEvent, ChangeKind};
use crate::watch::session::{EventSink, SessionFactory, SessionOptions, WatchSession};

/// Builds [`NotifySession`]s using the platform's recommended watcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifySessionFactory;

impl SessionFactory for NotifySessionFactory {
    fn new_session(
        &self,
        paths: &[PathBuf],
        sink: EventSink,
        options: &SessionOptions,
    ) -> Result<Box<dyn WatchSession>> {
        Ok(Box::new(NotifySession::new(paths, sink, options)?))
    }
}

/// A debounced `notify` watcher over one or more directories.
///
/// The OS watch is registered on construction so that a missing or
/// unreadable directory surfaces as a construction error. Batches are only
/// forwarded into the sink between `start()` and `stop()`.
pub struct NotifySession {
    paths: Vec<PathBuf>,
    mode: RecursiveMode,
    active: Arc<AtomicBool>,
    debouncer: Option<Debouncer<RecommendedWatcher, RecommendedCache>>,
}

impl fmt::Debug for NotifySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifySession")
            .field("paths", &self.paths)
            .field("mode", &self.mode)
            .field("active", &self.active.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl NotifySession {
    pub fn new(paths: &[PathBuf], sink: EventSink, options: &SessionOptions) -> Result<Self> {
        let paths = paths
            .iter()
            .map(|p| p.canonicalize())
            .collect::<std::io::Result<Vec<_>>>()?;

        let mode = if options.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        let active = Arc::new(AtomicBool::new(false));
        let handler = {
            let active = Arc::clone(&active);
            let event_types = options.event_types.clone();
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    if !active.load(Ordering::SeqCst) {
                        return;
                    }
                    let batch: Vec<ChangeEvent> = events
                        .iter()
                        .filter_map(|e| change_kind(&e.event.kind).map(|kind| (kind, &e.event.paths)))
                        .filter(|(kind, _)| event_types.contains(kind))
                        .flat_map(|(kind, paths)| {
                            paths.iter().map(move |p| ChangeEvent::new(p.clone(), kind))
                        })
                        .collect();
                    if batch.is_empty() {
                        return;
                    }
                    debug!(events = batch.len(), "forwarding debounced batch");
                    if sink.send(batch).is_err() {
                        debug!("event sink closed; dropping batch");
                    }
                }
                Err(errors) => {
                    for err in errors {
                        warn!(error = %err, "file watch error");
                    }
                }
            }
        };

        let config = Config::default().with_follow_symlinks(options.follow_symlinks);
        let mut debouncer = new_debouncer_opt::<_, RecommendedWatcher, RecommendedCache>(
            options.latency,
            None,
            handler,
            RecommendedCache::new(),
            config,
        )?;

        for path in &paths {
            debouncer.watch(path, mode)?;
        }

        Ok(Self {
            paths,
            mode,
            active,
            debouncer: Some(debouncer),
        })
    }
}

impl WatchSession for NotifySession {
    fn start(&mut self) -> Result<()> {
        self.active.store(true, Ordering::SeqCst);
        info!(paths = ?self.paths, recursive = matches!(self.mode, RecursiveMode::Recursive), "watch session started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(debouncer) = self.debouncer.as_mut() {
            for path in &self.paths {
                debouncer.unwatch(path)?;
            }
        }
        debug!(paths = ?self.paths, "watch session stopped");
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.active.store(false, Ordering::SeqCst);
        // Dropping the debouncer ends its thread, which drops the sink.
        if self.debouncer.take().is_some() {
            debug!(paths = ?self.paths, "watch session destroyed");
        }
        Ok(())
    }
}

/// Map a `notify` event kind onto the kinds the coordinator cares about.
fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Renamed),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Updated),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}
