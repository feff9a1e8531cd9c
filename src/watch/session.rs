// src/watch/session.rs

//! The seam between the reload coordinator and whatever produces
//! filesystem events.
//!
//! A session publishes *batches* of [`ChangeEvent`]s into an [`EventSink`].
//! The coordinator owns the receiving end and runs its decision procedure
//! in a delivery task per session, so a session's own delivery loop never
//! blocks on a reload.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::errors::Result;
use crate::types::{ChangeEvent, ChangeKind};

/// Debounce latency applied to every watch session.
///
/// Bursts of events inside this window are delivered as one batch.
pub const WATCHER_LATENCY: Duration = Duration::from_millis(150);

/// Sending side of a session's batch channel.
pub type EventSink = mpsc::UnboundedSender<Vec<ChangeEvent>>;

/// Receiving side of a session's batch channel.
pub type EventStream = mpsc::UnboundedReceiver<Vec<ChangeEvent>>;

/// How a session should observe its directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub recursive: bool,
    pub follow_symlinks: bool,
    /// Only events of these kinds are published.
    pub event_types: Vec<ChangeKind>,
    pub latency: Duration,
}

impl SessionOptions {
    /// Options used by the reload coordinator: no symlink following, all
    /// four change kinds, [`WATCHER_LATENCY`].
    pub fn for_reload(recursive: bool) -> Self {
        Self {
            recursive,
            follow_symlinks: false,
            event_types: ChangeKind::ALL.to_vec(),
            latency: WATCHER_LATENCY,
        }
    }
}

/// A live subscription to change notifications for a set of directories.
///
/// Batches must not be published before [`start`](Self::start) or after
/// [`stop`](Self::stop). `destroy` releases the underlying watcher and
/// closes the sink; sessions are not reusable afterwards.
pub trait WatchSession: Send + fmt::Debug {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn destroy(&mut self) -> Result<()>;
}

/// Constructs watch sessions.
///
/// Production code uses
/// [`NotifySessionFactory`](crate::watch::notify_session::NotifySessionFactory);
/// tests can provide sessions whose batches are injected by hand.
pub trait SessionFactory: Send + Sync {
    /// Build a session over `paths` that will publish into `sink` once
    /// started.
    ///
    /// A returned error means no session exists; nothing has to be torn
    /// down by the caller.
    fn new_session(
        &self,
        paths: &[PathBuf],
        sink: EventSink,
        options: &SessionOptions,
    ) -> Result<Box<dyn WatchSession>>;
}
