// src/coordinator/state.rs

//! Shared reload coordination state: the gate, the epoch and the drain
//! signal.
//!
//! Every field is mutated through atomics only. Nothing here is held across
//! a worker restart, so session delivery tasks only ever touch this state
//! briefly.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use tokio::sync::Notify;
use tracing::warn;

/// Gate + epoch + drain for one reload coordinator.
///
/// - The gate is `false` when idle and `true` while a reload is running (or
///   while shutdown is blocking new reloads). Only `try_begin_reload` may
///   move it from idle to reloading.
/// - The epoch identifies the live watch generation. Sessions capture it
///   when they are created; an event whose captured epoch differs from the
///   live one is stale.
/// - The drain counts reloads in flight so shutdown can wait for them.
#[derive(Debug, Default)]
pub struct ReloadState {
    reloading: AtomicBool,
    epoch: AtomicU64,
    drain: DrainSignal,
}

impl ReloadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically move the gate from idle to reloading.
    ///
    /// Returns `false` if a reload is already running or shutdown has
    /// blocked the gate.
    pub fn try_begin_reload(&self) -> bool {
        self.reloading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Put the gate back to idle.
    pub fn release_gate(&self) {
        self.reloading.store(false, Ordering::SeqCst);
    }

    /// Force the gate closed, whatever its current state.
    pub fn block_gate(&self) {
        self.reloading.store(true, Ordering::SeqCst);
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading.load(Ordering::SeqCst)
    }

    /// Start a new generation and return its epoch.
    pub fn bump_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The live epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn drain(&self) -> &DrainSignal {
        &self.drain
    }
}

/// Counter of in-flight reloads that shutdown can wait on.
///
/// The count never goes below zero; an unmatched `exit` is logged and
/// ignored.
#[derive(Debug, Default)]
pub struct DrainSignal {
    count: AtomicUsize,
    zero: Notify,
}

impl DrainSignal {
    pub fn enter(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        match self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| c.checked_sub(1))
        {
            Ok(1) => self.zero.notify_waiters(),
            Ok(_) => {}
            Err(_) => warn!("drain signal exited more often than entered; ignoring"),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Wait until no reload is in flight.
    ///
    /// Returns immediately when the count is already zero.
    pub async fn wait(&self) {
        loop {
            let notified = self.zero.notified();
            tokio::pin!(notified);
            // Register before checking the count so a concurrent `exit`
            // cannot slip between the check and the await.
            notified.as_mut().enable();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}
