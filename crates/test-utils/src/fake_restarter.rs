use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;
use workerwatch::exec::WorkerRestarter;
use workerwatch::types::WorkerConfig;

/// A fake restarter that:
/// - records which worker groups each restart was asked for
/// - tracks how many restarts run at the same time
/// - optionally sleeps, or holds every restart until `release()` is called.
#[derive(Debug, Default)]
pub struct FakeRestarter {
    delay: Option<Duration>,
    hold: bool,
    release: Notify,
    started: AtomicUsize,
    completed: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeRestarter {
    /// Restarts complete immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every restart sleeps for `delay` before completing.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Every restart waits for a `release()` before completing.
    pub fn held() -> Self {
        Self {
            hold: true,
            ..Self::default()
        }
    }

    /// Let one held restart complete (or the next one, if none is waiting).
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Highest number of restarts ever observed running at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Worker group names passed to each restart, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl WorkerRestarter for FakeRestarter {
    fn restart_workers<'a>(
        &'a self,
        workers: &'a [WorkerConfig],
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            {
                let mut guard = self.calls.lock().unwrap();
                guard.push(workers.iter().map(|w| w.name.clone()).collect());
            }

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.hold {
                self.release.notified().await;
            }

            self.active.fetch_sub(1, Ordering::SeqCst);
            self.completed.fetch_add(1, Ordering::SeqCst);
        })
    }
}
