use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use workerwatch::errors::{Result, WorkerwatchError};
use workerwatch::types::ChangeEvent;
use workerwatch::watch::{EventSink, SessionFactory, SessionOptions, WatchSession};

/// A session factory whose sessions publish only what a test injects.
///
/// Every session it builds is also recorded as a [`FakeSessionHandle`], so
/// tests can emit batches and inspect the lifecycle calls.
#[derive(Debug, Clone, Default)]
pub struct FakeSessionFactory {
    inner: Arc<Mutex<FactoryState>>,
}

#[derive(Debug, Default)]
struct FactoryState {
    sessions: Vec<FakeSessionHandle>,
    /// Zero-based index of the `new_session` call that should fail.
    fail_at: Option<usize>,
    calls: usize,
    fail_stop: bool,
    fail_start: bool,
}

impl FakeSessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `index`-th (zero-based) construction fail.
    pub fn failing_at(index: usize) -> Self {
        let factory = Self::default();
        factory.inner.lock().unwrap().fail_at = Some(index);
        factory
    }

    /// Sessions built from now on return an error from `stop()`.
    pub fn fail_stop(&self) {
        self.inner.lock().unwrap().fail_stop = true;
    }

    /// Sessions built from now on return an error from `start()`.
    pub fn fail_start(&self) {
        self.inner.lock().unwrap().fail_start = true;
    }

    /// Every session successfully built so far, oldest first.
    pub fn sessions(&self) -> Vec<FakeSessionHandle> {
        self.inner.lock().unwrap().sessions.clone()
    }

    /// Number of `new_session` calls, including failed ones.
    pub fn calls(&self) -> usize {
        self.inner.lock().unwrap().calls
    }
}

impl SessionFactory for FakeSessionFactory {
    fn new_session(
        &self,
        paths: &[PathBuf],
        sink: EventSink,
        options: &SessionOptions,
    ) -> Result<Box<dyn WatchSession>> {
        let mut state = self.inner.lock().unwrap();
        let call = state.calls;
        state.calls += 1;
        if state.fail_at == Some(call) {
            return Err(WorkerwatchError::Other(anyhow!(
                "injected construction failure for {:?}",
                paths
            )));
        }

        let handle = FakeSessionHandle {
            shared: Arc::new(FakeShared {
                paths: paths.to_vec(),
                options: options.clone(),
                sink: Mutex::new(Some(sink)),
                started: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                destroyed: AtomicBool::new(false),
                fail_stop: state.fail_stop,
                fail_start: state.fail_start,
            }),
        };
        state.sessions.push(handle.clone());
        Ok(Box::new(FakeSession { handle }))
    }
}

#[derive(Debug)]
struct FakeShared {
    paths: Vec<PathBuf>,
    options: SessionOptions,
    sink: Mutex<Option<EventSink>>,
    started: AtomicBool,
    stopped: AtomicBool,
    destroyed: AtomicBool,
    fail_stop: bool,
    fail_start: bool,
}

/// Test-side view of a fake session.
#[derive(Debug, Clone)]
pub struct FakeSessionHandle {
    shared: Arc<FakeShared>,
}

impl FakeSessionHandle {
    /// Publish a batch the way a live session would.
    ///
    /// Returns false (and drops the batch) unless the session is started,
    /// not stopped and not destroyed.
    pub fn emit(&self, batch: Vec<ChangeEvent>) -> bool {
        if !self.is_started() || self.is_stopped() || self.is_destroyed() {
            return false;
        }
        match self.shared.sink.lock().unwrap().as_ref() {
            Some(sink) => sink.send(batch).is_ok(),
            None => false,
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.shared.paths.clone()
    }

    pub fn options(&self) -> SessionOptions {
        self.shared.options.clone()
    }

    pub fn is_started(&self) -> bool {
        self.shared.started.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.destroyed.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct FakeSession {
    handle: FakeSessionHandle,
}

impl WatchSession for FakeSession {
    fn start(&mut self) -> Result<()> {
        if self.handle.shared.fail_start {
            return Err(WorkerwatchError::Other(anyhow!("injected start failure")));
        }
        self.handle.shared.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.handle.shared.stopped.store(true, Ordering::SeqCst);
        if self.handle.shared.fail_stop {
            return Err(WorkerwatchError::Other(anyhow!("injected stop failure")));
        }
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.handle.shared.destroyed.store(true, Ordering::SeqCst);
        self.handle.shared.sink.lock().unwrap().take();
        Ok(())
    }
}
