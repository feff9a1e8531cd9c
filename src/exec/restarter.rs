// src/exec/restarter.rs

//! Pluggable worker restart abstraction.
//!
//! The reload coordinator talks to a `WorkerRestarter` instead of the
//! process pool directly. This makes it easy to swap in a fake restarter in
//! tests while keeping the production implementation in [`super::pool`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::exec::pool::WorkerPool;
use crate::types::WorkerConfig;

/// Trait abstracting how the worker pool is restarted.
///
/// The returned future resolves once the restart has fully completed.
/// Failures are the implementation's business (log them); the coordinator
/// never sees them.
pub trait WorkerRestarter: Send + Sync {
    fn restart_workers<'a>(
        &'a self,
        workers: &'a [WorkerConfig],
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Real restarter used in production: stops every instance in the shared
/// pool and starts the given worker groups again.
#[derive(Debug, Clone)]
pub struct PoolRestarter {
    pool: Arc<Mutex<WorkerPool>>,
}

impl PoolRestarter {
    pub fn new(pool: Arc<Mutex<WorkerPool>>) -> Self {
        Self { pool }
    }
}

impl WorkerRestarter for PoolRestarter {
    fn restart_workers<'a>(
        &'a self,
        workers: &'a [WorkerConfig],
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut pool = self.pool.lock().await;
            pool.restart(workers).await;
        })
    }
}
