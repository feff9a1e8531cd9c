// src/exec/mod.rs

//! Worker process layer.
//!
//! This module is responsible for actually running the configured worker
//! scripts, using `tokio::process::Command`, and for restarting them when
//! the reload coordinator asks for it.
//!
//! - [`process`] spawns a single worker instance and relays its output.
//! - [`pool`] owns every running instance and knows how to stop/restart them.
//! - [`restarter`] provides the `WorkerRestarter` trait the coordinator talks
//!   to, and `PoolRestarter`, the production implementation backed by a
//!   [`pool::WorkerPool`]. Tests can replace it with a fake implementation.

pub mod pool;
pub mod process;
pub mod restarter;

pub use pool::WorkerPool;
pub use restarter::{PoolRestarter, WorkerRestarter};
