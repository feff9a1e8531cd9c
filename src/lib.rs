// src/lib.rs

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::coordinator::ReloadCoordinator;
use crate::exec::{PoolRestarter, WorkerPool};
use crate::types::{WatchConfig, WorkerConfig};
use crate::watch::NotifySessionFactory;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the worker pool
/// - the reload coordinator and its watch sessions
/// - Ctrl-C handling and an orderly shutdown
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone();
    let cfg = load_and_validate(&config_path)?;

    let root_dir = config_root_dir(&config_path);
    let watch = cfg.watch_configs(&root_dir)?;
    let workers = cfg.worker_configs(&root_dir);

    if args.dry_run {
        print_dry_run(&watch, &workers);
        return Ok(());
    }

    let pool = Arc::new(Mutex::new(WorkerPool::new()));
    {
        let started = pool.lock().await.start(&workers);
        info!(started, "worker pool started");
    }

    let restarter = Arc::new(PoolRestarter::new(Arc::clone(&pool)));
    let mut coordinator = ReloadCoordinator::new(Arc::new(NotifySessionFactory), restarter);

    if let Err(err) = coordinator.init_watch(&watch, &workers).await {
        pool.lock().await.shutdown().await;
        return Err(err.into());
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("failed to listen for Ctrl+C: {e}");
    }
    info!("shutdown requested");

    // Waits for an in-flight restart, so the pool is never torn down
    // mid-restart.
    coordinator.stop_watch().await;
    pool.lock().await.shutdown().await;

    info!("workerwatch exiting");
    Ok(())
}

/// Figure out the directory relative paths in the config refer to.
///
/// - If the config path has a non-empty parent (e.g. "configs/Workerwatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Workerwatch.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print watch targets and worker groups.
fn print_dry_run(watch: &[WatchConfig], workers: &[WorkerConfig]) {
    println!("workerwatch dry-run");
    println!();

    println!("watch ({}):", watch.len());
    for target in watch {
        println!("  - {}", target.directory.display());
        println!("      pattern: {}", target.pattern);
        println!("      recursive: {}", target.recursive);
    }
    if watch.is_empty() {
        println!("  (none; workers will never be restarted)");
    }
    println!();

    println!("workers ({}):", workers.len());
    for worker in workers {
        println!("  - {}", worker.name);
        println!("      script: {}", worker.script.display());
        println!("      instances: {}", worker.instances);
        if let Some(ref interpreter) = worker.interpreter {
            println!("      interpreter: {interpreter}");
        }
        if !worker.env.is_empty() {
            println!("      env: {:?}", worker.env);
        }
    }

    debug!("dry-run complete (nothing started)");
}
