// src/watch/mod.rs

//! File watching and change matching.
//!
//! This module is responsible for:
//! - Splitting shell-style watch patterns into directory + glob, and
//!   matching changed paths against them (`globset`).
//! - The `WatchSession` / `SessionFactory` seam the reload coordinator
//!   drives.
//! - A cross-platform, debounced session implementation (`notify` +
//!   `notify-debouncer-full`).
//!
//! It does **not** decide when workers restart; it only turns filesystem
//! changes into batches of [`ChangeEvent`](crate::types::ChangeEvent)s.

pub mod notify_session;
pub mod path_utils;
pub mod patterns;
pub mod session;

pub use notify_session::{NotifySession, NotifySessionFactory};
pub use patterns::{compile_pattern, matches_pattern, parse_watch_pattern, WatchMatcher};
pub use session::{
    EventSink, EventStream, SessionFactory, SessionOptions, WatchSession, WATCHER_LATENCY,
};
