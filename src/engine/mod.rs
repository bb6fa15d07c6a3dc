// src/engine/mod.rs

//! Watch coordination engine.
//!
//! This module ties together:
//! - the refresh scheduler (one in-flight read per watched file)
//! - the content reader and its delayed retry
//! - `FileWatchEngine`, which owns the registry and the poller, plus the
//!   process-wide instance behind [`crate::watch_file_lines`]

pub mod core;
pub mod reader;
pub mod scheduler;

pub use self::core::{FileWatchEngine, WatchedFile, global, init_global};
pub use scheduler::RefreshScheduler;
