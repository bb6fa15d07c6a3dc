// src/watch/mod.rs

//! Per-file watch state and the two change signals feeding it.
//!
//! This module is responsible for:
//! - The metadata fingerprint used to decide whether a file changed.
//! - The per-file entry (callbacks, pending flag, cached fingerprint) and the
//!   registry holding all of them.
//! - OS change notifications via `notify`, and the periodic poll fallback.
//!
//! It does **not** read file contents; both signals end in
//! [`crate::engine::RefreshScheduler`].

pub mod entry;
pub mod notification;
pub mod poller;
pub mod registry;
pub mod snapshot;

pub use entry::{EntryState, WatchEntry};
pub use notification::{NotifySubscription, handle_notification, subscribe};
pub use poller::{poll_once, spawn_poller};
pub use registry::Registry;
pub use snapshot::MetaSnapshot;
