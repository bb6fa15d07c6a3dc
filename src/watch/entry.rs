// src/watch/entry.rs

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error};

use crate::errors::WatchError;
use crate::types::{ErrorCallback, LinesCallback};
use crate::watch::notification::NotifySubscription;
use crate::watch::snapshot::MetaSnapshot;

/// Mutable part of a [`WatchEntry`]. Only ever touched through
/// [`WatchEntry::lock`].
#[derive(Debug)]
pub struct EntryState {
    /// A read task is queued, running, or waiting out its retry delay.
    pub pending: bool,
    /// Most recently observed metadata.
    pub last_meta: MetaSnapshot,
    /// Failed reads since the last successful one.
    pub failures: u32,
    /// Number of reads started so far; tags each read's result.
    pub generation: u64,
}

/// What the consumer has been handed so far.
#[derive(Debug, Default)]
struct Delivered {
    generation: u64,
    /// Content of the last delivery, cleared whenever an error goes out.
    lines: Option<Vec<String>>,
}

/// Everything the engine knows about one watched file.
pub struct WatchEntry {
    path: PathBuf,
    notify_enabled: bool,
    on_changed: Option<LinesCallback>,
    on_error: Option<ErrorCallback>,
    state: Mutex<EntryState>,
    /// Serialises callback invocations.
    delivery: Mutex<Delivered>,
    subscription: Mutex<Option<NotifySubscription>>,
}

impl std::fmt::Debug for WatchEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchEntry")
            .field("path", &self.path)
            .field("notify_enabled", &self.notify_enabled)
            .field("has_on_changed", &self.on_changed.is_some())
            .field("has_on_error", &self.on_error.is_some())
            .finish()
    }
}

impl WatchEntry {
    pub fn new(
        path: PathBuf,
        notify_enabled: bool,
        on_changed: Option<LinesCallback>,
        on_error: Option<ErrorCallback>,
        initial_meta: MetaSnapshot,
    ) -> Self {
        Self {
            path,
            notify_enabled,
            on_changed,
            on_error,
            state: Mutex::new(EntryState {
                pending: false,
                last_meta: initial_meta,
                failures: 0,
                generation: 0,
            }),
            delivery: Mutex::new(Delivered::default()),
            subscription: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the entry lock. A panic while holding it leaves the state
    /// consistent (every field is written atomically), so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Keep the OS subscription alive for as long as the entry lives.
    pub fn attach_subscription(&self, subscription: NotifySubscription) {
        *self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscription);
    }

    pub fn has_subscription(&self) -> bool {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Hand the content produced by read number `generation` to the consumer.
    ///
    /// Callbacks for one entry never overlap. A read that finishes after a
    /// newer one has already been delivered is dropped, and so is content
    /// identical to the previous delivery: one write usually raises several
    /// OS events, each of which may trigger its own read. Returns whether the
    /// content was handed over. Must be called without the entry lock.
    pub fn deliver(&self, generation: u64, lines: Vec<String>) -> bool {
        let mut last = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        if generation <= last.generation {
            debug!(path = ?self.path, generation, last = last.generation, "dropping stale read");
            return false;
        }
        last.generation = generation;
        if last.lines.as_ref() == Some(&lines) {
            debug!(path = ?self.path, generation, "content unchanged since last delivery");
            return false;
        }
        last.lines = Some(lines.clone());

        if let Some(cb) = &self.on_changed {
            if catch_unwind(AssertUnwindSafe(|| cb(lines))).is_err() {
                error!(path = ?self.path, "on_changed callback panicked");
            }
        }
        true
    }

    /// Hand an error to the consumer, if it asked for errors. Must be called
    /// without the entry lock.
    pub fn report_error(&self, err: WatchError) {
        let mut last = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        last.lines = None;
        if let Some(cb) = &self.on_error {
            if catch_unwind(AssertUnwindSafe(|| cb(err))).is_err() {
                error!(path = ?self.path, "on_error callback panicked");
            }
        }
    }
}
