// src/watch/registry.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::watch::entry::WatchEntry;

/// Every active [`WatchEntry`] of one engine.
///
/// Entries are only ever appended. Readers take a copy of the list so that
/// per-entry work never runs under the registry lock.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Mutex<Vec<Arc<WatchEntry>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Arc<WatchEntry>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, entry: Arc<WatchEntry>) {
        self.entries().push(entry);
    }

    /// Working copy of the current entries.
    pub fn snapshot_all(&self) -> Vec<Arc<WatchEntry>> {
        self.entries().clone()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
