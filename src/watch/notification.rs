// src/watch/notification.rs

//! OS-level change notifications for a single watched file.
//!
//! The subscription covers the file's parent directory (non-recursive) and
//! filters events down to the file name. Every accepted event, whatever its
//! kind, goes through [`handle_notification`]: refresh the cached metadata and
//! ask the scheduler for a read.

use std::ffi::OsString;
use std::sync::{Arc, Weak};

use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::engine::scheduler::RefreshScheduler;
use crate::errors::{Result, WatchError};
use crate::fs::parent_dir;
use crate::types::NotifyKind;
use crate::watch::entry::WatchEntry;
use crate::watch::snapshot::MetaSnapshot;

/// Keeps the underlying `RecommendedWatcher` alive. Dropping it ends the
/// subscription.
pub struct NotifySubscription {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for NotifySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySubscription").finish()
    }
}

/// Subscribe to change events for `entry`'s file.
///
/// The callback only holds a weak reference, so the subscription stored on
/// the entry does not keep the entry alive by itself.
pub fn subscribe(
    entry: &Arc<WatchEntry>,
    scheduler: RefreshScheduler,
) -> Result<NotifySubscription> {
    let dir = parent_dir(entry.path());
    let name: OsString = entry
        .path()
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| WatchError::FileNotFound(entry.path().to_path_buf()))?;

    let weak: Weak<WatchEntry> = Arc::downgrade(entry);

    // Called synchronously on notify's own thread.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            let Some(entry) = weak.upgrade() else {
                return;
            };

            let kind = match res {
                Ok(event) => {
                    let relevant = event.paths.is_empty()
                        || event
                            .paths
                            .iter()
                            .any(|p| p.file_name() == Some(name.as_os_str()));
                    if !relevant {
                        return;
                    }
                    match classify(&event.kind) {
                        Some(kind) => kind,
                        None => return,
                    }
                }
                Err(err) => {
                    debug!(path = ?entry.path(), error = %err, "notify backend reported an error");
                    NotifyKind::Error
                }
            };

            handle_notification(&entry, kind, &scheduler);
        },
        Config::default(),
    )?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    info!(path = ?entry.path(), dir = ?dir, "change notifications enabled");

    Ok(NotifySubscription { _inner: watcher })
}

/// Map a raw notify event kind onto the five kinds the engine cares about.
///
/// Plain accesses (opens, reads) are dropped; otherwise our own reads would
/// keep re-triggering themselves.
pub fn classify(kind: &EventKind) -> Option<NotifyKind> {
    match kind {
        EventKind::Create(_) => Some(NotifyKind::Created),
        EventKind::Modify(ModifyKind::Name(_)) => Some(NotifyKind::Renamed),
        EventKind::Modify(_) => Some(NotifyKind::Changed),
        EventKind::Remove(_) => Some(NotifyKind::Deleted),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(NotifyKind::Changed),
        EventKind::Access(_) => None,
        EventKind::Any | EventKind::Other => Some(NotifyKind::Changed),
    }
}

/// Shared handler for every notification kind.
///
/// Under the entry lock: re-stat, store the snapshot, request a refresh. A stat
/// failure leaves the cached snapshot alone and is reported once the lock is
/// released; the refresh is requested regardless so the reader gets a chance
/// to report what is actually wrong.
pub fn handle_notification(entry: &Arc<WatchEntry>, kind: NotifyKind, scheduler: &RefreshScheduler) {
    let stat_error = {
        let mut state = entry.lock();
        let stat_error = match MetaSnapshot::of(scheduler.fs(), entry.path()) {
            Ok(snapshot) => {
                state.last_meta = snapshot;
                None
            }
            Err(err) => Some(err),
        };
        let dispatched = scheduler.dispatch_locked(entry, &mut state);
        debug!(path = ?entry.path(), ?kind, dispatched, "change notification");
        stat_error
    };

    if let Some(source) = stat_error {
        warn!(path = ?entry.path(), error = %source, "failed to stat file after notification");
        entry.report_error(WatchError::Stat {
            path: entry.path().to_path_buf(),
            source,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use notify::event::{CreateKind, DataChange, RemoveKind, RenameMode};
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn classify_maps_the_five_kinds() {
        assert_eq!(
            classify(&EventKind::Create(CreateKind::File)),
            Some(NotifyKind::Created)
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(NotifyKind::Changed)
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(NotifyKind::Renamed)
        );
        assert_eq!(
            classify(&EventKind::Remove(RemoveKind::File)),
            Some(NotifyKind::Deleted)
        );
    }

    #[test]
    fn classify_ignores_plain_access_but_not_close_write() {
        assert_eq!(classify(&EventKind::Access(AccessKind::Open(AccessMode::Read))), None);
        assert_eq!(
            classify(&EventKind::Access(AccessKind::Close(AccessMode::Write))),
            Some(NotifyKind::Changed)
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stat_failure_is_reported_and_refresh_still_dispatched() {
        let fs = MockFileSystem::new();
        fs.write_lines("/n/f", &["x"]);
        let initial = MetaSnapshot::of(&fs, Path::new("/n/f")).unwrap();
        fs.fail_stats("/n/f", Some(io::ErrorKind::PermissionDenied));
        fs.set_read_delay(Duration::from_millis(200));

        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let entry = Arc::new(WatchEntry::new(
            PathBuf::from("/n/f"),
            true,
            None,
            Some(Arc::new(move |err: WatchError| {
                sink.lock().unwrap().push(err)
            })),
            initial,
        ));
        let scheduler = RefreshScheduler::new(
            tokio::runtime::Handle::current(),
            Arc::new(fs.clone()),
            Duration::from_millis(10),
        );

        handle_notification(&entry, NotifyKind::Error, &scheduler);

        {
            let errors = errors.lock().unwrap();
            assert_eq!(errors.len(), 1);
            assert!(matches!(
                &errors[0],
                WatchError::Stat { source, .. } if source.kind() == io::ErrorKind::PermissionDenied
            ));
        }
        assert!(entry.lock().pending, "refresh must be dispatched despite the stat error");
        assert_eq!(entry.lock().last_meta, initial);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!entry.lock().pending);
        assert_eq!(fs.read_stats("/n/f").reads, 1);
    }
}
