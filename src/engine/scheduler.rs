// src/engine/scheduler.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::trace;

use crate::engine::reader::read_and_deliver;
use crate::fs::FileSystem;
use crate::watch::entry::{EntryState, WatchEntry};

/// The dedup gate between change signals and content reads.
///
/// Notifications, poll ticks, retries and manual refreshes all come through
/// here. At most one read task per entry exists at any time: a request that
/// finds the entry already pending is dropped, because the pending read has
/// not taken the entry lock yet and will see the latest content.
///
/// Dispatch never blocks: reads run on the runtime's blocking pool.
#[derive(Clone, Debug)]
pub struct RefreshScheduler {
    handle: Handle,
    fs: Arc<dyn FileSystem>,
    retry_delay: Duration,
}

impl RefreshScheduler {
    pub fn new(handle: Handle, fs: Arc<dyn FileSystem>, retry_delay: Duration) -> Self {
        Self {
            handle,
            fs,
            retry_delay,
        }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Request a read of `entry`. Returns `true` if a new read was queued.
    pub fn request_refresh(&self, entry: &Arc<WatchEntry>) -> bool {
        let mut state = entry.lock();
        self.dispatch_locked(entry, &mut state)
    }

    /// Same as [`request_refresh`](Self::request_refresh) for callers that
    /// already hold the entry lock.
    pub fn dispatch_locked(&self, entry: &Arc<WatchEntry>, state: &mut EntryState) -> bool {
        if state.pending {
            trace!(path = ?entry.path(), "refresh already pending");
            return false;
        }
        state.pending = true;

        let scheduler = self.clone();
        let entry = Arc::clone(entry);
        self.handle
            .spawn_blocking(move || read_and_deliver(&scheduler, &entry));
        true
    }

    /// After `retry_delay`, clear the pending flag and request a new read, in
    /// one critical section so nothing else can slip a read in between.
    pub fn schedule_retry(&self, entry: Arc<WatchEntry>) {
        let scheduler = self.clone();
        let delay = self.retry_delay;
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let retry = tokio::task::spawn_blocking(move || {
                let mut state = entry.lock();
                state.pending = false;
                scheduler.dispatch_locked(&entry, &mut state);
            });
            if let Err(err) = retry.await {
                tracing::error!(error = %err, "retry dispatch aborted");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::watch::snapshot::MetaSnapshot;
    use std::path::PathBuf;

    #[tokio::test(flavor = "multi_thread")]
    async fn second_request_while_pending_is_dropped() {
        let fs = MockFileSystem::new();
        fs.write_lines("/s/a", &["x"]);
        fs.set_read_delay(Duration::from_millis(100));

        let scheduler = RefreshScheduler::new(
            Handle::current(),
            Arc::new(fs.clone()),
            Duration::from_millis(10),
        );
        let entry = Arc::new(WatchEntry::new(
            PathBuf::from("/s/a"),
            false,
            None,
            None,
            MetaSnapshot::MISSING,
        ));

        assert!(scheduler.request_refresh(&entry));
        assert!(!scheduler.request_refresh(&entry));
        assert!(entry.lock().pending);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!entry.lock().pending);
        assert_eq!(fs.read_stats("/s/a").reads, 1);
    }
}
