// src/engine/reader.rs

//! The content read task.
//!
//! Runs on the blocking pool, never on a notification or poll thread.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::scheduler::RefreshScheduler;
use crate::errors::WatchError;
use crate::watch::entry::WatchEntry;

/// Read the entry's file and hand the result to its callbacks.
///
/// The read happens under the entry lock. On success `pending` is cleared in
/// that same critical section, so a change signal that had to wait for the
/// lock is accepted and queues a fresh read. On failure `pending` stays set
/// until the delayed retry clears it.
pub fn read_and_deliver(scheduler: &RefreshScheduler, entry: &Arc<WatchEntry>) {
    let (generation, result) = {
        let mut state = entry.lock();
        state.generation += 1;
        let generation = state.generation;

        let result = match scheduler.fs().read_lines(entry.path()) {
            Ok(lines) => {
                state.pending = false;
                let recovered_after = std::mem::take(&mut state.failures);
                Ok((lines, recovered_after))
            }
            Err(err) => {
                state.failures += 1;
                Err((err, state.failures))
            }
        };
        (generation, result)
    };

    match result {
        Ok((lines, recovered_after)) => {
            if recovered_after > 0 {
                info!(path = ?entry.path(), failures = recovered_after, "read recovered");
            }
            debug!(path = ?entry.path(), generation, lines = lines.len(), "delivering content");
            entry.deliver(generation, lines);
        }
        Err((source, failures)) => {
            if failures == 1 {
                warn!(path = ?entry.path(), error = %source, "read failed; will retry");
            } else {
                debug!(path = ?entry.path(), error = %source, failures, "read failed again");
            }

            scheduler.schedule_retry(Arc::clone(entry));
            entry.report_error(WatchError::Read {
                path: entry.path().to_path_buf(),
                source,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::watch::snapshot::MetaSnapshot;
    use std::io;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::runtime::Handle;

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_read_keeps_pending_until_retry_succeeds() {
        let fs = MockFileSystem::new();
        fs.write_lines("/r/f", &["hello", "world"]);
        fs.fail_next_reads("/r/f", 1, io::ErrorKind::PermissionDenied);

        let delivered = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let entry = {
            let delivered = Arc::clone(&delivered);
            let errors = Arc::clone(&errors);
            Arc::new(WatchEntry::new(
                PathBuf::from("/r/f"),
                false,
                Some(Arc::new(move |lines: Vec<String>| {
                    delivered.lock().unwrap().push(lines)
                })),
                Some(Arc::new(move |err: WatchError| {
                    errors.lock().unwrap().push(err.io_kind())
                })),
                MetaSnapshot::MISSING,
            ))
        };

        let scheduler = RefreshScheduler::new(
            Handle::current(),
            Arc::new(fs.clone()),
            Duration::from_millis(50),
        );

        assert!(scheduler.request_refresh(&entry));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(entry.lock().pending, "pending must survive a failed read");
        assert!(!scheduler.request_refresh(&entry));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(
            *errors.lock().unwrap(),
            vec![Some(io::ErrorKind::PermissionDenied)]
        );
        assert_eq!(
            *delivered.lock().unwrap(),
            vec![vec!["hello".to_string(), "world".to_string()]]
        );
        assert!(!entry.lock().pending);
        assert_eq!(entry.lock().failures, 0);
    }
}
