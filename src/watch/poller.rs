// src/watch/poller.rs

//! Periodic metadata check over every registered file.
//!
//! Notification backends drop events (network filesystems, editors that
//! replace files atomically), so each tick re-stats every entry and requests
//! a refresh for those whose snapshot moved.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::engine::scheduler::RefreshScheduler;
use crate::errors::WatchError;
use crate::watch::registry::Registry;
use crate::watch::snapshot::MetaSnapshot;

/// Run one poll tick. Returns how many entries had changed metadata.
///
/// A stat failure on one entry goes to that entry's error callback and the
/// tick moves on to the next entry.
pub fn poll_once(registry: &Registry, scheduler: &RefreshScheduler) -> usize {
    let entries = registry.snapshot_all();
    let mut changed = 0;

    for entry in entries {
        let outcome = {
            let mut state = entry.lock();
            match MetaSnapshot::of(scheduler.fs(), entry.path()) {
                Ok(current) if current != state.last_meta => {
                    state.last_meta = current;
                    let dispatched = scheduler.dispatch_locked(&entry, &mut state);
                    debug!(path = ?entry.path(), dispatched, "poll detected metadata change");
                    Ok(true)
                }
                Ok(_) => Ok(false),
                Err(err) => Err(err),
            }
        };

        match outcome {
            Ok(true) => changed += 1,
            Ok(false) => {}
            Err(source) => {
                warn!(path = ?entry.path(), error = %source, "poll failed to stat file");
                entry.report_error(WatchError::Stat {
                    path: entry.path().to_path_buf(),
                    source,
                });
            }
        }
    }

    trace!(changed, "poll tick complete");
    changed
}

/// Start the recurring poller on the scheduler's runtime.
///
/// The first tick fires one `period` after start. The task ends on its own
/// once the registry has been dropped.
pub fn spawn_poller(
    registry: Weak<Registry>,
    scheduler: RefreshScheduler,
    period: Duration,
) -> JoinHandle<()> {
    let handle = scheduler.handle().clone();
    handle.spawn(async move {
        info!(?period, "metadata poller started");

        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(registry) = registry.upgrade() else {
                break;
            };
            let scheduler = scheduler.clone();
            let tick = tokio::task::spawn_blocking(move || poll_once(&registry, &scheduler));
            if let Err(err) = tick.await {
                error!(error = %err, "poll tick aborted");
            }
        }

        debug!("metadata poller stopped");
    })
}
