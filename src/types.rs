use std::sync::Arc;
use std::time::Duration;

use crate::errors::WatchError;

/// Receives the full current content of a watched file, one string per line.
pub type LinesCallback = Arc<dyn Fn(Vec<String>) + Send + Sync>;

/// Receives errors observed after registration (failed reads, failed stats).
pub type ErrorCallback = Arc<dyn Fn(WatchError) + Send + Sync>;

/// Default period of the metadata poller.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default delay before a failed read is attempted again.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Tunables of a [`crate::engine::FileWatchEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// How often every registered file's metadata is re-checked.
    pub poll_interval: Duration,
    /// Delay between a failed read and the next attempt.
    pub retry_delay: Duration,
    /// Default for the CLI when no `--no-notify` is given. Individual
    /// registrations still choose for themselves.
    pub notify: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_delay: DEFAULT_RETRY_DELAY,
            notify: true,
        }
    }
}

/// Which kind of change notification arrived for a watched file.
///
/// The engine handles every kind the same way; the tag only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Created,
    Changed,
    Deleted,
    Renamed,
    Error,
}

/// Wrap a closure as an `on_changed` callback.
pub fn on_lines<F>(f: F) -> Option<LinesCallback>
where
    F: Fn(Vec<String>) + Send + Sync + 'static,
{
    Some(Arc::new(f))
}

/// Wrap a closure as an `on_error` callback.
pub fn on_error<F>(f: F) -> Option<ErrorCallback>
where
    F: Fn(WatchError) + Send + Sync + 'static,
{
    Some(Arc::new(f))
}
