use std::io;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use watchlines::errors::WatchError;
use watchlines::types::{ErrorCallback, LinesCallback, on_error, on_lines};

/// An error as seen by the recorder. `WatchError` is not `Clone`, so keep the
/// parts tests look at.
#[derive(Debug, Clone)]
pub struct RecordedError {
    pub message: String,
    pub kind: Option<io::ErrorKind>,
    pub not_found: bool,
}

#[derive(Debug, Default)]
struct Log {
    deliveries: Vec<Vec<String>>,
    errors: Vec<RecordedError>,
    in_callback: usize,
    overlapping_callbacks: usize,
}

/// Records every callback invocation of a watch and lets tests block until
/// something shows up.
#[derive(Debug, Clone, Default)]
pub struct CallbackRecorder {
    inner: Arc<(Mutex<Log>, Condvar)>,
}

impl CallbackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `on_changed` callback feeding this recorder. `hold` keeps the callback
    /// busy for a while, to widen any window in which callbacks could overlap.
    pub fn on_changed_with_delay(&self, hold: Duration) -> Option<LinesCallback> {
        let inner = Arc::clone(&self.inner);
        on_lines(move |lines| {
            let (log, cvar) = &*inner;
            {
                let mut log = log.lock().unwrap();
                log.in_callback += 1;
                if log.in_callback > 1 {
                    log.overlapping_callbacks += 1;
                }
            }
            if !hold.is_zero() {
                std::thread::sleep(hold);
            }
            let mut log = log.lock().unwrap();
            log.in_callback -= 1;
            log.deliveries.push(lines);
            cvar.notify_all();
        })
    }

    pub fn on_changed(&self) -> Option<LinesCallback> {
        self.on_changed_with_delay(Duration::ZERO)
    }

    pub fn on_error(&self) -> Option<ErrorCallback> {
        let inner = Arc::clone(&self.inner);
        on_error(move |err: WatchError| {
            let (log, cvar) = &*inner;
            let mut log = log.lock().unwrap();
            log.errors.push(RecordedError {
                message: err.to_string(),
                kind: err.io_kind(),
                not_found: err.is_not_found(),
            });
            cvar.notify_all();
        })
    }

    pub fn deliveries(&self) -> Vec<Vec<String>> {
        self.inner.0.lock().unwrap().deliveries.clone()
    }

    pub fn last_delivery(&self) -> Option<Vec<String>> {
        self.inner.0.lock().unwrap().deliveries.last().cloned()
    }

    pub fn errors(&self) -> Vec<RecordedError> {
        self.inner.0.lock().unwrap().errors.clone()
    }

    pub fn overlapping_callbacks(&self) -> usize {
        self.inner.0.lock().unwrap().overlapping_callbacks
    }

    /// Block until `pred` holds over the log, or `timeout` passes.
    fn wait(&self, timeout: Duration, mut pred: impl FnMut(&Log) -> bool) -> bool {
        let (log, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut guard = log.lock().unwrap();
        loop {
            if pred(&guard) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = cvar.wait_timeout(guard, deadline - now).unwrap().0;
        }
    }

    /// Wait for at least `n` deliveries.
    pub fn wait_for_deliveries(&self, n: usize, timeout: Duration) -> bool {
        self.wait(timeout, |log| log.deliveries.len() >= n)
    }

    /// Wait until the most recent delivery equals `expected`.
    pub fn wait_for_latest(&self, expected: &[String], timeout: Duration) -> bool {
        self.wait(timeout, |log| {
            log.deliveries.last().map(|d| d.as_slice()) == Some(expected)
        })
    }

    /// Wait for at least `n` errors.
    pub fn wait_for_errors(&self, n: usize, timeout: Duration) -> bool {
        self.wait(timeout, |log| log.errors.len() >= n)
    }
}
