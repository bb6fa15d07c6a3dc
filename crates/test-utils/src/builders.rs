#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use watchlines::engine::FileWatchEngine;
use watchlines::fs::mock::MockFileSystem;
use watchlines::types::WatchOptions;

/// Builder for `WatchOptions` to simplify test setup.
///
/// Defaults differ from production: polling is effectively off (one hour) and
/// retries are quick, so tests opt into whichever signal they exercise.
pub struct WatchOptionsBuilder {
    options: WatchOptions,
}

impl WatchOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: WatchOptions {
                poll_interval: Duration::from_secs(3600),
                retry_delay: Duration::from_millis(20),
                notify: false,
            },
        }
    }

    pub fn poll_every(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    pub fn retry_after(mut self, delay: Duration) -> Self {
        self.options.retry_delay = delay;
        self
    }

    pub fn notify(mut self, enabled: bool) -> Self {
        self.options.notify = enabled;
        self
    }

    pub fn build(self) -> WatchOptions {
        self.options
    }
}

impl Default for WatchOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An engine over a [`MockFileSystem`] with its own runtime.
///
/// Field order matters: the engine must drop before the runtime it runs on.
pub struct MockHarness {
    pub engine: FileWatchEngine,
    pub fs: MockFileSystem,
    _runtime: Runtime,
}

impl MockHarness {
    pub fn new(options: WatchOptions) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("building test runtime");
        let fs = MockFileSystem::new();
        let engine =
            FileWatchEngine::with_file_system(runtime.handle().clone(), Arc::new(fs.clone()), options);
        Self {
            engine,
            fs,
            _runtime: runtime,
        }
    }
}
