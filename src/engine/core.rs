// src/engine/core.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::scheduler::RefreshScheduler;
use crate::errors::{Result, WatchError};
use crate::fs::{FileSystem, RealFileSystem, parent_dir};
use crate::types::{ErrorCallback, LinesCallback, WatchOptions};
use crate::watch::entry::WatchEntry;
use crate::watch::notification::subscribe;
use crate::watch::poller::{poll_once, spawn_poller};
use crate::watch::registry::Registry;
use crate::watch::snapshot::MetaSnapshot;

/// Owns the registry, the scheduler and the poller for a set of watched files.
///
/// Entries live as long as the engine; there is no way to unregister one.
/// Dropping the engine stops the poller and, if the engine created its own
/// runtime, shuts that runtime down.
pub struct FileWatchEngine {
    registry: Arc<Registry>,
    scheduler: RefreshScheduler,
    options: WatchOptions,
    poller: JoinHandle<()>,
    runtime: Option<Runtime>,
}

impl std::fmt::Debug for FileWatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatchEngine")
            .field("entries", &self.registry.len())
            .field("options", &self.options)
            .field("owns_runtime", &self.runtime.is_some())
            .finish()
    }
}

impl FileWatchEngine {
    /// Engine on a dedicated multi-threaded runtime.
    pub fn new(options: WatchOptions) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("watchlines-worker")
            .build()?;
        let handle = runtime.handle().clone();
        Ok(Self::build(
            handle,
            Some(runtime),
            Arc::new(RealFileSystem),
            options,
        ))
    }

    /// Engine running on an existing runtime.
    pub fn with_handle(handle: Handle, options: WatchOptions) -> Self {
        Self::build(handle, None, Arc::new(RealFileSystem), options)
    }

    /// Engine running on an existing runtime against a custom filesystem.
    pub fn with_file_system(handle: Handle, fs: Arc<dyn FileSystem>, options: WatchOptions) -> Self {
        Self::build(handle, None, fs, options)
    }

    fn build(
        handle: Handle,
        runtime: Option<Runtime>,
        fs: Arc<dyn FileSystem>,
        options: WatchOptions,
    ) -> Self {
        let registry = Arc::new(Registry::new());
        let scheduler = RefreshScheduler::new(handle, fs, options.retry_delay);
        let poller = spawn_poller(
            Arc::downgrade(&registry),
            scheduler.clone(),
            options.poll_interval,
        );

        Self {
            registry,
            scheduler,
            options,
            poller,
            runtime,
        }
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    /// Start watching `path`.
    ///
    /// Fails synchronously if the parent directory or the file does not exist,
    /// or if the notification subscription cannot be set up; in that case
    /// nothing is registered and no callback ever runs. Otherwise a first read
    /// is queued immediately and the call returns without waiting for it.
    /// Everything that goes wrong later is reported through `on_error`.
    pub fn watch_file_lines(
        &self,
        path: impl Into<PathBuf>,
        on_changed: Option<LinesCallback>,
        on_error: Option<ErrorCallback>,
        watch: bool,
    ) -> Result<WatchedFile> {
        let path = path.into();
        let fs = self.scheduler.fs();

        let dir = parent_dir(&path);
        if !fs.is_dir(&dir) {
            return Err(WatchError::DirectoryNotFound(dir));
        }
        if !fs.is_file(&path) {
            return Err(WatchError::FileNotFound(path));
        }

        let initial = MetaSnapshot::of(fs, &path).map_err(|source| WatchError::Stat {
            path: path.clone(),
            source,
        })?;

        let entry = Arc::new(WatchEntry::new(path, watch, on_changed, on_error, initial));
        if watch {
            let subscription = subscribe(&entry, self.scheduler.clone())?;
            entry.attach_subscription(subscription);
        }

        self.registry.register(Arc::clone(&entry));
        info!(path = ?entry.path(), notify = watch, "watching file");

        self.scheduler.request_refresh(&entry);

        Ok(WatchedFile {
            entry,
            scheduler: self.scheduler.clone(),
        })
    }

    /// Run one poll tick right now, on the calling thread. Returns the number
    /// of entries whose metadata had changed.
    pub fn poll_now(&self) -> usize {
        poll_once(&self.registry, &self.scheduler)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

impl Drop for FileWatchEngine {
    fn drop(&mut self) {
        self.poller.abort();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
        debug!("watch engine dropped");
    }
}

/// Handle to one registered file.
///
/// Dropping it does not stop the watch.
#[derive(Debug, Clone)]
pub struct WatchedFile {
    entry: Arc<WatchEntry>,
    scheduler: RefreshScheduler,
}

impl WatchedFile {
    pub fn path(&self) -> &Path {
        self.entry.path()
    }

    /// Request a read through the same dedup gate as change signals. Returns
    /// `false` if a read was already pending.
    pub fn refresh(&self) -> bool {
        self.scheduler.request_refresh(&self.entry)
    }

    pub fn is_pending(&self) -> bool {
        self.entry.lock().pending
    }

    /// Whether an OS change subscription backs this watch (besides polling).
    pub fn notifications_active(&self) -> bool {
        self.entry.has_subscription()
    }
}

static GLOBAL: OnceLock<FileWatchEngine> = OnceLock::new();
static GLOBAL_INIT: Mutex<()> = Mutex::new(());

/// Initialise the process-wide engine with explicit options.
///
/// Must happen before the first [`global`] call; afterwards it fails with
/// [`WatchError::AlreadyInitialized`].
pub fn init_global(options: WatchOptions) -> Result<&'static FileWatchEngine> {
    let _guard = GLOBAL_INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if GLOBAL.get().is_some() {
        return Err(WatchError::AlreadyInitialized);
    }
    let engine = FileWatchEngine::new(options)?;
    Ok(GLOBAL.get_or_init(|| engine))
}

/// The process-wide engine, created with default options on first use and
/// never torn down.
pub fn global() -> Result<&'static FileWatchEngine> {
    if let Some(engine) = GLOBAL.get() {
        return Ok(engine);
    }
    let _guard = GLOBAL_INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(engine) = GLOBAL.get() {
        return Ok(engine);
    }
    let engine = FileWatchEngine::new(WatchOptions::default())?;
    Ok(GLOBAL.get_or_init(|| engine))
}
