// src/fs/mock.rs

use super::{FileStat, FileSystem};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
struct MockFile {
    lines: Vec<String>,
    modified: SystemTime,
}

/// Per-path read instrumentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Completed or failed `read_lines` calls.
    pub reads: usize,
    /// Reads currently inside `read_lines`.
    pub in_flight: usize,
    /// Highest `in_flight` value ever observed.
    pub max_in_flight: usize,
}

#[derive(Debug, Default)]
struct State {
    files: HashMap<PathBuf, MockFile>,
    dirs: HashSet<PathBuf>,
    clock: u64,
    read_delay: Duration,
    failing_reads: HashMap<PathBuf, (usize, io::ErrorKind)>,
    failing_stats: HashMap<PathBuf, io::ErrorKind>,
    stats: HashMap<PathBuf, ReadStats>,
}

/// In-memory filesystem with knobs for slow and failing reads.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<State>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or replace a file. Parent directories are created implicitly and
    /// every write advances the modification time.
    pub fn write_lines(&self, path: impl AsRef<Path>, lines: &[&str]) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state();
        state.clock += 1;
        let modified = UNIX_EPOCH + Duration::from_secs(1_000_000 + state.clock);

        let mut parent = path.parent();
        while let Some(dir) = parent {
            state.dirs.insert(dir.to_path_buf());
            parent = dir.parent();
        }

        state.files.insert(
            path,
            MockFile {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                modified,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.state().dirs.insert(path.as_ref().to_path_buf());
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.state().files.remove(path.as_ref());
    }

    /// Every read sleeps this long while counted as in flight.
    pub fn set_read_delay(&self, delay: Duration) {
        self.state().read_delay = delay;
    }

    /// Make the next `count` reads of `path` fail with `kind`.
    pub fn fail_next_reads(&self, path: impl AsRef<Path>, count: usize, kind: io::ErrorKind) {
        self.state()
            .failing_reads
            .insert(path.as_ref().to_path_buf(), (count, kind));
    }

    /// Make every `stat` of `path` fail with `kind` until cleared.
    pub fn fail_stats(&self, path: impl AsRef<Path>, kind: Option<io::ErrorKind>) {
        let mut state = self.state();
        match kind {
            Some(kind) => state.failing_stats.insert(path.as_ref().to_path_buf(), kind),
            None => state.failing_stats.remove(path.as_ref()),
        };
    }

    pub fn read_stats(&self, path: impl AsRef<Path>) -> ReadStats {
        self.state()
            .stats
            .get(path.as_ref())
            .copied()
            .unwrap_or_default()
    }
}

impl FileSystem for MockFileSystem {
    fn stat(&self, path: &Path) -> io::Result<Option<FileStat>> {
        let state = self.state();
        if let Some(kind) = state.failing_stats.get(path) {
            return Err(io::Error::new(*kind, format!("injected stat failure: {:?}", path)));
        }
        Ok(state.files.get(path).map(|f| FileStat {
            modified: f.modified,
            len: f.lines.iter().map(|l| l.len() as u64 + 1).sum(),
        }))
    }

    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let delay = {
            let mut state = self.state();
            let stats = state.stats.entry(path.to_path_buf()).or_default();
            stats.in_flight += 1;
            stats.max_in_flight = stats.max_in_flight.max(stats.in_flight);
            state.read_delay
        };

        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut state = self.state();
        let stats = state.stats.entry(path.to_path_buf()).or_default();
        stats.in_flight -= 1;
        stats.reads += 1;

        if let Some((remaining, kind)) = state.failing_reads.get_mut(path) {
            if *remaining > 0 {
                *remaining -= 1;
                let kind = *kind;
                return Err(io::Error::new(kind, format!("injected read failure: {:?}", path)));
            }
        }

        match state.files.get(path) {
            Some(file) => Ok(file.lines.clone()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {:?}", path),
            )),
        }
    }

    fn is_file(&self, path: &Path) -> bool {
        self.state().files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state().dirs.contains(path)
    }
}
