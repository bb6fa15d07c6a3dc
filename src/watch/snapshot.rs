// src/watch/snapshot.rs

use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::fs::FileSystem;

/// Cheap fingerprint of a file: modification time plus size.
///
/// A missing file maps to [`MetaSnapshot::MISSING`], which never equals the
/// snapshot of an existing file, so both appearance and disappearance count
/// as a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaSnapshot {
    last_modified: SystemTime,
    size: u64,
    exists: bool,
}

impl MetaSnapshot {
    pub const MISSING: MetaSnapshot = MetaSnapshot {
        last_modified: UNIX_EPOCH,
        size: 0,
        exists: false,
    };

    pub fn new(last_modified: SystemTime, size: u64) -> Self {
        Self {
            last_modified,
            size,
            exists: true,
        }
    }

    /// Stat `path`. Absence is folded into [`MetaSnapshot::MISSING`]; only
    /// other I/O failures (permissions, broken mounts) are returned.
    pub fn of(fs: &dyn FileSystem, path: &Path) -> io::Result<Self> {
        Ok(match fs.stat(path)? {
            Some(stat) => Self::new(stat.modified, stat.len),
            None => Self::MISSING,
        })
    }

    pub fn last_modified(&self) -> SystemTime {
        self.last_modified
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn exists(&self) -> bool {
        self.exists
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::RealFileSystem;
    use crate::fs::mock::MockFileSystem;
    use std::io::Write;

    #[test]
    fn unmodified_file_yields_equal_snapshots() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hello").unwrap();
        file.flush().unwrap();

        let a = MetaSnapshot::of(&RealFileSystem, file.path()).unwrap();
        let b = MetaSnapshot::of(&RealFileSystem, file.path()).unwrap();
        assert_eq!(a, b);
        assert!(a.exists());
    }

    #[test]
    fn appending_changes_the_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hello").unwrap();
        file.flush().unwrap();
        let before = MetaSnapshot::of(&RealFileSystem, file.path()).unwrap();

        writeln!(file, "world").unwrap();
        file.flush().unwrap();
        let after = MetaSnapshot::of(&RealFileSystem, file.path()).unwrap();

        assert_ne!(before, after);
        assert!(after.size() > before.size());
    }

    #[test]
    fn same_size_rewrite_is_caught_by_mtime() {
        let fs = MockFileSystem::new();
        fs.write_lines("/m/f", &["abc"]);
        let before = MetaSnapshot::of(&fs, Path::new("/m/f")).unwrap();
        fs.write_lines("/m/f", &["xyz"]);
        let after = MetaSnapshot::of(&fs, Path::new("/m/f")).unwrap();

        assert_eq!(before.size(), after.size());
        assert!(after.last_modified() > before.last_modified());
        assert_ne!(before, after);
    }

    #[test]
    fn missing_file_is_the_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let snap = MetaSnapshot::of(&RealFileSystem, &dir.path().join("nope")).unwrap();
        assert_eq!(snap, MetaSnapshot::MISSING);
        assert!(!snap.exists());
    }

    #[test]
    fn sentinel_differs_from_an_empty_epoch_file() {
        assert_ne!(MetaSnapshot::new(UNIX_EPOCH, 0), MetaSnapshot::MISSING);
    }

    #[test]
    fn stat_failures_other_than_absence_surface() {
        let fs = MockFileSystem::new();
        fs.write_lines("/x/y", &["a"]);
        fs.fail_stats("/x/y", Some(io::ErrorKind::PermissionDenied));

        let err = MetaSnapshot::of(&fs, Path::new("/x/y")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
