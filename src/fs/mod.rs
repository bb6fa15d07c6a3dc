// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub mod mock;

/// The two metadata fields the watch engine compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub modified: SystemTime,
    pub len: u64,
}

/// Abstract filesystem interface.
///
/// `stat` folds "not found" into `Ok(None)`; every other failure is an error
/// the caller is expected to surface.
pub trait FileSystem: Send + Sync + Debug {
    fn stat(&self, path: &Path) -> io::Result<Option<FileStat>>;
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>>;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn stat(&self, path: &Path) -> io::Result<Option<FileStat>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(FileStat {
                modified: meta.modified()?,
                len: meta.len(),
            })),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let bytes = fs::read(path)?;
        Ok(split_lines(&bytes))
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// Directory containing `path`.
///
/// A bare file name like `notes.txt` has an empty parent; that maps to the
/// current directory `.`.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Split raw file content into lines.
///
/// `\n` and `\r\n` both terminate a line, a trailing terminator does not
/// produce an empty last line, and invalid UTF-8 is replaced rather than
/// rejected.
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_handles_crlf_and_trailing_newline() {
        assert_eq!(split_lines(b"a\r\nb\nc\n"), vec!["a", "b", "c"]);
        assert_eq!(split_lines(b"only"), vec!["only"]);
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn split_lines_keeps_interior_blank_lines() {
        assert_eq!(split_lines(b"a\n\nb\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn split_lines_is_lossy_on_invalid_utf8() {
        let lines = split_lines(b"ok\n\xff\xfe\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "ok");
        assert!(lines[1].contains('\u{FFFD}'));
    }

    #[test]
    fn parent_dir_of_bare_name_is_cwd() {
        assert_eq!(parent_dir(Path::new("notes.txt")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("/var/log/a.log")), PathBuf::from("/var/log"));
    }

    #[test]
    fn real_stat_folds_missing_file_into_none() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFileSystem;
        assert!(fs.stat(&dir.path().join("missing.txt")).unwrap().is_none());

        let file = dir.path().join("present.txt");
        std::fs::write(&file, "12345").unwrap();
        let stat = fs.stat(&file).unwrap().expect("file exists");
        assert_eq!(stat.len, 5);
    }
}
