// src/errors.rs

//! Crate-wide error type and result alias.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Directory not found: {0:?}")]
    DirectoryNotFound(PathBuf),

    #[error("File not found: {0:?}")]
    FileNotFound(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to query metadata of {path:?}: {source}")]
    Stat { path: PathBuf, source: io::Error },

    #[error("Notification error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("global watch engine is already initialised")]
    AlreadyInitialized,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WatchError {
    /// True when the error boils down to "the file (or its directory) is not there".
    pub fn is_not_found(&self) -> bool {
        match self {
            WatchError::DirectoryNotFound(_) | WatchError::FileNotFound(_) => true,
            WatchError::Read { source, .. }
            | WatchError::Stat { source, .. }
            | WatchError::Io(source) => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// The underlying I/O error kind, if this error carries one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            WatchError::Read { source, .. }
            | WatchError::Stat { source, .. }
            | WatchError::Io(source) => Some(source.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_detected_through_read_errors() {
        let err = WatchError::Read {
            path: PathBuf::from("gone.txt"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.is_not_found());
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));

        let denied = WatchError::Read {
            path: PathBuf::from("locked.txt"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(!denied.is_not_found());
    }

    #[test]
    fn registration_errors_count_as_not_found() {
        assert!(WatchError::FileNotFound(PathBuf::from("a")).is_not_found());
        assert!(WatchError::DirectoryNotFound(PathBuf::from("b")).is_not_found());
        assert!(!WatchError::Config("bad".into()).is_not_found());
    }
}
