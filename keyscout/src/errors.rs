/// This module defines the error types for keyscout.
///
/// # Fatal vs Recoverable Errors
///
/// A scan distinguishes between two kinds of failure:
///
/// 1. **Fatal** - the directory to scan does not exist or cannot be listed, or
///    the configuration is unusable. These are returned from [`crate::scan::run`] as `Err` and no
///    partial result is produced.
///
/// 2. **Per-file** - a single file is missing, unreadable, or not valid UTF-8.
///    These are constructed inside the worker, logged, and folded into a
///    [`crate::results::FileStatus::Failed`] so the rest of the scan continues.
///
/// ```rust,ignore
/// match keyscout::scan::run(dir, &keywords) {
///     Ok(result) => // Every keyword has an entry,
///     Err(ScanError::DirectoryNotFound(path)) => // Nothing was scanned,
///     Err(ScanError::DirectoryUnreadable { path, .. }) => // Nothing was scanned,
///     Err(e) => // Configuration problem,
/// }
/// ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur during a scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("Cannot read directory {path}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::str::Utf8Error,
    },
}

impl ScanError {
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DirectoryNotFound(path.into())
    }

    pub fn directory_unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryUnreadable {
            path: path.into(),
            source,
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::str::Utf8Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    /// Maps an I/O error raised while opening or reading `path`
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}
