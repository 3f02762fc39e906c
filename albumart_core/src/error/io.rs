//! I/O related error types

use std::path::{Path, PathBuf};
use thiserror::Error;

/// I/O error with the dataset path that caused it
#[derive(Error, Debug)]
#[error("{}", format_io_error(self))]
pub struct IoError {
    /// The kind of I/O error
    pub kind: IoErrorKind,
    /// Path associated with the error (if any)
    pub path: Option<PathBuf>,
    /// Underlying I/O error (if any)
    #[source]
    pub source: Option<std::io::Error>,
}

/// Kind of I/O error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoErrorKind {
    /// File not found
    FileNotFound,
    /// Permission denied
    PermissionDenied,
    /// Generic I/O error
    Other,
}

impl IoError {
    /// Create a file not found error
    pub fn file_not_found(path: &Path) -> Self {
        Self {
            kind: IoErrorKind::FileNotFound,
            path: Some(path.to_path_buf()),
            source: None,
        }
    }

    /// Create an I/O error from a standard I/O error
    pub fn from_std(source: std::io::Error) -> Self {
        let kind = match source.kind() {
            std::io::ErrorKind::NotFound => IoErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => IoErrorKind::PermissionDenied,
            _ => IoErrorKind::Other,
        };

        Self {
            kind,
            path: None,
            source: Some(source),
        }
    }

    /// Attach the path that was being opened, read or written
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }
}

fn format_io_error(error: &IoError) -> String {
    match (&error.kind, &error.path) {
        (IoErrorKind::FileNotFound, Some(path)) => {
            format!("File not found: {}", path.display())
        }
        (IoErrorKind::FileNotFound, None) => "File not found".to_string(),
        (IoErrorKind::PermissionDenied, Some(path)) => {
            format!("Permission denied for file: {}", path.display())
        }
        (IoErrorKind::PermissionDenied, None) => "Permission denied".to_string(),
        (IoErrorKind::Other, path) => match (&error.source, path) {
            (Some(source), Some(path)) => format!("I/O error on {}: {source}", path.display()),
            (Some(source), None) => format!("I/O error: {source}"),
            (None, _) => "I/O error".to_string(),
        },
    }
}
