//! Error types for the album art core library
//!
//! Errors are grouped by where they originate so callers can decide whether a
//! failure is fatal to the whole run or only to a single row.

use thiserror::Error;

pub mod catalog;
pub mod io;
pub mod validation;

pub use self::catalog::CatalogError;
pub use self::io::{IoError, IoErrorKind};
pub use self::validation::ValidationError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the album art core library
///
/// - I/O errors: opening, reading or writing the dataset files
/// - Catalog errors: authentication and search against the remote catalog
/// - Validation errors: configuration and row shape problems
/// - CSV errors: malformed records at the batch level
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error(transparent)]
    Io(#[from] IoError),

    /// Remote catalog errors
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Validation related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// CSV decoding or encoding failure
    #[error("CSV error: {message}")]
    Csv { message: String },
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from_std(source))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            if let csv::ErrorKind::Io(io_err) = err.into_kind() {
                return Self::Io(IoError::from_std(io_err));
            }
            return Self::Csv {
                message: "CSV I/O error".to_string(),
            };
        }
        Self::Csv {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Catalog(CatalogError::from(err))
    }
}
