//! Storable file errors

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use varia_core::{ErrorMetadata, LogLevel};

/// Errors raised while creating or reading a storable file
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Could not retrieve remote file {url}: {source}")]
    RemoteFetch {
        url: String,
        #[source]
        source: DownloadError,
    },

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    /// Map an IO error on `path`, keeping "not found" distinguishable
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            FileError::NotFound { path }
        } else {
            FileError::Io { path, source }
        }
    }
}

/// Result type for storable file operations
pub type FileResult<T> = Result<T, FileError>;

/// URL downloader errors
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Only HTTP and HTTPS URLs are allowed, got: {0}")]
    UnsupportedScheme(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("URL returned status code: {status}")]
    Status { status: u16 },

    #[error("Remote file exceeds the limit of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Download failed: {0}")]
    Other(String),
}

impl DownloadError {
    /// Timeouts, connection failures and 5xx responses may succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            DownloadError::Request(err) => err.is_timeout() || err.is_connect(),
            DownloadError::Status { status } => *status >= 500,
            _ => false,
        }
    }
}

impl ErrorMetadata for FileError {
    fn error_code(&self) -> &'static str {
        match self {
            FileError::NotFound { .. } => "FILE_NOT_FOUND",
            FileError::RemoteFetch { .. } => "REMOTE_FETCH_FAILED",
            FileError::InvalidDataUri(_) => "INVALID_DATA_URI",
            FileError::Io { .. } => "FILE_IO_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            FileError::RemoteFetch { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            FileError::InvalidDataUri(_) => LogLevel::Debug,
            FileError::NotFound { .. } | FileError::RemoteFetch { .. } => LogLevel::Warn,
            FileError::Io { .. } => LogLevel::Error,
        }
    }
}
