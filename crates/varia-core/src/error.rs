//! Error metadata module
//!
//! Every crate keeps its own `thiserror` enum. This module provides the shared
//! trait those enums implement so callers can classify and log failures without
//! matching on each crate's variants.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like invalid input
    Debug,
    /// Warning level - for recoverable issues like a remote host being down
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be reported
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "UNKNOWN_STRATEGY")
    fn error_code(&self) -> &'static str;

    /// Whether the same call may succeed if retried later
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}
