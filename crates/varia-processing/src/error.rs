//! Strategy and variant errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use varia_core::{ErrorMetadata, LogLevel};
use varia_storage::FileError;

/// Errors raised by a single strategy
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a strategy was not applied to a variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotAppliedReason {
    /// The strategy does not handle the target's mime type and force-apply is on
    MimeTypeMismatch { mime_type: String },
    /// The strategy looked at the file and declined to transform it
    Declined { reason: String },
}

impl fmt::Display for NotAppliedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotAppliedReason::MimeTypeMismatch { mime_type } => {
                write!(f, "mime type {} is not supported", mime_type)
            }
            NotAppliedReason::Declined { reason } => write!(f, "declined: {}", reason),
        }
    }
}

/// Errors raised while processing a variant
#[derive(Debug, Error)]
pub enum VariantError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("Unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error("Invalid strategy chain: {0}")]
    InvalidChain(String),

    #[error("Invalid variant name '{0}': only letters, digits, '-' and '_' are allowed")]
    InvalidVariantName(String),

    #[error("Invalid options for strategy '{strategy}' in variant '{variant}': {source}")]
    InvalidStrategyOptions {
        strategy: String,
        variant: String,
        #[source]
        source: StrategyError,
    },

    #[error(
        "Strategy '{strategy}' failed on variant '{variant}' of {}: {source}",
        .source_path.display()
    )]
    StrategyExecution {
        strategy: String,
        variant: String,
        source_path: PathBuf,
        #[source]
        source: StrategyError,
    },

    #[error(
        "Strategy '{strategy}' was not applied to variant '{variant}' of {}: {reason}",
        .source_path.display()
    )]
    StrategyNotApplied {
        strategy: String,
        variant: String,
        source_path: PathBuf,
        reason: NotAppliedReason,
    },
}

/// Result type for variant processing
pub type VariantResult<T> = Result<T, VariantError>;

impl ErrorMetadata for VariantError {
    fn error_code(&self) -> &'static str {
        match self {
            VariantError::File(err) => err.error_code(),
            VariantError::UnknownStrategy { .. } => "UNKNOWN_STRATEGY",
            VariantError::InvalidChain(_) => "INVALID_STRATEGY_CHAIN",
            VariantError::InvalidVariantName(_) => "INVALID_VARIANT_NAME",
            VariantError::InvalidStrategyOptions { .. } => "INVALID_STRATEGY_OPTIONS",
            VariantError::StrategyExecution { .. } => "STRATEGY_EXECUTION_FAILED",
            VariantError::StrategyNotApplied { .. } => "STRATEGY_NOT_APPLIED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            VariantError::File(err) => err.is_recoverable(),
            _ => false,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            VariantError::File(err) => err.log_level(),
            VariantError::InvalidChain(_) | VariantError::InvalidVariantName(_) => LogLevel::Debug,
            VariantError::StrategyNotApplied { .. } => LogLevel::Warn,
            VariantError::UnknownStrategy { .. }
            | VariantError::InvalidStrategyOptions { .. }
            | VariantError::StrategyExecution { .. } => LogLevel::Error,
        }
    }
}
