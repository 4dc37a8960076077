//! Varia Core Library
//!
//! This crate provides the configuration, shared error metadata and constants
//! used by every Varia crate.

pub mod config;
pub mod constants;
pub mod error;

// Re-export commonly used types
pub use config::VariaConfig;
pub use error::{ErrorMetadata, LogLevel};
