//! Varia Infrastructure Library
//!
//! Shared process-level setup for binaries and tests embedding the variant
//! pipeline. Currently this is telemetry initialization only.

pub mod telemetry;

pub use telemetry::init_telemetry;
