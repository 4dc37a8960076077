//! Shared constants

/// Directory name appended to the OS temp dir when no work dir is configured
pub const DEFAULT_WORK_DIR_NAME: &str = "varia";

/// Mime type used when neither content nor path tell us anything
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_DOWNLOAD_MAX_BYTES: u64 = 100 * 1024 * 1024;
pub const DEFAULT_JPEG_QUALITY: u8 = 75;
