//! Varia Storage Library
//!
//! This crate provides the storable file abstraction used by the variant
//! pipeline: the `StorableFile` value, the factory that creates it from paths,
//! URLs, raw bytes and data URIs, and the collaborator traits for mime type
//! detection and URL downloading.
//!
//! Persisting a `StorableFile` to a storage backend is left to the caller; the
//! working path, name and mime type are everything a backend needs.

pub mod data_uri;
pub mod download;
pub mod error;
pub mod factory;
pub mod file;
pub mod mime;
pub(crate) mod naming;

// Re-export commonly used types
pub use data_uri::{parse_data_uri, DataUri};
pub use download::{HttpDownloader, UrlDownloader};
pub use error::{DownloadError, FileError, FileResult};
pub use factory::{FileSource, StorableFileFactory};
pub use file::{MakeOptions, StorableFile};
pub use mime::{InferMimeTypeHelper, MimeTypeHelper};
