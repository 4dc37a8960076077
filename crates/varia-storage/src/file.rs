//! Storable file value

use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::{FileError, FileResult};

/// A local file that can be handed to a storage backend.
///
/// `size` is captured when the file is created. Strategies rewrite the working
/// file in place, so use [`StorableFile::current_size`] when the size after
/// processing matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorableFile {
    working_path: PathBuf,
    name: String,
    mime_type: String,
    size: u64,
    uploaded: bool,
}

impl StorableFile {
    pub fn new(
        working_path: impl Into<PathBuf>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        uploaded: bool,
    ) -> Self {
        Self {
            working_path: working_path.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            uploaded,
        }
    }

    pub fn working_path(&self) -> &Path {
        &self.working_path
    }

    /// Logical filename, independent of the working path
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Byte length at creation time
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether this is fresh content meant to be persisted, as opposed to a
    /// reference to something already in storage
    pub fn is_uploaded(&self) -> bool {
        self.uploaded
    }

    /// Lower-cased extension of the logical name, falling back to the working path
    pub fn extension(&self) -> Option<String> {
        extension_of(Path::new(&self.name)).or_else(|| extension_of(&self.working_path))
    }

    /// Re-stat the working path
    pub async fn current_size(&self) -> FileResult<u64> {
        let metadata = tokio::fs::metadata(&self.working_path)
            .await
            .map_err(|e| FileError::io(&self.working_path, e))?;
        Ok(metadata.len())
    }

    pub async fn read(&self) -> FileResult<Bytes> {
        let data = tokio::fs::read(&self.working_path)
            .await
            .map_err(|e| FileError::io(&self.working_path, e))?;
        Ok(Bytes::from(data))
    }

    /// Copy the working content to `destination`, returning the bytes copied
    pub async fn copy_to(&self, destination: &Path) -> FileResult<u64> {
        let err = match tokio::fs::copy(&self.working_path, destination).await {
            Ok(copied) => return Ok(copied),
            Err(err) => err,
        };

        let source_missing = err.kind() == std::io::ErrorKind::NotFound
            && !tokio::fs::try_exists(&self.working_path)
                .await
                .unwrap_or(false);

        if source_missing {
            Err(FileError::NotFound {
                path: self.working_path.clone(),
            })
        } else {
            Err(FileError::Io {
                path: destination.to_path_buf(),
                source: err,
            })
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_lowercase())
}

/// Per-call options for creating a storable file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MakeOptions {
    /// Logical name; defaults to the basename of the path
    pub name: Option<String>,
    /// Mime type; defaults to detection
    pub mime_type: Option<String>,
    /// Mark the created file as uploaded
    pub uploaded: bool,
}

impl MakeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn uploaded(mut self, uploaded: bool) -> Self {
        self.uploaded = uploaded;
        self
    }
}
