//! Storable file factory
//!
//! Builds [`StorableFile`] values from local paths, URLs, raw bytes, data URIs
//! or an existing file. Every entry point resolves name and mime type the same
//! way: explicit [`MakeOptions`] win, otherwise the basename and the mime type
//! detector are used.
//!
//! The `uploaded` marker can be set per call through [`MakeOptions::uploaded`]
//! or for the next created file only through [`StorableFileFactory::uploaded`].

use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::data_uri::parse_data_uri;
use crate::download::UrlDownloader;
use crate::error::{FileError, FileResult};
use crate::file::{MakeOptions, StorableFile};
use crate::mime::MimeTypeHelper;

/// Where the content of a new storable file comes from
#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    Url(String),
    Raw { content: Bytes, name: String },
    DataUri { uri: String, name: String },
    Existing(StorableFile),
}

impl FileSource {
    /// Classify a string as URL, data URI or local path
    pub fn detect(input: &str) -> Self {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower.starts_with("http://") || lower.starts_with("https://") {
            FileSource::Url(trimmed.to_string())
        } else if lower.starts_with("data:") {
            FileSource::DataUri {
                uri: trimmed.to_string(),
                name: "file".to_string(),
            }
        } else {
            FileSource::Path(PathBuf::from(input))
        }
    }
}

pub struct StorableFileFactory {
    mime_helper: Arc<dyn MimeTypeHelper>,
    downloader: Arc<dyn UrlDownloader>,
    temp_dir: PathBuf,
    mark_next_uploaded: AtomicBool,
}

impl StorableFileFactory {
    /// `temp_dir` receives the files created from raw content and data URIs
    pub fn new(
        mime_helper: Arc<dyn MimeTypeHelper>,
        downloader: Arc<dyn UrlDownloader>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mime_helper,
            downloader,
            temp_dir: temp_dir.into(),
            mark_next_uploaded: AtomicBool::new(false),
        }
    }

    pub fn mime_helper(&self) -> &Arc<dyn MimeTypeHelper> {
        &self.mime_helper
    }

    /// Mark the next file created by this factory as uploaded.
    ///
    /// The flag is consumed by the next `make*` call, whether or not that call
    /// succeeds; later files are not uploaded unless marked again.
    pub fn uploaded(&self) -> &Self {
        self.mark_next_uploaded.store(true, Ordering::SeqCst);
        self
    }

    fn consume_uploaded(&self, mut options: MakeOptions) -> MakeOptions {
        let marked = self.mark_next_uploaded.swap(false, Ordering::SeqCst);
        options.uploaded = options.uploaded || marked;
        options
    }

    pub async fn make(&self, source: FileSource, options: MakeOptions) -> FileResult<StorableFile> {
        match source {
            FileSource::Path(path) => self.make_from_path(path, options).await,
            FileSource::Url(url) => self.make_from_url(&url, options).await,
            FileSource::Raw { content, name } => self.make_from_raw(content, &name, options).await,
            FileSource::DataUri { uri, name } => {
                self.make_from_data_uri(&uri, &name, options).await
            }
            FileSource::Existing(file) => self.make_from_existing(&file, options).await,
        }
    }

    pub async fn make_from_path(
        &self,
        path: impl AsRef<Path>,
        options: MakeOptions,
    ) -> FileResult<StorableFile> {
        let options = self.consume_uploaded(options);
        let path = path.as_ref();

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| FileError::io(path, e))?;

        if !metadata.is_file() {
            return Err(FileError::NotFound {
                path: path.to_path_buf(),
            });
        }

        // Readability check; the handle is dropped right away
        tokio::fs::File::open(path)
            .await
            .map_err(|e| FileError::io(path, e))?;

        let working_path = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| FileError::io(path, e))?;

        // Name and mime type follow the path as given, not a symlink target
        let name = match options.name {
            Some(name) => name,
            None => basename(path)
                .or_else(|| basename(&working_path))
                .unwrap_or_default(),
        };

        let mime_type = match options.mime_type {
            Some(mime_type) => mime_type,
            None => self.mime_helper.guess_mime_type_for_path(path),
        };

        tracing::debug!(
            path = %working_path.display(),
            name = %name,
            mime_type = %mime_type,
            size_bytes = metadata.len(),
            uploaded = options.uploaded,
            "Storable file created"
        );

        Ok(StorableFile::new(
            working_path,
            name,
            mime_type,
            metadata.len(),
            options.uploaded,
        ))
    }

    /// Download `url` and wrap the local copy. Downloader failures are not retried.
    pub async fn make_from_url(&self, url: &str, options: MakeOptions) -> FileResult<StorableFile> {
        let options = self.consume_uploaded(options);

        let local_path = self
            .downloader
            .download(url)
            .await
            .map_err(|source| FileError::RemoteFetch {
                url: url.to_string(),
                source,
            })?;

        self.make_from_path(local_path, options).await
    }

    /// Write `content` to a new temporary file and wrap it.
    ///
    /// `options.name`, when set, takes precedence over `name`.
    pub async fn make_from_raw(
        &self,
        content: impl Into<Bytes>,
        name: &str,
        options: MakeOptions,
    ) -> FileResult<StorableFile> {
        let mut options = self.consume_uploaded(options);
        let content: Bytes = content.into();

        let name = options.name.take().unwrap_or_else(|| name.to_string());
        let mime_type = match options.mime_type.take() {
            Some(mime_type) => mime_type,
            None => self.mime_helper.guess_mime_type_for_content(&content),
        };

        let extension = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string)
            .or_else(|| self.mime_helper.guess_extension_for_mime_type(&mime_type));

        let path = self.write_temp_file(&content, extension.as_deref()).await?;

        self.make_from_path(
            path,
            MakeOptions {
                name: Some(name),
                mime_type: Some(mime_type),
                uploaded: options.uploaded,
            },
        )
        .await
    }

    /// Decode a `data:` URI and wrap its payload. The URI's media type is used
    /// unless `options.mime_type` is set.
    pub async fn make_from_data_uri(
        &self,
        uri: &str,
        name: &str,
        options: MakeOptions,
    ) -> FileResult<StorableFile> {
        let mut options = self.consume_uploaded(options);
        let parsed = parse_data_uri(uri)?;

        if options.mime_type.is_none() {
            options.mime_type = Some(parsed.mime_type);
        }

        self.make_from_raw(parsed.data, name, options).await
    }

    /// Re-wrap an existing file, re-reading its size and applying overrides.
    /// Name and mime type default to the existing file's values.
    pub async fn make_from_existing(
        &self,
        file: &StorableFile,
        mut options: MakeOptions,
    ) -> FileResult<StorableFile> {
        if options.name.is_none() {
            options.name = Some(file.name().to_string());
        }
        if options.mime_type.is_none() {
            options.mime_type = Some(file.mime_type().to_string());
        }

        self.make_from_path(file.working_path(), options).await
    }

    async fn write_temp_file(&self, content: &[u8], extension: Option<&str>) -> FileResult<PathBuf> {
        tokio::fs::create_dir_all(&self.temp_dir)
            .await
            .map_err(|e| FileError::io(&self.temp_dir, e))?;

        let file_name = match extension {
            Some(extension) => format!("raw-{}.{}", Uuid::new_v4(), extension),
            None => format!("raw-{}", Uuid::new_v4()),
        };
        let path = self.temp_dir.join(file_name);

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| FileError::io(&path, e))?;

        Ok(path)
    }
}

fn basename(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
