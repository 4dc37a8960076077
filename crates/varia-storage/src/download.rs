//! URL downloading
//!
//! The factory only sees the [`UrlDownloader`] trait. [`HttpDownloader`] is the
//! default implementation: it streams the body to a fresh directory under the
//! download root so the local basename matches the URL's last path segment.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use varia_core::VariaConfig;

use crate::error::DownloadError;
use crate::naming::filename_from_url;

/// Fetches a remote file to a local path
#[async_trait]
pub trait UrlDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<PathBuf, DownloadError>;
}

/// HTTP(S) downloader backed by reqwest
#[derive(Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    download_dir: PathBuf,
    max_bytes: u64,
}

impl HttpDownloader {
    pub fn new(
        download_dir: impl Into<PathBuf>,
        timeout: Duration,
        max_bytes: u64,
    ) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            download_dir: download_dir.into(),
            max_bytes,
        })
    }

    pub fn from_config(config: &VariaConfig) -> Result<Self, DownloadError> {
        Self::new(
            config.work_dir.join("downloads"),
            Duration::from_secs(config.download_timeout_secs),
            config.download_max_bytes,
        )
    }

    async fn stream_to_file(
        &self,
        response: &mut reqwest::Response,
        path: &Path,
    ) -> Result<u64, DownloadError> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(DownloadError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(written)
    }

    fn parse_url(url: &str) -> Result<reqwest::Url, DownloadError> {
        let parsed = reqwest::Url::parse(url.trim())
            .map_err(|e| DownloadError::InvalidUrl(format!("{}: {}", url, e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(DownloadError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        if parsed.host_str().is_none() {
            return Err(DownloadError::InvalidUrl(format!("{}: URL must have a host", url)));
        }

        Ok(parsed)
    }
}

#[async_trait]
impl UrlDownloader for HttpDownloader {
    #[tracing::instrument(skip(self), fields(operation = "download"))]
    async fn download(&self, url: &str) -> Result<PathBuf, DownloadError> {
        let parsed = Self::parse_url(url)?;
        let start = Instant::now();

        let mut response = self.client.get(parsed.clone()).send().await?;

        if !response.status().is_success() {
            return Err(DownloadError::Status {
                status: response.status().as_u16(),
            });
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(DownloadError::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        let dir = self.download_dir.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(filename_from_url(&parsed));

        // Partial downloads are removed on any failure
        let written = match self.stream_to_file(&mut response, &path).await {
            Ok(written) => written,
            Err(err) => {
                if let Err(cleanup) = tokio::fs::remove_dir_all(&dir).await {
                    tracing::warn!(
                        path = %dir.display(),
                        error = %cleanup,
                        "Failed to remove partial download"
                    );
                }
                return Err(err);
            }
        };

        tracing::info!(
            url = %parsed,
            path = %path.display(),
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote file downloaded"
        );

        Ok(path)
    }
}
