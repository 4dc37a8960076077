#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use varia_processing::{
    StrategyError, StrategyOptions, StrategyOutcome, VariantProcessor, VariantProcessorConfig,
    VariantStrategy, VariantStrategyFactory,
};
use varia_storage::{DownloadError, MimeTypeHelper, StorableFileFactory, UrlDownloader};

pub const XML_FIXTURE_SIZE: u64 = 766;

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Mime helper that always answers `application/xml` and records the paths it saw
#[derive(Default)]
pub struct XmlMimeTypeHelper {
    pub seen_paths: Mutex<Vec<PathBuf>>,
}

impl MimeTypeHelper for XmlMimeTypeHelper {
    fn guess_mime_type_for_path(&self, path: &Path) -> String {
        self.seen_paths.lock().unwrap().push(path.to_path_buf());
        "application/xml".to_string()
    }

    fn guess_mime_type_for_content(&self, _content: &[u8]) -> String {
        "application/xml".to_string()
    }

    fn guess_extension_for_mime_type(&self, _mime_type: &str) -> Option<String> {
        Some("xml".to_string())
    }
}

/// Downloader that "downloads" by returning a local fixture
pub struct FixtureDownloader {
    pub path: Option<PathBuf>,
    pub requested: Mutex<Vec<String>>,
}

impl FixtureDownloader {
    pub fn serving(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            path: None,
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UrlDownloader for FixtureDownloader {
    async fn download(&self, url: &str) -> Result<PathBuf, DownloadError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.path
            .clone()
            .ok_or_else(|| DownloadError::Status { status: 404 })
    }
}

/// Strategy events in call order, shared between a test and its strategies
pub type Events = Arc<Mutex<Vec<String>>>;

/// Strategy that records every call and appends its name to the file
pub struct RecordingStrategy {
    pub name: String,
    pub mime_types: Vec<String>,
    pub decline: bool,
    pub events: Events,
}

#[async_trait]
impl VariantStrategy for RecordingStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_options(&mut self, _options: StrategyOptions) -> Result<(), StrategyError> {
        self.events
            .lock()
            .unwrap()
            .push(format!("{}:set_options", self.name));
        Ok(())
    }

    fn should_apply_for_mime_type(&self, mime_type: &str) -> bool {
        self.mime_types.iter().any(|m| m == mime_type)
    }

    async fn apply(&self, working_path: &Path) -> Result<StrategyOutcome, StrategyError> {
        self.events
            .lock()
            .unwrap()
            .push(format!("{}:apply", self.name));

        if self.decline {
            return Ok(StrategyOutcome::declined("declined by test"));
        }

        let mut content = tokio::fs::read(working_path).await?;
        content.extend_from_slice(format!("<!-- {} -->", self.name).as_bytes());
        tokio::fs::write(working_path, content).await?;
        Ok(StrategyOutcome::Applied)
    }
}

pub struct TestContext {
    pub dir: TempDir,
    pub mime_helper: Arc<XmlMimeTypeHelper>,
    pub file_factory: Arc<StorableFileFactory>,
    pub events: Events,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_downloader(Arc::new(FixtureDownloader::failing()))
    }

    pub fn with_downloader(downloader: Arc<dyn UrlDownloader>) -> Self {
        let _ = varia_infra::init_telemetry(Some("varia=debug"));
        let dir = tempfile::tempdir().unwrap();
        let mime_helper = Arc::new(XmlMimeTypeHelper::default());
        let file_factory = Arc::new(StorableFileFactory::new(
            mime_helper.clone(),
            downloader,
            dir.path().join("raw"),
        ));

        Self {
            dir,
            mime_helper,
            file_factory,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.dir.path().join("variants")
    }

    /// Register a recording strategy under `name`
    pub fn register(
        &self,
        factory: &mut VariantStrategyFactory,
        name: &str,
        mime_types: &[&str],
        decline: bool,
    ) {
        let events = self.events.clone();
        let name = name.to_string();
        let mime_types: Vec<String> = mime_types.iter().map(|m| m.to_string()).collect();

        factory.register(name.clone(), move || {
            events.lock().unwrap().push(format!("{}:make", name));
            Box::new(RecordingStrategy {
                name: name.clone(),
                mime_types: mime_types.clone(),
                decline,
                events: events.clone(),
            })
        });
    }

    pub fn processor(&self, factory: VariantStrategyFactory, force_apply: bool) -> VariantProcessor {
        VariantProcessor::new(self.file_factory.clone(), factory).with_config(
            VariantProcessorConfig {
                force_apply,
                work_dir: self.work_dir(),
                ..Default::default()
            },
        )
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Copy a fixture into the temp dir so tests can compare against the original
    pub fn copy_fixture(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::copy(fixture_path(name), &path).unwrap();
        path
    }
}
