mod helpers;

use std::sync::Arc;

use helpers::{fixture_path, FixtureDownloader, TestContext, XML_FIXTURE_SIZE};
use varia_storage::{FileError, FileSource, MakeOptions};

#[tokio::test]
async fn test_make_from_path_uses_basename_and_detected_mime_type() {
    let ctx = TestContext::new();
    let path = fixture_path("test.xml");

    let file = ctx
        .file_factory
        .make_from_path(&path, MakeOptions::new())
        .await
        .unwrap();

    assert_eq!(file.name(), "test.xml");
    assert_eq!(file.size(), XML_FIXTURE_SIZE);
    assert_eq!(file.mime_type(), "application/xml");
    assert!(!file.is_uploaded());
    assert_eq!(ctx.mime_helper.seen_paths.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_overrides_skip_detection() {
    let ctx = TestContext::new();

    let file = ctx
        .file_factory
        .make_from_path(
            fixture_path("test.xml"),
            MakeOptions::new().name("other_name.xml").mime_type("image/gif"),
        )
        .await
        .unwrap();

    assert_eq!(file.name(), "other_name.xml");
    assert_eq!(file.mime_type(), "image/gif");
    assert_eq!(file.size(), XML_FIXTURE_SIZE);
    assert!(ctx.mime_helper.seen_paths.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_uploaded_marks_only_the_next_file() {
    let ctx = TestContext::new();
    let path = fixture_path("test.xml");

    let mut flags = Vec::new();
    flags.push(
        ctx.file_factory
            .make_from_path(&path, MakeOptions::new())
            .await
            .unwrap()
            .is_uploaded(),
    );
    flags.push(
        ctx.file_factory
            .uploaded()
            .make_from_path(&path, MakeOptions::new())
            .await
            .unwrap()
            .is_uploaded(),
    );
    flags.push(
        ctx.file_factory
            .make_from_path(&path, MakeOptions::new())
            .await
            .unwrap()
            .is_uploaded(),
    );

    assert_eq!(flags, vec![false, true, false]);
}

#[tokio::test]
async fn test_uploaded_flag_is_consumed_by_failed_creation() {
    let ctx = TestContext::new();

    let err = ctx
        .file_factory
        .uploaded()
        .make_from_path(ctx.dir.path().join("missing.xml"), MakeOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FileError::NotFound { .. }));

    let file = ctx
        .file_factory
        .make_from_path(fixture_path("test.xml"), MakeOptions::new())
        .await
        .unwrap();
    assert!(!file.is_uploaded());
}

#[tokio::test]
async fn test_make_from_url_uses_downloaded_file() {
    let downloader = Arc::new(FixtureDownloader::serving(fixture_path("test.xml")));
    let ctx = TestContext::with_downloader(downloader.clone());

    let file = ctx
        .file_factory
        .make(
            FileSource::detect("http://test.com/test.xml?page=23"),
            MakeOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(file.name(), "test.xml");
    assert_eq!(file.size(), XML_FIXTURE_SIZE);
    assert_eq!(file.mime_type(), "application/xml");
    assert_eq!(
        *downloader.requested.lock().unwrap(),
        vec!["http://test.com/test.xml?page=23".to_string()]
    );
}

#[tokio::test]
async fn test_failed_download_is_a_remote_fetch_error() {
    let ctx = TestContext::new();

    let err = ctx
        .file_factory
        .make_from_url("https://test.com/missing.xml", MakeOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FileError::RemoteFetch { ref url, .. } if url == "https://test.com/missing.xml"
    ));
}

#[tokio::test]
async fn test_make_from_raw_and_data_uri() {
    let ctx = TestContext::new();
    let raw = std::fs::read(fixture_path("test.xml")).unwrap();

    let file = ctx
        .file_factory
        .make_from_raw(raw.clone(), "testing.xml", MakeOptions::new())
        .await
        .unwrap();
    assert_eq!(file.name(), "testing.xml");
    assert_eq!(file.size(), XML_FIXTURE_SIZE);
    assert_eq!(file.mime_type(), "application/xml");
    assert!(file.working_path().starts_with(ctx.dir.path().canonicalize().unwrap()));

    let file = ctx
        .file_factory
        .make(
            FileSource::DataUri {
                uri: "data:image/svg+xml,%3Csvg%2F%3E".to_string(),
                name: "icon.svg".to_string(),
            },
            MakeOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(file.name(), "icon.svg");
    assert_eq!(file.mime_type(), "image/svg+xml");
    assert_eq!(file.size(), 6);
}
