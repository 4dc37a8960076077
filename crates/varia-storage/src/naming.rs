//! Filename helpers for content that arrives without a trustworthy name

use std::path::Path;

const MAX_FILENAME_LEN: usize = 255;

/// Reduce an untrusted name to a safe basename
pub(crate) fn sanitize_filename(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "file".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX_FILENAME_LEN)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim_matches(|c| c == '.' || c == '_').is_empty() {
        "file".to_string()
    } else {
        s
    }
}

/// Last non-empty path segment of a URL, sanitized
pub(crate) fn filename_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| {
            let decoded = urlencoding::decode(segment)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            sanitize_filename(&decoded)
        })
        .unwrap_or_else(|| "download".to_string())
}
