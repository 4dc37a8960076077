//! Mime type detection
//!
//! Content is identified by its magic numbers first (`infer`). Paths fall back
//! to the file extension (`mime_guess`) when the signature is unknown, which is
//! the common case for text formats.

use std::io::Read;
use std::path::Path;

use varia_core::constants::FALLBACK_MIME_TYPE;

/// Number of leading bytes inspected when sniffing a file on disk
const SNIFF_LEN: u64 = 8192;

/// Mime type detection capability used by the file factory
pub trait MimeTypeHelper: Send + Sync {
    fn guess_mime_type_for_path(&self, path: &Path) -> String;

    fn guess_mime_type_for_content(&self, content: &[u8]) -> String;

    /// Preferred file extension (without dot) for a mime type
    fn guess_extension_for_mime_type(&self, mime_type: &str) -> Option<String>;
}

/// Default detector backed by `infer` and `mime_guess`
#[derive(Debug, Clone, Copy, Default)]
pub struct InferMimeTypeHelper;

impl InferMimeTypeHelper {
    pub fn new() -> Self {
        Self
    }

    fn sniff_text(content: &[u8]) -> Option<&'static str> {
        if content.is_empty() || content.contains(&0) {
            return None;
        }
        let text = std::str::from_utf8(content).ok()?;
        let trimmed = text.trim_start_matches('\u{feff}').trim_start();
        if trimmed.starts_with("<?xml") {
            Some("application/xml")
        } else {
            Some("text/plain")
        }
    }

    fn read_head(path: &Path) -> Option<Vec<u8>> {
        let file = std::fs::File::open(path).ok()?;
        let mut head = Vec::new();
        file.take(SNIFF_LEN).read_to_end(&mut head).ok()?;
        Some(head)
    }
}

impl MimeTypeHelper for InferMimeTypeHelper {
    fn guess_mime_type_for_path(&self, path: &Path) -> String {
        let head = Self::read_head(path).unwrap_or_default();

        if let Some(kind) = infer::get(&head) {
            return kind.mime_type().to_string();
        }

        if let Some(guess) = mime_guess::from_path(path).first() {
            return guess.essence_str().to_string();
        }

        Self::sniff_text(&head)
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string()
    }

    fn guess_mime_type_for_content(&self, content: &[u8]) -> String {
        infer::get(content)
            .map(|kind| kind.mime_type())
            .or_else(|| Self::sniff_text(content))
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string()
    }

    fn guess_extension_for_mime_type(&self, mime_type: &str) -> Option<String> {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or(mime_type)
            .trim()
            .to_lowercase();

        // mime_guess lists extensions alphabetically, so pin the usual ones
        let preferred = match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/gif" => Some("gif"),
            "image/webp" => Some("webp"),
            "image/avif" => Some("avif"),
            "image/tiff" => Some("tiff"),
            "image/svg+xml" => Some("svg"),
            "application/pdf" => Some("pdf"),
            "application/xml" | "text/xml" => Some("xml"),
            "text/plain" => Some("txt"),
            _ => None,
        };

        preferred.map(str::to_string).or_else(|| {
            mime_guess::get_mime_extensions_str(&essence)
                .and_then(|extensions| extensions.first())
                .map(|e| e.to_string())
        })
    }
}
