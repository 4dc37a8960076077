//! Configuration module
//!
//! Settings for the variant pipeline, loaded from the environment (and a `.env`
//! file when present).

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_DOWNLOAD_MAX_BYTES, DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_JPEG_QUALITY,
    DEFAULT_WORK_DIR_NAME,
};

/// Variant pipeline configuration
#[derive(Clone, Debug)]
pub struct VariaConfig {
    /// Fail a variant when a strategy does not apply to the file's mime type
    pub force_apply: bool,
    /// Directory holding variant working copies, raw content and downloads
    pub work_dir: PathBuf,
    pub download_timeout_secs: u64,
    pub download_max_bytes: u64,
    /// Strategy alias -> registered implementation key
    pub strategy_aliases: BTreeMap<String, String>,
    pub jpeg_quality: u8,
    pub strip_metadata: bool,
}

impl Default for VariaConfig {
    fn default() -> Self {
        Self {
            force_apply: false,
            work_dir: env::temp_dir().join(DEFAULT_WORK_DIR_NAME),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            download_max_bytes: DEFAULT_DOWNLOAD_MAX_BYTES,
            strategy_aliases: BTreeMap::new(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            strip_metadata: true,
        }
    }
}

impl VariaConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            force_apply: env::var("VARIA_FORCE_APPLY")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            work_dir: env::var("VARIA_WORK_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            download_timeout_secs: env::var("VARIA_DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_DOWNLOAD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            download_max_bytes: env::var("VARIA_DOWNLOAD_MAX_BYTES")
                .unwrap_or_else(|_| DEFAULT_DOWNLOAD_MAX_BYTES.to_string())
                .parse()
                .unwrap_or(DEFAULT_DOWNLOAD_MAX_BYTES),
            strategy_aliases: match env::var("VARIA_STRATEGY_ALIASES") {
                Ok(raw) => parse_aliases(&raw)?,
                Err(_) => BTreeMap::new(),
            },
            jpeg_quality: env::var("VARIA_JPEG_QUALITY")
                .unwrap_or_else(|_| DEFAULT_JPEG_QUALITY.to_string())
                .parse()
                .unwrap_or(DEFAULT_JPEG_QUALITY),
            strip_metadata: env::var("VARIA_STRIP_METADATA")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.download_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "VARIA_DOWNLOAD_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.download_max_bytes == 0 {
            return Err(anyhow::anyhow!(
                "VARIA_DOWNLOAD_MAX_BYTES must be greater than zero"
            ));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(anyhow::anyhow!(
                "VARIA_JPEG_QUALITY must be between 1 and 100, got {}",
                self.jpeg_quality
            ));
        }

        if self.work_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("VARIA_WORK_DIR must not be empty"));
        }

        Ok(())
    }
}

/// Parse `alias=key,alias=key` pairs
pub fn parse_aliases(raw: &str) -> Result<BTreeMap<String, String>, anyhow::Error> {
    let mut aliases = BTreeMap::new();

    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (alias, key) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid strategy alias '{}', expected alias=key", pair))?;
        let (alias, key) = (alias.trim(), key.trim());
        if alias.is_empty() || key.is_empty() {
            return Err(anyhow::anyhow!(
                "Invalid strategy alias '{}', alias and key must be non-empty",
                pair
            ));
        }
        aliases.insert(alias.to_string(), key.to_string());
    }

    Ok(aliases)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        let aliases = parse_aliases("thumb=image-resize, squash = image-optimize").unwrap();
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases["thumb"], "image-resize");
        assert_eq!(aliases["squash"], "image-optimize");
    }

    #[test]
    fn test_parse_aliases_empty() {
        assert!(parse_aliases("").unwrap().is_empty());
        assert!(parse_aliases(" , ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_aliases_invalid() {
        assert!(parse_aliases("thumb").is_err());
        assert!(parse_aliases("=image-resize").is_err());
        assert!(parse_aliases("thumb=").is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = VariaConfig::default();
        assert!(!config.force_apply);
        assert!(config.strip_metadata);
        assert!(config.work_dir.ends_with(DEFAULT_WORK_DIR_NAME));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = VariaConfig {
            download_timeout_secs: 0,
            ..VariaConfig::default()
        };
        assert!(config.validate().is_err());

        let config = VariaConfig {
            jpeg_quality: 0,
            ..VariaConfig::default()
        };
        assert!(config.validate().is_err());

        let config = VariaConfig {
            download_max_bytes: 0,
            ..VariaConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
