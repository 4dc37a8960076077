//! Image optimize strategy
//!
//! Re-encodes JPEG (mozjpeg), PNG (best deflate with adaptive filtering) and
//! WebP (libwebp) and keeps the result only when it is smaller than the input.
//!
//! Options:
//! - `quality`: preset name (`normal`, `better`, `best`, `lighter`, `lightest`)
//!   or an integer from 1 to 100. PNG is lossless and ignores it.
//! - `strip_metadata`: drop EXIF from the output (default from [`ImageSettings`])

use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, GenericImageView, ImageFormat};
use img_parts::{DynImage, ImageEXIF};
use serde::Deserialize;
use std::path::Path;

use super::image_io::{decode, image_error, read_image_file, run_blocking, supported_format};
use super::{ImageSettings, OPTIMIZE_KEY};
use crate::error::StrategyError;
use crate::strategy::{parse_options, StrategyOptions, StrategyOutcome, VariantStrategy};

/// Quality presets for lossy compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityPreset {
    #[default]
    Normal,
    /// ≈125% file size
    Better,
    /// Near pristine, ≈170% file size
    Best,
    /// ≈80% file size
    Lighter,
    /// ≈50% file size
    Lightest,
}

impl QualityPreset {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(QualityPreset::Normal),
            "better" => Ok(QualityPreset::Better),
            "best" => Ok(QualityPreset::Best),
            "lighter" => Ok(QualityPreset::Lighter),
            "lightest" => Ok(QualityPreset::Lightest),
            _ => Err(format!("Invalid quality preset: {}", s)),
        }
    }

    pub fn jpeg_quality(self) -> u8 {
        match self {
            QualityPreset::Normal => 75,
            QualityPreset::Better => 85,
            QualityPreset::Best => 95,
            QualityPreset::Lighter => 65,
            QualityPreset::Lightest => 50,
        }
    }

    pub fn webp_quality(self) -> f32 {
        match self {
            QualityPreset::Normal => 80.0,
            QualityPreset::Better => 90.0,
            QualityPreset::Best => 98.0,
            QualityPreset::Lighter => 70.0,
            QualityPreset::Lightest => 55.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Quality {
    Preset(QualityPreset),
    Level(u8),
}

impl Quality {
    fn jpeg(self) -> f32 {
        match self {
            Quality::Preset(preset) => preset.jpeg_quality() as f32,
            Quality::Level(level) => level as f32,
        }
    }

    fn webp(self) -> f32 {
        match self {
            Quality::Preset(preset) => preset.webp_quality(),
            Quality::Level(level) => level as f32,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QualityOption {
    Level(i64),
    Preset(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptimizeOptions {
    quality: Option<QualityOption>,
    strip_metadata: Option<bool>,
}

pub struct OptimizeStrategy {
    quality: Quality,
    strip_metadata: bool,
}

impl OptimizeStrategy {
    pub fn new(settings: ImageSettings) -> Self {
        Self {
            quality: Quality::Level(settings.jpeg_quality),
            strip_metadata: settings.strip_metadata,
        }
    }
}

#[async_trait]
impl VariantStrategy for OptimizeStrategy {
    fn name(&self) -> &str {
        OPTIMIZE_KEY
    }

    fn set_options(&mut self, options: StrategyOptions) -> Result<(), StrategyError> {
        let options: OptimizeOptions = parse_options(options)?;

        match options.quality {
            Some(QualityOption::Level(level)) => {
                if !(1..=100).contains(&level) {
                    return Err(StrategyError::InvalidOptions(format!(
                        "quality must be between 1 and 100, got {}",
                        level
                    )));
                }
                self.quality = Quality::Level(level as u8);
            }
            Some(QualityOption::Preset(preset)) => {
                self.quality = Quality::Preset(
                    QualityPreset::parse(&preset).map_err(StrategyError::InvalidOptions)?,
                );
            }
            None => {}
        }

        if let Some(strip_metadata) = options.strip_metadata {
            self.strip_metadata = strip_metadata;
        }

        Ok(())
    }

    fn should_apply_for_mime_type(&self, mime_type: &str) -> bool {
        supported_format(mime_type).is_some()
    }

    async fn apply(&self, working_path: &Path) -> Result<StrategyOutcome, StrategyError> {
        let quality = self.quality;
        let strip_metadata = self.strip_metadata;
        let path = working_path.to_path_buf();

        run_blocking(move || {
            let (data, format) = read_image_file(&path)?;

            let optimized = match format {
                ImageFormat::Jpeg => compress_jpeg(&decode(&data, format)?, quality.jpeg())?,
                ImageFormat::Png => compress_png(&decode(&data, format)?)?,
                ImageFormat::WebP => compress_webp(&decode(&data, format)?, quality.webp()),
                other => {
                    return Ok(StrategyOutcome::declined(format!(
                        "no optimizer for {:?} images",
                        other
                    )))
                }
            };

            let optimized = if strip_metadata {
                optimized
            } else {
                copy_exif(&data, optimized)
            };

            let original_size = data.len();
            let optimized_size = optimized.len();

            if optimized_size < original_size {
                std::fs::write(&path, &optimized)?;
            }

            tracing::debug!(
                path = %path.display(),
                format = ?format,
                original_size = original_size,
                optimized_size = optimized_size,
                replaced = optimized_size < original_size,
                "Image optimized"
            );

            Ok(StrategyOutcome::Applied)
        })
        .await
    }
}

/// Progressive JPEG with optimized Huffman tables. mozjpeg reports errors by
/// unwinding, so the encoder runs under `catch_unwind`.
fn compress_jpeg(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, StrategyError> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();

    let encoded = std::panic::catch_unwind(std::panic::AssertUnwindSafe(
        || -> std::io::Result<Vec<u8>> {
            let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
            comp.set_size(width as usize, height as usize);
            comp.set_quality(quality);
            comp.set_progressive_mode();
            comp.set_optimize_coding(true);

            let mut comp = comp.start_compress(Vec::new())?;
            comp.write_scanlines(&rgb_img)?;
            comp.finish()
        },
    ));

    match encoded {
        Ok(result) => Ok(result?),
        Err(_) => Err(StrategyError::Execution("mozjpeg failed to encode".to_string())),
    }
}

fn compress_png(img: &DynamicImage) -> Result<Vec<u8>, StrategyError> {
    let mut buffer = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder).map_err(image_error)?;
    Ok(buffer)
}

fn compress_webp(img: &DynamicImage, quality: f32) -> Vec<u8> {
    let (width, height) = img.dimensions();
    let rgba_img = img.to_rgba8();
    let encoded = webp::Encoder::from_rgba(&rgba_img, width, height).encode(quality);
    encoded.to_vec()
}

/// Carry the EXIF block of `original` over to `optimized`, when both sides support it
fn copy_exif(original: &[u8], optimized: Vec<u8>) -> Vec<u8> {
    let exif = match DynImage::from_bytes(Bytes::copy_from_slice(original)) {
        Ok(Some(image)) => image.exif(),
        _ => None,
    };
    let Some(exif) = exif else {
        return optimized;
    };

    match DynImage::from_bytes(Bytes::from(optimized.clone())) {
        Ok(Some(mut image)) => {
            image.set_exif(Some(exif));
            image.encoder().bytes().to_vec()
        }
        _ => optimized,
    }
}
