//! Image resize strategy
//!
//! Options:
//! - `dimensions`: `"WxH"`, `"Wx"` or `"xH"`
//! - `width` / `height`: alternative to `dimensions`
//! - `stretch`: `on` (default), `off` (never upscale) or `fill` (pad with white)

use async_trait::async_trait;
use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};
use serde::Deserialize;
use std::path::Path;

use super::image_io::{decode, encode, read_image_file, run_blocking, supported_format};
use super::RESIZE_KEY;
use crate::error::StrategyError;
use crate::strategy::{parse_options, StrategyOptions, StrategyOutcome, VariantStrategy};

/// Stretch mode for image resizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StretchMode {
    /// Allow upscaling
    #[default]
    On,
    /// Keep the original when the target is larger
    Off,
    /// Center the original on a white canvas when the target is larger
    Fill,
}

impl StretchMode {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "on" => Ok(StretchMode::On),
            "off" => Ok(StretchMode::Off),
            "fill" => Ok(StretchMode::Fill),
            _ => Err(format!("Invalid stretch mode: {}", s)),
        }
    }
}

/// Target size; a missing side keeps the aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeDimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ResizeDimensions {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Result<Self, String> {
        if width == Some(0) || height == Some(0) {
            return Err("Dimensions must be greater than zero".to_string());
        }
        if width.is_none() && height.is_none() {
            return Err("At least one dimension must be specified".to_string());
        }
        Ok(Self { width, height })
    }

    /// Parse `"WxH"`, `"Wx"` or `"xH"`
    pub fn parse(s: &str) -> Result<Self, String> {
        let (width, height) = s
            .trim()
            .split_once('x')
            .ok_or_else(|| "Invalid dimensions format. Expected: WxH, Wx, or xH".to_string())?;

        let parse_side = |side: &str, label: &str| -> Result<Option<u32>, String> {
            if side.is_empty() {
                Ok(None)
            } else {
                side.parse::<u32>()
                    .map(Some)
                    .map_err(|_| format!("Invalid {}: {}", label, side))
            }
        };

        Self::new(parse_side(width, "width")?, parse_side(height, "height")?)
    }

    /// Final size for an image of `orig_width` x `orig_height`
    pub fn target_for(&self, orig_width: u32, orig_height: u32) -> (u32, u32) {
        match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => {
                let aspect_ratio = orig_height as f32 / orig_width as f32;
                let h = (w as f32 * aspect_ratio).round() as u32;
                (w, h.max(1))
            }
            (None, Some(h)) => {
                let aspect_ratio = orig_width as f32 / orig_height as f32;
                let w = (h as f32 * aspect_ratio).round() as u32;
                (w.max(1), h)
            }
            (None, None) => (orig_width, orig_height),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResizeOptions {
    dimensions: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    stretch: Option<String>,
}

pub struct ResizeStrategy {
    dimensions: Option<ResizeDimensions>,
    stretch: StretchMode,
}

impl ResizeStrategy {
    pub fn new() -> Self {
        Self {
            dimensions: None,
            stretch: StretchMode::default(),
        }
    }
}

impl Default for ResizeStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VariantStrategy for ResizeStrategy {
    fn name(&self) -> &str {
        RESIZE_KEY
    }

    fn set_options(&mut self, options: StrategyOptions) -> Result<(), StrategyError> {
        let options: ResizeOptions = parse_options(options)?;

        let dimensions = match (options.dimensions, options.width, options.height) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(StrategyError::InvalidOptions(
                    "use either dimensions or width/height, not both".to_string(),
                ))
            }
            (Some(dimensions), None, None) => ResizeDimensions::parse(&dimensions),
            (None, width, height) => ResizeDimensions::new(width, height),
        }
        .map_err(StrategyError::InvalidOptions)?;

        self.dimensions = Some(dimensions);
        self.stretch = match options.stretch {
            Some(stretch) => StretchMode::parse(&stretch).map_err(StrategyError::InvalidOptions)?,
            None => StretchMode::default(),
        };

        Ok(())
    }

    fn should_apply_for_mime_type(&self, mime_type: &str) -> bool {
        supported_format(mime_type).is_some()
    }

    async fn apply(&self, working_path: &Path) -> Result<StrategyOutcome, StrategyError> {
        let dimensions = self.dimensions.ok_or_else(|| {
            StrategyError::InvalidOptions("resize dimensions were not configured".to_string())
        })?;
        let stretch = self.stretch;
        let path = working_path.to_path_buf();

        run_blocking(move || {
            let (data, format) = read_image_file(&path)?;
            if !format.writing_enabled() {
                return Ok(StrategyOutcome::declined(format!(
                    "cannot re-encode {:?} images",
                    format
                )));
            }

            let img = decode(&data, format)?;
            let (orig_width, orig_height) = img.dimensions();
            let resized = apply_resize(&img, dimensions, stretch);

            std::fs::write(&path, encode(&resized, format)?)?;

            tracing::debug!(
                path = %path.display(),
                from = ?(orig_width, orig_height),
                to = ?resized.dimensions(),
                stretch = ?stretch,
                "Image resized"
            );

            Ok(StrategyOutcome::Applied)
        })
        .await
    }
}

/// Pick a cheaper filter for strong downscales
fn select_filter(
    orig_width: u32,
    orig_height: u32,
    new_width: u32,
    new_height: u32,
) -> imageops::FilterType {
    let width_ratio = orig_width as f32 / new_width as f32;
    let height_ratio = orig_height as f32 / new_height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        imageops::FilterType::Triangle
    } else if max_ratio > 1.5 {
        imageops::FilterType::CatmullRom
    } else {
        imageops::FilterType::Lanczos3
    }
}

fn resize_exact(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (orig_width, orig_height) = img.dimensions();
    let filter = select_filter(orig_width, orig_height, width, height);
    img.resize_exact(width, height, filter)
}

/// Fit the image inside the target without upscaling and center it on white
fn resize_with_fill(img: &DynamicImage, target_width: u32, target_height: u32) -> DynamicImage {
    let (orig_width, orig_height) = img.dimensions();

    let scale = (target_width as f32 / orig_width as f32)
        .min(target_height as f32 / orig_height as f32)
        .min(1.0);

    let scaled_width = ((orig_width as f32 * scale).round() as u32).max(1);
    let scaled_height = ((orig_height as f32 * scale).round() as u32).max(1);

    let mut canvas = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        target_width,
        target_height,
        Rgba([255, 255, 255, 255]),
    ));

    let x_offset = target_width.saturating_sub(scaled_width) / 2;
    let y_offset = target_height.saturating_sub(scaled_height) / 2;

    if scale < 1.0 {
        let resized = resize_exact(img, scaled_width, scaled_height);
        imageops::overlay(&mut canvas, &resized, x_offset as i64, y_offset as i64);
    } else {
        imageops::overlay(&mut canvas, img, x_offset as i64, y_offset as i64);
    }

    canvas
}

fn apply_resize(
    img: &DynamicImage,
    dimensions: ResizeDimensions,
    stretch: StretchMode,
) -> DynamicImage {
    let (orig_width, orig_height) = img.dimensions();
    let (target_width, target_height) = dimensions.target_for(orig_width, orig_height);
    let upscaling = target_width > orig_width || target_height > orig_height;

    match stretch {
        StretchMode::On => resize_exact(img, target_width, target_height),
        StretchMode::Off if upscaling => img.clone(),
        StretchMode::Fill if upscaling => resize_with_fill(img, target_width, target_height),
        StretchMode::Off | StretchMode::Fill => resize_exact(img, target_width, target_height),
    }
}
