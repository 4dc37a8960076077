//! EXIF auto-orient strategy
//!
//! Options:
//! - `quiet`: leave files without an orientation tag alone (default `true`)

use async_trait::async_trait;
use image::{imageops, DynamicImage};
use serde::Deserialize;
use std::io::Cursor;
use std::path::Path;

use super::image_io::{decode, encode, read_image_file, run_blocking, supported_format};
use super::AUTO_ORIENT_KEY;
use crate::error::StrategyError;
use crate::strategy::{parse_options, StrategyOptions, StrategyOutcome, VariantStrategy};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AutoOrientOptions {
    quiet: Option<bool>,
}

/// Bakes the EXIF orientation into the pixels.
///
/// With `quiet` (the default) a file without a readable orientation is left
/// untouched; otherwise the strategy declines.
pub struct AutoOrientStrategy {
    quiet: bool,
}

impl AutoOrientStrategy {
    pub fn new() -> Self {
        Self { quiet: true }
    }
}

impl Default for AutoOrientStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VariantStrategy for AutoOrientStrategy {
    fn name(&self) -> &str {
        AUTO_ORIENT_KEY
    }

    fn set_options(&mut self, options: StrategyOptions) -> Result<(), StrategyError> {
        let options: AutoOrientOptions = parse_options(options)?;
        self.quiet = options.quiet.unwrap_or(true);
        Ok(())
    }

    fn should_apply_for_mime_type(&self, mime_type: &str) -> bool {
        supported_format(mime_type).is_some()
    }

    async fn apply(&self, working_path: &Path) -> Result<StrategyOutcome, StrategyError> {
        let quiet = self.quiet;
        let path = working_path.to_path_buf();

        run_blocking(move || {
            let (data, format) = read_image_file(&path)?;

            let orientation = match read_exif_orientation(&data) {
                Some(orientation) => orientation,
                None if quiet => return Ok(StrategyOutcome::Applied),
                None => return Ok(StrategyOutcome::declined("no EXIF orientation found")),
            };

            let transform = OrientationTransform::from_exif(orientation);
            if transform.is_identity() {
                return Ok(StrategyOutcome::Applied);
            }

            let oriented = transform.apply(decode(&data, format)?);
            std::fs::write(&path, encode(&oriented, format)?)?;

            tracing::debug!(
                path = %path.display(),
                orientation = orientation,
                transform = ?transform,
                "Applied EXIF orientation"
            );

            Ok(StrategyOutcome::Applied)
        })
        .await
    }
}

/// Orientation value (1-8) of the primary image, if any
fn read_exif_orientation(data: &[u8]) -> Option<u32> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0)
}

/// Clockwise rotation, then flips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OrientationTransform {
    rotate: Option<u16>,
    flip_horizontal: bool,
    flip_vertical: bool,
}

impl OrientationTransform {
    fn from_exif(orientation: u32) -> Self {
        let (rotate, flip_horizontal, flip_vertical) = match orientation {
            2 => (None, true, false),
            3 => (Some(180), false, false),
            4 => (None, false, true),
            5 => (Some(90), true, false),
            6 => (Some(90), false, false),
            7 => (Some(270), true, false),
            8 => (Some(270), false, false),
            // 1 and out-of-range values
            _ => (None, false, false),
        };
        Self {
            rotate,
            flip_horizontal,
            flip_vertical,
        }
    }

    fn is_identity(&self) -> bool {
        self.rotate.is_none() && !self.flip_horizontal && !self.flip_vertical
    }

    fn apply(&self, mut img: DynamicImage) -> DynamicImage {
        img = match self.rotate {
            Some(90) => DynamicImage::ImageRgba8(imageops::rotate90(&img.to_rgba8())),
            Some(180) => DynamicImage::ImageRgba8(imageops::rotate180(&img.to_rgba8())),
            Some(270) => DynamicImage::ImageRgba8(imageops::rotate270(&img.to_rgba8())),
            _ => img,
        };
        if self.flip_horizontal {
            img = DynamicImage::ImageRgba8(imageops::flip_horizontal(&img.to_rgba8()));
        }
        if self.flip_vertical {
            img = DynamicImage::ImageRgba8(imageops::flip_vertical(&img.to_rgba8()));
        }
        img
    }
}
