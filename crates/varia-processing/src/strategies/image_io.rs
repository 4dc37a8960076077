use image::{DynamicImage, ImageError, ImageFormat};
use std::io::Cursor;
use std::path::Path;

use crate::error::StrategyError;

/// Image format behind `mime_type`, if it can be both decoded and re-encoded
pub(crate) fn supported_format(mime_type: &str) -> Option<ImageFormat> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or(mime_type)
        .trim()
        .to_ascii_lowercase();

    ImageFormat::from_mime_type(essence)
        .filter(|format| format.reading_enabled() && format.writing_enabled())
}

/// Run CPU-bound image work on the blocking pool
pub(crate) async fn run_blocking<T, F>(task: F) -> Result<T, StrategyError>
where
    F: FnOnce() -> Result<T, StrategyError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| StrategyError::Execution(format!("image task failed: {}", e)))?
}

pub(crate) fn image_error(err: ImageError) -> StrategyError {
    StrategyError::Execution(err.to_string())
}

/// Read a file and sniff its image format from the content
pub(crate) fn read_image_file(path: &Path) -> Result<(Vec<u8>, ImageFormat), StrategyError> {
    let data = std::fs::read(path)?;
    let format = image::guess_format(&data)
        .map_err(|e| StrategyError::Execution(format!("unrecognized image data: {}", e)))?;
    Ok((data, format))
}

pub(crate) fn decode(data: &[u8], format: ImageFormat) -> Result<DynamicImage, StrategyError> {
    image::load_from_memory_with_format(data, format).map_err(image_error)
}

/// Encode with the `image` codecs, converting pixels where the codec needs it
pub(crate) fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, StrategyError> {
    let mut buffer = Cursor::new(Vec::new());

    match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut buffer, format),
        ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buffer, format),
        _ => img.write_to(&mut buffer, format),
    }
    .map_err(image_error)?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
pub(crate) mod test_images {
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    /// Gradient with some noise so lossy codecs have work to do
    pub(crate) fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let noise = ((x * 7919 + y * 104729) % 31) as u8;
            Rgb([
                (x * 255 / width.max(1)) as u8 ^ noise,
                (y * 255 / height.max(1)) as u8,
                noise * 8,
            ])
        }))
    }

    pub(crate) fn encoded(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        super::encode(img, format).unwrap()
    }

    pub(crate) fn write(dir: &std::path::Path, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }
}
