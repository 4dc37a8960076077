//! Built-in image strategies

mod auto_orient;
mod image_io;
mod optimize;
mod resize;

pub use auto_orient::AutoOrientStrategy;
pub use optimize::{OptimizeStrategy, QualityPreset};
pub use resize::{ResizeDimensions, ResizeStrategy, StretchMode};

use varia_core::constants::DEFAULT_JPEG_QUALITY;
use varia_core::VariaConfig;

use crate::factory::VariantStrategyFactory;

pub const RESIZE_KEY: &str = "image-resize";
pub const OPTIMIZE_KEY: &str = "image-optimize";
pub const AUTO_ORIENT_KEY: &str = "image-auto-orient";

/// Defaults applied by the image strategies when options leave them out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSettings {
    pub jpeg_quality: u8,
    pub strip_metadata: bool,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            strip_metadata: true,
        }
    }
}

impl From<&VariaConfig> for ImageSettings {
    fn from(config: &VariaConfig) -> Self {
        Self {
            jpeg_quality: config.jpeg_quality,
            strip_metadata: config.strip_metadata,
        }
    }
}

pub(crate) fn register_defaults(factory: &mut VariantStrategyFactory, settings: ImageSettings) {
    factory.register(RESIZE_KEY, || Box::new(ResizeStrategy::new()));
    factory.register(OPTIMIZE_KEY, move || Box::new(OptimizeStrategy::new(settings)));
    factory.register(AUTO_ORIENT_KEY, || Box::new(AutoOrientStrategy::new()));

    factory.configure(
        crate::factory::StrategyFactoryConfig::default()
            .alias("resize", RESIZE_KEY)
            .alias("optimize", OPTIMIZE_KEY)
            .alias("auto-orient", AUTO_ORIENT_KEY),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::StrategyFactoryConfig;

    #[test]
    fn test_defaults_are_registered_with_aliases() {
        let factory = VariantStrategyFactory::with_defaults(ImageSettings::default());
        assert_eq!(
            factory.names(),
            vec![
                "auto-orient",
                "image-auto-orient",
                "image-optimize",
                "image-resize",
                "optimize",
                "resize",
            ]
        );
        assert_eq!(factory.make("resize").unwrap().name(), RESIZE_KEY);
        assert_eq!(factory.make("optimize").unwrap().name(), OPTIMIZE_KEY);
        assert_eq!(factory.make("auto-orient").unwrap().name(), AUTO_ORIENT_KEY);
    }

    #[test]
    fn test_configured_alias_replaces_default_alias() {
        let mut factory = VariantStrategyFactory::with_defaults(ImageSettings::default());
        factory.configure(StrategyFactoryConfig::default().alias("resize", OPTIMIZE_KEY));
        assert_eq!(factory.make("resize").unwrap().name(), OPTIMIZE_KEY);
    }

    #[test]
    fn test_image_strategies_only_apply_to_raster_images() {
        let factory = VariantStrategyFactory::with_defaults(ImageSettings::default());
        for name in ["resize", "optimize", "auto-orient"] {
            let strategy = factory.make(name).unwrap();
            for mime_type in ["image/jpeg", "image/png", "image/webp", "IMAGE/PNG"] {
                assert!(strategy.should_apply_for_mime_type(mime_type), "{} {}", name, mime_type);
            }
            for mime_type in ["image/svg+xml", "text/plain", "application/xml", "video/mp4"] {
                assert!(!strategy.should_apply_for_mime_type(mime_type), "{} {}", name, mime_type);
            }
        }
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = VariaConfig::default();
        config.jpeg_quality = 60;
        config.strip_metadata = false;
        let settings = ImageSettings::from(&config);
        assert_eq!(settings.jpeg_quality, 60);
        assert!(!settings.strip_metadata);
    }
}
