//! Varia Processing Library
//!
//! This crate derives named variants from stored files. A [`VariantProcessor`]
//! copies the source file, then runs an ordered [`StrategyChain`] of
//! [`VariantStrategy`] implementations against the copy. Strategies are created
//! by name through the [`VariantStrategyFactory`].

pub mod chain;
pub mod error;
pub mod factory;
pub mod processor;
pub mod strategy;

#[cfg(feature = "image")]
pub mod strategies;

// Re-export commonly used types
pub use chain::StrategyChain;
pub use error::{NotAppliedReason, StrategyError, VariantError, VariantResult};
pub use factory::{StrategyConstructor, StrategyFactoryConfig, VariantStrategyFactory};
pub use processor::{VariantProcessor, VariantProcessorConfig};
pub use strategy::{StrategyOptions, StrategyOutcome, VariantStrategy};

#[cfg(feature = "image")]
pub use strategies::{
    AutoOrientStrategy, ImageSettings, OptimizeStrategy, QualityPreset, ResizeDimensions,
    ResizeStrategy, StretchMode,
};
