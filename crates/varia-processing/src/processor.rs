//! Variant processor
//!
//! Orchestrates one variant: copy the source, then run each strategy of the
//! chain against the copy, in order. The first failure aborts the variant and
//! the working copy is left where it is.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use varia_core::constants::DEFAULT_WORK_DIR_NAME;
use varia_core::VariaConfig;
use varia_storage::{FileError, MakeOptions, StorableFile, StorableFileFactory};

use crate::chain::StrategyChain;
use crate::error::{NotAppliedReason, VariantError, VariantResult};
use crate::factory::{StrategyFactoryConfig, VariantStrategyFactory};
use crate::strategy::{StrategyOptions, StrategyOutcome};

#[derive(Debug, Clone)]
pub struct VariantProcessorConfig {
    /// Fail instead of skipping when a strategy does not handle the mime type
    pub force_apply: bool,
    /// Root directory for variant working copies
    pub work_dir: PathBuf,
    pub strategy_factory: StrategyFactoryConfig,
}

impl Default for VariantProcessorConfig {
    fn default() -> Self {
        Self {
            force_apply: false,
            work_dir: std::env::temp_dir().join(DEFAULT_WORK_DIR_NAME),
            strategy_factory: StrategyFactoryConfig::default(),
        }
    }
}

impl From<&VariaConfig> for VariantProcessorConfig {
    fn from(config: &VariaConfig) -> Self {
        Self {
            force_apply: config.force_apply,
            work_dir: config.work_dir.clone(),
            strategy_factory: StrategyFactoryConfig {
                aliases: config.strategy_aliases.clone(),
            },
        }
    }
}

pub struct VariantProcessor {
    file_factory: Arc<StorableFileFactory>,
    strategy_factory: VariantStrategyFactory,
    force_apply: bool,
    work_dir: PathBuf,
}

impl VariantProcessor {
    pub fn new(
        file_factory: Arc<StorableFileFactory>,
        strategy_factory: VariantStrategyFactory,
    ) -> Self {
        let defaults = VariantProcessorConfig::default();
        Self {
            file_factory,
            strategy_factory,
            force_apply: defaults.force_apply,
            work_dir: defaults.work_dir,
        }
    }

    pub fn with_config(mut self, config: VariantProcessorConfig) -> Self {
        self.set_config(config);
        self
    }

    /// Store processor settings and forward the strategy configuration to the factory
    pub fn set_config(&mut self, config: VariantProcessorConfig) {
        self.force_apply = config.force_apply;
        self.work_dir = config.work_dir;
        self.strategy_factory.configure(config.strategy_factory);
    }

    pub fn force_apply(&self) -> bool {
        self.force_apply
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn strategy_factory(&self) -> &VariantStrategyFactory {
        &self.strategy_factory
    }

    /// Derive the variant `variant_name` of `source` by running `chain` on a copy.
    ///
    /// The returned file is marked uploaded and keeps the source's name and mime
    /// type. The source file is never modified.
    #[tracing::instrument(
        skip(self, source, chain),
        fields(operation = "process_variant", source = %source.working_path().display())
    )]
    pub async fn process(
        &self,
        source: &StorableFile,
        variant_name: &str,
        chain: &StrategyChain,
    ) -> VariantResult<StorableFile> {
        validate_variant_name(variant_name)?;

        if let Some(unknown) = chain.names().find(|name| !self.strategy_factory.contains(name)) {
            return Err(VariantError::UnknownStrategy {
                name: unknown.to_string(),
            });
        }

        let start = Instant::now();
        tracing::info!(
            variant = %variant_name,
            mime_type = %source.mime_type(),
            strategies = chain.len(),
            "Processing variant"
        );

        let target = self.create_working_copy(source, variant_name).await?;

        for (strategy_name, options) in chain.iter() {
            if let Err(err) = self
                .run_strategy(source, &target, variant_name, strategy_name, options)
                .await
            {
                tracing::warn!(
                    variant = %variant_name,
                    strategy = %strategy_name,
                    path = %target.working_path().display(),
                    error = %err,
                    "Variant failed, working copy left in place"
                );
                return Err(err);
            }
        }

        tracing::info!(
            variant = %variant_name,
            path = %target.working_path().display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Variant processed"
        );

        Ok(target)
    }

    /// Process several variants of one source in order, stopping at the first failure
    pub async fn process_many(
        &self,
        source: &StorableFile,
        variants: &[(String, StrategyChain)],
    ) -> VariantResult<Vec<StorableFile>> {
        let mut results = Vec::with_capacity(variants.len());
        for (variant_name, chain) in variants {
            results.push(self.process(source, variant_name, chain).await?);
        }
        Ok(results)
    }

    async fn create_working_copy(
        &self,
        source: &StorableFile,
        variant_name: &str,
    ) -> VariantResult<StorableFile> {
        let dir = self.work_dir.join(variant_name);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| FileError::io(&dir, e))?;

        let file_name = match source.extension() {
            Some(extension) => format!("{}.{}", Uuid::new_v4(), extension),
            None => Uuid::new_v4().to_string(),
        };
        let path = dir.join(file_name);

        let copied = source.copy_to(&path).await?;
        tracing::debug!(
            variant = %variant_name,
            path = %path.display(),
            size_bytes = copied,
            "Working copy created"
        );

        let target = self
            .file_factory
            .make_from_path(
                &path,
                MakeOptions::new()
                    .name(source.name())
                    .mime_type(source.mime_type())
                    .uploaded(true),
            )
            .await?;

        Ok(target)
    }

    async fn run_strategy(
        &self,
        source: &StorableFile,
        target: &StorableFile,
        variant_name: &str,
        strategy_name: &str,
        options: &StrategyOptions,
    ) -> VariantResult<()> {
        let mut strategy = self.strategy_factory.make(strategy_name)?;

        strategy
            .set_options(options.clone())
            .map_err(|err| VariantError::InvalidStrategyOptions {
                strategy: strategy_name.to_string(),
                variant: variant_name.to_string(),
                source: err,
            })?;

        let mime_type = target.mime_type();
        if !strategy.should_apply_for_mime_type(mime_type) {
            if self.force_apply {
                return Err(VariantError::StrategyNotApplied {
                    strategy: strategy_name.to_string(),
                    variant: variant_name.to_string(),
                    source_path: source.working_path().to_path_buf(),
                    reason: NotAppliedReason::MimeTypeMismatch {
                        mime_type: mime_type.to_string(),
                    },
                });
            }

            tracing::debug!(
                variant = %variant_name,
                strategy = %strategy_name,
                mime_type = %mime_type,
                "Strategy skipped for mime type"
            );
            return Ok(());
        }

        let start = Instant::now();
        match strategy.apply(target.working_path()).await {
            Ok(StrategyOutcome::Applied) => {
                tracing::debug!(
                    variant = %variant_name,
                    strategy = %strategy_name,
                    implementation = %strategy.name(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Strategy applied"
                );
                Ok(())
            }
            Ok(StrategyOutcome::Declined { reason }) => Err(VariantError::StrategyNotApplied {
                strategy: strategy_name.to_string(),
                variant: variant_name.to_string(),
                source_path: source.working_path().to_path_buf(),
                reason: NotAppliedReason::Declined { reason },
            }),
            Err(err) => Err(VariantError::StrategyExecution {
                strategy: strategy_name.to_string(),
                variant: variant_name.to_string(),
                source_path: source.working_path().to_path_buf(),
                source: err,
            }),
        }
    }
}

/// Variant names become a directory segment, so keep them to a safe charset
fn validate_variant_name(name: &str) -> VariantResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(VariantError::InvalidVariantName(name.to_string()))
    }
}
