//! Strategy factory
//!
//! Maps strategy names to constructors. Names are resolved through the
//! configured aliases first, then looked up among the registered
//! implementation keys.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::VariantError;
use crate::strategy::VariantStrategy;

/// Builds a fresh, unconfigured strategy instance
pub type StrategyConstructor = Arc<dyn Fn() -> Box<dyn VariantStrategy> + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StrategyFactoryConfig {
    /// Alias -> registered implementation key
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl StrategyFactoryConfig {
    pub fn alias(mut self, alias: impl Into<String>, key: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), key.into());
        self
    }
}

#[derive(Clone, Default)]
pub struct VariantStrategyFactory {
    constructors: HashMap<String, StrategyConstructor>,
    aliases: BTreeMap<String, String>,
}

impl VariantStrategyFactory {
    /// Create a factory with no strategies registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with the built-in image strategies and their short aliases
    #[cfg(feature = "image")]
    pub fn with_defaults(settings: crate::strategies::ImageSettings) -> Self {
        let mut factory = Self::new();
        crate::strategies::register_defaults(&mut factory, settings);
        factory
    }

    /// Merge alias configuration. Later entries replace earlier ones.
    pub fn configure(&mut self, config: StrategyFactoryConfig) {
        self.aliases.extend(config.aliases);
    }

    /// Register a constructor for an implementation key, replacing any previous one
    pub fn register<F>(&mut self, key: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn VariantStrategy> + Send + Sync + 'static,
    {
        self.constructors.insert(key.into(), Arc::new(constructor));
    }

    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Create a new strategy instance for `name`
    pub fn make(&self, name: &str) -> Result<Box<dyn VariantStrategy>, VariantError> {
        let key = self.resolve(name);

        let constructor =
            self.constructors
                .get(key)
                .ok_or_else(|| VariantError::UnknownStrategy {
                    name: name.to_string(),
                })?;

        tracing::trace!(strategy = %name, implementation = %key, "Strategy created");

        Ok(constructor())
    }

    /// Whether `make(name)` would succeed
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(self.resolve(name))
    }

    /// Every name `make` accepts, sorted: implementation keys and usable aliases
    pub fn names(&self) -> Vec<String> {
        let aliases = self
            .aliases
            .iter()
            .filter(|(_, key)| self.constructors.contains_key(key.as_str()))
            .map(|(alias, _)| alias.clone());

        self.constructors
            .keys()
            .cloned()
            .chain(aliases)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl fmt::Debug for VariantStrategyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.constructors.keys().collect();
        keys.sort();
        f.debug_struct("VariantStrategyFactory")
            .field("strategies", &keys)
            .field("aliases", &self.aliases)
            .finish()
    }
}
