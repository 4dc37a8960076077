//! Strategy contract

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

use crate::error::StrategyError;

/// Options handed to a strategy, as found in the strategy chain
pub type StrategyOptions = serde_json::Map<String, Value>;

/// Result of a strategy run that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Applied,
    /// The strategy chose not to transform the file
    Declined { reason: String },
}

impl StrategyOutcome {
    pub fn declined(reason: impl Into<String>) -> Self {
        StrategyOutcome::Declined {
            reason: reason.into(),
        }
    }
}

/// One transformation step of a variant.
///
/// Instances are created fresh for every step by the strategy factory, so
/// `set_options` is called once before any other method.
#[async_trait]
pub trait VariantStrategy: Send + Sync {
    /// Implementation key, used in logs and errors
    fn name(&self) -> &str;

    fn set_options(&mut self, options: StrategyOptions) -> Result<(), StrategyError>;

    /// Whether this strategy handles files of `mime_type`. Must not touch the file.
    fn should_apply_for_mime_type(&self, mime_type: &str) -> bool;

    /// Transform the file at `working_path` in place
    async fn apply(&self, working_path: &Path) -> Result<StrategyOutcome, StrategyError>;
}

/// Deserialize typed options, reporting serde's message as invalid options
pub fn parse_options<T: DeserializeOwned>(options: StrategyOptions) -> Result<T, StrategyError> {
    serde_json::from_value(Value::Object(options))
        .map_err(|e| StrategyError::InvalidOptions(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct SampleOptions {
        width: u32,
        #[serde(default)]
        label: Option<String>,
    }

    fn options(value: Value) -> StrategyOptions {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_parse_options() {
        let parsed: SampleOptions = parse_options(options(json!({"width": 100}))).unwrap();
        assert_eq!(parsed.width, 100);
        assert!(parsed.label.is_none());
    }

    #[test]
    fn test_parse_options_rejects_unknown_and_mistyped_fields() {
        let err = parse_options::<SampleOptions>(options(json!({"width": 1, "colour": "red"})))
            .unwrap_err();
        assert!(matches!(err, StrategyError::InvalidOptions(ref m) if m.contains("colour")));

        let err = parse_options::<SampleOptions>(options(json!({"width": "wide"}))).unwrap_err();
        assert!(matches!(err, StrategyError::InvalidOptions(_)));
    }
}
