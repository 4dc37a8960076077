//! Ordered strategy chains
//!
//! A chain lists `(strategy name, options)` pairs in execution order. It can be
//! built in code or parsed from JSON, either as an object
//! (`{"resize": {"width": 100}, "optimize": {}}`, key order kept) or as an
//! array of single-key objects when the same strategy must run twice.

use serde::Deserialize;
use serde_json::Value;

use crate::error::VariantError;
use crate::strategy::StrategyOptions;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct StrategyChain {
    steps: Vec<(String, StrategyOptions)>,
}

impl StrategyChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step, builder style
    pub fn with(mut self, name: impl Into<String>, options: StrategyOptions) -> Self {
        self.push(name, options);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, options: StrategyOptions) {
        self.steps.push((name.into(), options));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StrategyOptions)> {
        self.steps
            .iter()
            .map(|(name, options)| (name.as_str(), options))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|(name, _)| name.as_str())
    }
}

fn step_options(name: &str, value: Value) -> Result<StrategyOptions, VariantError> {
    match value {
        Value::Object(options) => Ok(options),
        Value::Null => Ok(StrategyOptions::new()),
        other => Err(VariantError::InvalidChain(format!(
            "options for '{}' must be an object, got {}",
            name, other
        ))),
    }
}

impl TryFrom<Value> for StrategyChain {
    type Error = VariantError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut chain = StrategyChain::new();

        match value {
            Value::Object(steps) => {
                for (name, options) in steps {
                    let options = step_options(&name, options)?;
                    chain.push(name, options);
                }
            }
            Value::Array(steps) => {
                for step in steps {
                    let Value::Object(step) = step else {
                        return Err(VariantError::InvalidChain(
                            "array steps must be objects".to_string(),
                        ));
                    };
                    if step.len() != 1 {
                        return Err(VariantError::InvalidChain(format!(
                            "array steps must name exactly one strategy, got {}",
                            step.len()
                        )));
                    }
                    for (name, options) in step {
                        let options = step_options(&name, options)?;
                        chain.push(name, options);
                    }
                }
            }
            Value::Null => {}
            other => {
                return Err(VariantError::InvalidChain(format!(
                    "expected an object or an array, got {}",
                    other
                )))
            }
        }

        Ok(chain)
    }
}

impl FromIterator<(String, StrategyOptions)> for StrategyChain {
    fn from_iter<I: IntoIterator<Item = (String, StrategyOptions)>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for StrategyChain {
    type Item = (String, StrategyOptions);
    type IntoIter = std::vec::IntoIter<(String, StrategyOptions)>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_keeps_key_order() {
        let chain = StrategyChain::try_from(json!({
            "optimize": {"quality": "best"},
            "auto-orient": null,
            "resize": {"width": 100},
        }))
        .unwrap();

        assert_eq!(
            chain.names().collect::<Vec<_>>(),
            vec!["optimize", "auto-orient", "resize"]
        );
        let (_, options) = chain.iter().nth(2).unwrap();
        assert_eq!(options.get("width"), Some(&json!(100)));
        assert!(chain.iter().nth(1).unwrap().1.is_empty());
    }

    #[test]
    fn test_array_allows_repeated_strategies() {
        let chain = StrategyChain::try_from(json!([
            {"resize": {"width": 800}},
            {"optimize": {}},
            {"resize": {"width": 100}},
        ]))
        .unwrap();

        assert_eq!(chain.len(), 3);
        assert_eq!(
            chain.names().collect::<Vec<_>>(),
            vec!["resize", "optimize", "resize"]
        );
    }

    #[test]
    fn test_invalid_chains() {
        assert!(matches!(
            StrategyChain::try_from(json!("resize")),
            Err(VariantError::InvalidChain(_))
        ));
        assert!(matches!(
            StrategyChain::try_from(json!({"resize": 100})),
            Err(VariantError::InvalidChain(_))
        ));
        assert!(matches!(
            StrategyChain::try_from(json!([{"resize": {}, "optimize": {}}])),
            Err(VariantError::InvalidChain(_))
        ));
    }

    #[test]
    fn test_deserialize_and_build() {
        let chain: StrategyChain = serde_json::from_str(r#"{"b": {}, "a": {}}"#).unwrap();
        assert_eq!(chain.names().collect::<Vec<_>>(), vec!["b", "a"]);

        let built = StrategyChain::new()
            .with("b", StrategyOptions::new())
            .with("a", StrategyOptions::new());
        assert_eq!(built, chain);
        assert!(StrategyChain::try_from(Value::Null).unwrap().is_empty());
    }
}
