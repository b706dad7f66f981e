//! Engine configuration.

use serde::{Deserialize, Serialize};
use wayline_core::{Result, WaylineError};
use wayline_planner::PlannerConfig;

use crate::synthesizer::SynthesizerConfig;

/// Configuration for a [`crate::Navigator`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub planner: PlannerConfig,
    pub synthesizer: SynthesizerConfig,
}

impl EngineConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| WaylineError::Config(format!("invalid engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.planner.max_rounds == 0 {
            return Err(WaylineError::Config(
                "planner.max_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.planner.max_rounds = max_rounds;
        self
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.synthesizer.fallback_message = message.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesizer::DEFAULT_FALLBACK_MESSAGE;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.planner.max_rounds, 16);
        assert_eq!(config.planner.temperature, 0.0);
        assert_eq!(config.synthesizer.min_extract_chars, 3);
        assert_eq!(config.synthesizer.fallback_message, DEFAULT_FALLBACK_MESSAGE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json_str(
            r#"{"planner": {"max_rounds": 4}, "synthesizer": {"min_fallback_chars": 40}}"#,
        )
        .unwrap();
        assert_eq!(config.planner.max_rounds, 4);
        assert_eq!(config.planner.log_preview_chars, 2_000);
        assert_eq!(config.synthesizer.min_fallback_chars, 40);
        assert_eq!(config.synthesizer.min_extract_chars, 3);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let err = EngineConfig::from_json_str(r#"{"planner": {"max_rounds": 0}}"#).unwrap_err();
        assert!(matches!(err, WaylineError::Config(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = EngineConfig::from_json_str("{planner").unwrap_err();
        assert!(matches!(err, WaylineError::Config(_)));
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_max_rounds(8)
            .with_fallback_message("done");
        assert_eq!(config.planner.max_rounds, 8);
        assert_eq!(config.synthesizer.fallback_message, "done");
    }
}
