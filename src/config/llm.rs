//! LLM provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// LLM provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Which client serves completions
    #[serde(default)]
    pub provider: LlmProvider,

    /// Anthropic API key
    pub anthropic_api_key: Option<Secret<String>>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Messages API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bound on one completion, retries included, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Total attempts per completion, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound on any retry delay, in milliseconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Growth factor between consecutive retry delays
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Token limit for tools that do not set their own
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// LLM provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Anthropic,
    /// Echoing mock client for offline development
    Mock,
}

impl LlmConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    /// Check if an Anthropic key is configured
    pub fn has_anthropic(&self) -> bool {
        self.anthropic_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    /// Validate LLM configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider == LlmProvider::Anthropic && !self.has_anthropic() {
            return Err(ValidationError::MissingRequired("LLM__ANTHROPIC_API_KEY"));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("LLM__MODEL"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidLlmTimeout);
        }
        if self.max_attempts == 0 || self.max_attempts > 10 {
            return Err(ValidationError::InvalidRetryPolicy(
                "max_attempts must be between 1 and 10",
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(ValidationError::InvalidRetryPolicy(
                "backoff_multiplier must be at least 1.0",
            ));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(ValidationError::InvalidRetryPolicy(
                "initial_backoff_ms exceeds max_backoff_ms",
            ));
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        Ok(())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            anthropic_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            backoff_multiplier: default_backoff_multiplier(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_model() -> String {
    crate::adapters::ai::DEFAULT_ANTHROPIC_MODEL.to_string()
}

fn default_base_url() -> String {
    crate::adapters::ai::DEFAULT_ANTHROPIC_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    500
}

fn default_max_backoff() -> u64 {
    8_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_tokens() -> u32 {
    4096
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_key() -> LlmConfig {
        LlmConfig {
            anthropic_api_key: Some(Secret::new("sk-ant-test".to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, LlmProvider::Anthropic);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_backoff(), Duration::from_millis(500));
        assert_eq!(config.max_backoff(), Duration::from_secs(8));
        assert_eq!(config.max_tokens, 4096);
    }

    #[test]
    fn test_anthropic_requires_key() {
        assert_eq!(
            LlmConfig::default().validate(),
            Err(ValidationError::MissingRequired("LLM__ANTHROPIC_API_KEY"))
        );
        assert!(with_key().validate().is_ok());
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = LlmConfig {
            anthropic_api_key: Some(Secret::new("  ".to_string())),
            ..Default::default()
        };
        assert!(!config.has_anthropic());
    }

    #[test]
    fn test_mock_needs_no_key() {
        let config = LlmConfig {
            provider: LlmProvider::Mock,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retry_policy_bounds() {
        let zero_attempts = LlmConfig {
            max_attempts: 0,
            ..with_key()
        };
        assert!(matches!(
            zero_attempts.validate(),
            Err(ValidationError::InvalidRetryPolicy(_))
        ));

        let shrinking = LlmConfig {
            backoff_multiplier: 0.5,
            ..with_key()
        };
        assert!(shrinking.validate().is_err());

        let inverted = LlmConfig {
            initial_backoff_ms: 10_000,
            max_backoff_ms: 1_000,
            ..with_key()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        let config = LlmConfig {
            timeout_secs: 0,
            ..with_key()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidLlmTimeout));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", with_key());
        assert!(!rendered.contains("sk-ant-test"));
    }
}
