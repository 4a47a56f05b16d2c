//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `WRITING_ASSISTANT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use writing_assistant::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod error;
mod llm;
mod persistence;
mod server;
mod tools;

pub use error::{ConfigError, ValidationError};
pub use llm::{LlmConfig, LlmProvider};
pub use persistence::{PersistenceBackend, PersistenceConfig};
pub use server::{Environment, ServerConfig};
pub use tools::ToolsConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the writing assistant.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM provider configuration (Anthropic, retries, timeout)
    #[serde(default)]
    pub llm: LlmConfig,

    /// Result persistence configuration
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Tool registry configuration
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `WRITING_ASSISTANT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `WRITING_ASSISTANT__SERVER__PORT=8001` -> `server.port = 8001`
    /// - `WRITING_ASSISTANT__LLM__MAX_ATTEMPTS=5` -> `llm.max_attempts = 5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("WRITING_ASSISTANT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.llm.validate()?;
        self.persistence.validate()?;
        self.tools.validate()?;

        if self.server.request_timeout_secs <= self.llm.timeout_secs {
            return Err(ValidationError::RequestTimeoutTooShort {
                request_secs: self.server.request_timeout_secs,
                llm_secs: self.llm.timeout_secs,
            });
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::PersistenceMode;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "WRITING_ASSISTANT__LLM__ANTHROPIC_API_KEY",
        "WRITING_ASSISTANT__LLM__MAX_ATTEMPTS",
        "WRITING_ASSISTANT__LLM__BACKOFF_MULTIPLIER",
        "WRITING_ASSISTANT__SERVER__PORT",
        "WRITING_ASSISTANT__SERVER__ENVIRONMENT",
        "WRITING_ASSISTANT__PERSISTENCE__BACKEND",
        "WRITING_ASSISTANT__PERSISTENCE__MODE",
        "WRITING_ASSISTANT__TOOLS__DEFINITIONS_PATH",
    ];

    fn set_minimal_env() {
        env::set_var("WRITING_ASSISTANT__LLM__ANTHROPIC_API_KEY", "sk-ant-xxx");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        let key = config.llm.anthropic_api_key.as_ref().unwrap();
        assert_eq!(key.expose_secret(), "sk-ant-xxx");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8001);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.llm.max_attempts, 3);
        assert_eq!(config.persistence.backend, PersistenceBackend::Memory);
        assert_eq!(config.tools.default_tool, "chat");
    }

    #[test]
    fn test_nested_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("WRITING_ASSISTANT__LLM__MAX_ATTEMPTS", "5");
        env::set_var("WRITING_ASSISTANT__LLM__BACKOFF_MULTIPLIER", "1.5");
        env::set_var("WRITING_ASSISTANT__SERVER__PORT", "3000");
        env::set_var("WRITING_ASSISTANT__PERSISTENCE__BACKEND", "disabled");
        env::set_var("WRITING_ASSISTANT__PERSISTENCE__MODE", "detached");
        env::set_var("WRITING_ASSISTANT__TOOLS__DEFINITIONS_PATH", "/etc/tools.yaml");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.llm.max_attempts, 5);
        assert_eq!(config.llm.backoff_multiplier, 1.5);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.persistence.backend, PersistenceBackend::Disabled);
        assert_eq!(config.persistence.mode, PersistenceMode::Detached);
        assert_eq!(
            config.tools.definitions_path.as_deref(),
            Some(std::path::Path::new("/etc/tools.yaml"))
        );
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("WRITING_ASSISTANT__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn test_request_timeout_must_exceed_llm_timeout() {
        let mut config = AppConfig::default();
        config.llm.provider = LlmProvider::Mock;
        assert!(config.validate().is_ok());

        config.server.request_timeout_secs = config.llm.timeout_secs;
        assert_eq!(
            config.validate(),
            Err(ValidationError::RequestTimeoutTooShort {
                request_secs: 30,
                llm_secs: 30,
            })
        );
    }

    #[test]
    fn test_missing_key_fails_validation() {
        let config = AppConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }
}
