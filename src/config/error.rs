//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddr(String),

    #[error("Invalid request timeout (must be 1-600 seconds)")]
    InvalidTimeout,

    #[error("Request timeout ({request_secs}s) must exceed the LLM timeout ({llm_secs}s)")]
    RequestTimeoutTooShort { request_secs: u64, llm_secs: u64 },

    #[error("Invalid LLM timeout (must be 1-300 seconds)")]
    InvalidLlmTimeout,

    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(&'static str),

    #[error("max_tokens must be greater than zero")]
    InvalidMaxTokens,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool size must be between 1 and 100")]
    InvalidPoolSize,

    #[error("memory_capacity must be greater than zero")]
    InvalidMemoryCapacity,

    #[error("Persistence budget must be between 1 and 10000 ms")]
    InvalidPersistenceBudget,

    #[error("No tool source configured (builtin tools disabled and no definitions file)")]
    NoToolsConfigured,

    #[error("max_input_chars must be greater than zero")]
    InvalidInputLimit,
}
