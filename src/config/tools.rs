//! Tool registry configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::tools::DEFAULT_TOOL_ID;
use crate::domain::writing::DEFAULT_MAX_INPUT_CHARS;

/// Tool registry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    /// YAML file with additional tool definitions
    pub definitions_path: Option<PathBuf>,

    /// Register the built-in tools
    #[serde(default = "default_true")]
    pub include_builtin: bool,

    /// Tool used when a request names none
    #[serde(default = "default_tool")]
    pub default_tool: String,

    /// Upper bound on request input, in characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl ToolsConfig {
    /// Validate tool configuration
    ///
    /// Whether `default_tool` exists is only known once the registry is
    /// built, so that check happens at startup.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.include_builtin && self.definitions_path.is_none() {
            return Err(ValidationError::NoToolsConfigured);
        }
        if self.default_tool.trim().is_empty() {
            return Err(ValidationError::MissingRequired("TOOLS__DEFAULT_TOOL"));
        }
        if self.max_input_chars == 0 {
            return Err(ValidationError::InvalidInputLimit);
        }
        Ok(())
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            definitions_path: None,
            include_builtin: default_true(),
            default_tool: default_tool(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_tool() -> String {
    DEFAULT_TOOL_ID.to_string()
}

fn default_max_input_chars() -> usize {
    DEFAULT_MAX_INPUT_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_defaults() {
        let config = ToolsConfig::default();
        assert!(config.include_builtin);
        assert_eq!(config.default_tool, "chat");
        assert_eq!(config.max_input_chars, 50_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_needs_a_tool_source() {
        let config = ToolsConfig {
            include_builtin: false,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::NoToolsConfigured));

        let config = ToolsConfig {
            include_builtin: false,
            definitions_path: Some(PathBuf::from("tools.yaml")),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_input_limit_is_invalid() {
        let config = ToolsConfig {
            max_input_chars: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidInputLimit));
    }
}
