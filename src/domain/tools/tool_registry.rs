//! Tool Registry - lookup of tool definitions by id or alias.
//!
//! The registry is filled once at startup and then shared behind an `Arc`.
//! Registration needs `&mut self`, so once the registry is shared there is no
//! way to mutate it and concurrent reads need no locking.
//!
//! # Example
//!
//! ```
//! use writing_assistant::domain::tools::{PromptTemplate, ToolDefinition, ToolRegistry};
//!
//! let mut registry = ToolRegistry::new();
//! registry
//!     .register(
//!         ToolDefinition::new("outline", "Draft an outline", PromptTemplate::parse("{input}").unwrap())
//!             .with_alias("draft_layout"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(registry.resolve("draft_layout").unwrap().id(), "outline");
//! assert!(registry.resolve("haiku").is_err());
//! ```

use std::collections::HashMap;

use thiserror::Error;

use super::{TemplateError, ToolDefinition};

/// No tool answers to the requested id or alias.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tool '{tool_id}'")]
pub struct UnknownTool {
    pub tool_id: String,
    /// Canonical ids of the registered tools.
    pub available: Vec<String>,
}

/// Errors raised while filling the tool registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The id or one of the aliases is already taken.
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    /// Ids and aliases must be non-empty and free of whitespace.
    #[error("invalid tool id '{0}'")]
    InvalidToolId(String),

    /// A tool's prompt template failed to parse.
    #[error("tool '{tool_id}' has an invalid prompt template: {source}")]
    InvalidTemplate {
        tool_id: String,
        source: TemplateError,
    },
}

impl RegistryError {
    pub fn invalid_template(tool_id: impl Into<String>, source: TemplateError) -> Self {
        RegistryError::InvalidTemplate {
            tool_id: tool_id.into(),
            source,
        }
    }
}

/// Registry of all available tools.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    /// Definitions in registration order.
    tools: Vec<ToolDefinition>,

    /// Ids and aliases mapped to an index into `tools`.
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    ///
    /// Fails if the id, or any alias, collides with a registered id or alias.
    pub fn register(&mut self, tool: ToolDefinition) -> Result<(), RegistryError> {
        let mut keys = Vec::with_capacity(1 + tool.aliases().len());
        keys.push(tool.id());
        keys.extend(tool.aliases().iter().map(String::as_str));

        for (i, key) in keys.iter().enumerate() {
            if key.is_empty() || key.chars().any(char::is_whitespace) {
                return Err(RegistryError::InvalidToolId(key.to_string()));
            }
            if self.index.contains_key(*key) || keys[..i].contains(key) {
                return Err(RegistryError::DuplicateTool(key.to_string()));
            }
        }

        let position = self.tools.len();
        for key in keys {
            self.index.insert(key.to_string(), position);
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Resolves a tool by id or alias.
    pub fn resolve(&self, tool_id: &str) -> Result<&ToolDefinition, UnknownTool> {
        self.get(tool_id).ok_or_else(|| UnknownTool {
            tool_id: tool_id.to_string(),
            available: self.tool_ids().into_iter().map(String::from).collect(),
        })
    }

    /// Gets a tool by id or alias.
    pub fn get(&self, tool_id: &str) -> Option<&ToolDefinition> {
        self.index.get(tool_id).map(|&i| &self.tools[i])
    }

    /// Checks if an id or alias is registered.
    pub fn contains(&self, tool_id: &str) -> bool {
        self.index.contains_key(tool_id)
    }

    /// All tools in registration order.
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Canonical ids in registration order.
    pub fn tool_ids(&self) -> Vec<&str> {
        self.tools.iter().map(ToolDefinition::id).collect()
    }

    /// Number of registered tools (aliases not counted).
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
