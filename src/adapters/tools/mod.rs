//! Tool registry sources.
//!
//! Assembles the startup `ToolRegistry` from the built-in tools and an
//! optional YAML definitions file.

mod yaml_tool_loader;

pub use yaml_tool_loader::{load_tool_definitions, parse_tool_definitions, ToolLoadError};

use std::path::Path;

use crate::domain::tools::{register_builtin_tools, PostProcessorCatalog, ToolRegistry};

/// Builds the registry served by the process.
///
/// Built-in tools are registered first, so a YAML tool reusing a built-in
/// id or alias fails with a duplicate error.
pub async fn build_tool_registry(
    include_builtin: bool,
    definitions_path: Option<&Path>,
) -> Result<ToolRegistry, ToolLoadError> {
    let mut registry = ToolRegistry::new();

    if include_builtin {
        register_builtin_tools(&mut registry)?;
    }

    if let Some(path) = definitions_path {
        let definitions = load_tool_definitions(path, &PostProcessorCatalog::builtin()).await?;
        let count = definitions.len();
        for definition in definitions {
            registry.register(definition)?;
        }
        tracing::info!(path = %path.display(), count, "Loaded tool definitions");
    }

    for tool in registry.tools() {
        tracing::debug!(
            tool_id = tool.id(),
            aliases = ?tool.aliases(),
            required_options = ?tool.prompt_template().required_options(),
            "Tool registered"
        );
    }

    Ok(registry)
}
