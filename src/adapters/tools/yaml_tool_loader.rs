//! YAML tool definitions.
//!
//! Loads additional tools from a YAML file at startup:
//!
//! ```yaml
//! tools:
//!   - id: haiku
//!     description: Turn text into a haiku
//!     aliases: [poem]
//!     system_prompt: You write haiku. Reply with the poem only.
//!     prompt_template: "Write a haiku about {subject=this text}: {input}"
//!     post_processors:
//!       - trim
//!       - name: non_empty
//!         critical: true
//!     max_tokens: 200
//!     temperature: 0.7
//! ```
//!
//! Post-processors are referenced by catalog name. Unknown names and invalid
//! templates are reported with the offending tool id.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

use crate::domain::tools::{
    PostProcessorCatalog, PromptTemplate, RegistryError, TemplateError, ToolDefinition,
};

/// Errors raised while loading tool definitions.
#[derive(Debug, Error)]
pub enum ToolLoadError {
    #[error("failed to read tool definitions from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid tool definitions YAML: {0}")]
    Parse(String),

    #[error("tool '{tool_id}' has an invalid prompt template: {source}")]
    InvalidTemplate {
        tool_id: String,
        source: TemplateError,
    },

    #[error("tool '{tool_id}' references unknown post-processor '{name}'")]
    UnknownPostProcessor { tool_id: String, name: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolFile {
    #[serde(default)]
    tools: Vec<ToolSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolSpec {
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    system_prompt: String,
    prompt_template: String,
    #[serde(default)]
    post_processors: Vec<PostProcessorSpec>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PostProcessorSpec {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        critical: bool,
    },
}

impl PostProcessorSpec {
    fn name(&self) -> &str {
        match self {
            PostProcessorSpec::Name(name) | PostProcessorSpec::Detailed { name, .. } => name,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, PostProcessorSpec::Detailed { critical: true, .. })
    }
}

/// Parses tool definitions from YAML text.
pub fn parse_tool_definitions(
    yaml: &str,
    catalog: &PostProcessorCatalog,
) -> Result<Vec<ToolDefinition>, ToolLoadError> {
    let file: ToolFile =
        serde_yaml::from_str(yaml).map_err(|e| ToolLoadError::Parse(e.to_string()))?;

    file.tools
        .into_iter()
        .map(|spec| into_definition(spec, catalog))
        .collect()
}

/// Reads and parses a tool definitions file.
pub async fn load_tool_definitions(
    path: &Path,
    catalog: &PostProcessorCatalog,
) -> Result<Vec<ToolDefinition>, ToolLoadError> {
    let yaml = fs::read_to_string(path)
        .await
        .map_err(|source| ToolLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    parse_tool_definitions(&yaml, catalog)
}

fn into_definition(
    spec: ToolSpec,
    catalog: &PostProcessorCatalog,
) -> Result<ToolDefinition, ToolLoadError> {
    let template =
        PromptTemplate::parse(spec.prompt_template).map_err(|source| {
            ToolLoadError::InvalidTemplate {
                tool_id: spec.id.clone(),
                source,
            }
        })?;

    let mut tool = ToolDefinition::new(&spec.id, spec.description, template)
        .with_system_prompt(spec.system_prompt);

    for alias in spec.aliases {
        tool = tool.with_alias(alias);
    }

    for step in &spec.post_processors {
        let step = catalog
            .step(step.name(), step.is_critical())
            .map_err(|e| ToolLoadError::UnknownPostProcessor {
                tool_id: spec.id.clone(),
                name: e.0,
            })?;
        tool = tool.with_post_processor(step);
    }

    if let Some(max_tokens) = spec.max_tokens {
        tool = tool.with_max_tokens(max_tokens);
    }
    if let Some(temperature) = spec.temperature {
        tool = tool.with_temperature(temperature);
    }

    Ok(tool)
}
