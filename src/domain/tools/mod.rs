//! Tools domain - prompt templates, post-processing and the tool registry.

mod builtin;
mod post_processor;
mod prompt_template;
mod tool_definition;
mod tool_registry;

pub use builtin::{builtin_tools, register_builtin_tools, DEFAULT_TOOL_ID};
pub use post_processor::{
    CollapseBlankLines, Correction, JsonObject, NonEmpty, PostProcessError, PostProcessor,
    PostProcessorCatalog, PostProcessorStep, ProofreadCorrections, StripCodeFence, Trim,
    UnknownPostProcessor,
};
pub use prompt_template::{PromptTemplate, TemplateError, INPUT_PLACEHOLDER};
pub use tool_definition::ToolDefinition;
pub use tool_registry::{RegistryError, ToolRegistry, UnknownTool};
