//! Tool definition - a named writing operation.
//!
//! A tool couples a system prompt, a [`PromptTemplate`] and a post-processing
//! chain. Definitions are built at startup and never change afterwards.

use std::collections::BTreeMap;

use super::{PostProcessorStep, PromptTemplate, TemplateError};

/// Definition of a writing-assistance tool.
///
/// # Examples
///
/// ```
/// use writing_assistant::domain::tools::{PromptTemplate, ToolDefinition, Trim, PostProcessorStep};
///
/// let rewrite = ToolDefinition::new(
///     "rewrite",
///     "Rewrite text in another tone",
///     PromptTemplate::parse("Rewrite in a {tone=neutral} tone: {input}").unwrap(),
/// )
/// .with_system_prompt("You rewrite text. Reply with the rewritten text only.")
/// .with_post_processor(PostProcessorStep::new(Trim));
///
/// assert_eq!(rewrite.id(), "rewrite");
/// assert_eq!(rewrite.post_processors().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    id: String,
    description: String,
    aliases: Vec<String>,
    system_prompt: String,
    prompt_template: PromptTemplate,
    post_processors: Vec<PostProcessorStep>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl ToolDefinition {
    /// Creates a tool with no system prompt and no post-processors.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        prompt_template: PromptTemplate,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            aliases: Vec::new(),
            system_prompt: String::new(),
            prompt_template,
            post_processors: Vec::new(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Adds an alternative identifier that resolves to this tool.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Appends a step to the post-processing chain.
    pub fn with_post_processor(mut self, step: PostProcessorStep) -> Self {
        self.post_processors.push(step);
        self
    }

    /// Overrides the default maximum output tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn prompt_template(&self) -> &PromptTemplate {
        &self.prompt_template
    }

    /// Post-processing steps in declared order.
    pub fn post_processors(&self) -> &[PostProcessorStep] {
        &self.post_processors
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// Renders the user prompt for an input and its options.
    pub fn render_prompt(
        &self,
        input: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<String, TemplateError> {
        self.prompt_template.render(input, options)
    }
}
