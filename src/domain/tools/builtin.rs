//! Built-in writing tools.
//!
//! Every option a built-in template reads has a default, so a request that
//! carries no options still renders. Style options shared by the tools:
//! `persona`, `tone`, `style_traits` and `sample_text`.

use super::{
    CollapseBlankLines, NonEmpty, PostProcessorStep, ProofreadCorrections, PromptTemplate,
    RegistryError, StripCodeFence, ToolDefinition, ToolRegistry, Trim,
};

/// Tool used when a request names no tool.
pub const DEFAULT_TOOL_ID: &str = "chat";

const STYLE_GUIDANCE: &str = "Writing persona: {persona=Default Writer}
Tone: {tone=Neutral}
Style traits:
{style_traits=No specific style traits provided.}

Sample text in this style:
{sample_text=}";

const REFINE_SYSTEM: &str = "You are a writing assistant that refines content according to a \
style profile. The user's request has the highest priority. Preserve the original meaning, \
apply the user's style and tone, and return only the refined HTML content without commentary.";

const OUTLINE_SYSTEM: &str = "You are a writing coach creating a concise structural outline, \
not a full article. Give brief guidance for 3-5 sections as clean HTML using <h2>/<h3> headings \
and italic guidance text. Return only the HTML.";

const PROOFREAD_SYSTEM: &str = "You are a meticulous proofreader. Only report real errors that \
appear in the content. Never return a correction where original and corrected are identical. \
Reply with JSON only: {\"corrections\": [{\"original\": \"teh\", \"corrected\": \"the\"}]}. \
If there are no errors reply {\"corrections\": []}.";

const CHAT_SYSTEM: &str = "You are a helpful writing assistant having a natural conversation. \
Match the user's energy and length: short query, short answer. Never mention that you adapt to \
their style. Draft content is context only.";

const SUMMARIZE_SYSTEM: &str =
    "You summarize text faithfully. Reply with the summary only, without preamble.";

const GRAMMAR_CHECK_SYSTEM: &str = "You correct grammar, spelling and punctuation without \
changing style or meaning. Reply with the corrected text only.";

const REWRITE_SYSTEM: &str =
    "You rewrite text while keeping its meaning. Reply with the rewritten text only.";

/// Registers the built-in tools.
pub fn register_builtin_tools(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    for tool in builtin_tools()? {
        registry.register(tool)?;
    }
    Ok(())
}

/// Builds the built-in tool definitions.
pub fn builtin_tools() -> Result<Vec<ToolDefinition>, RegistryError> {
    Ok(vec![
        ToolDefinition::new(
            "refine",
            "Refine content to follow an instruction and the user's style",
            template(
                "refine",
                &format!(
                    "Primary request:\n{{instruction=Improve clarity and flow.}}\n\n\
                     User profile:\n{}\n\nContent to refine:\n{{input}}",
                    STYLE_GUIDANCE
                ),
            )?,
        )
        .with_system_prompt(REFINE_SYSTEM)
        .with_post_processor(PostProcessorStep::new(Trim))
        .with_post_processor(PostProcessorStep::new(StripCodeFence))
        .with_post_processor(PostProcessorStep::new(NonEmpty).critical()),
        ToolDefinition::new(
            "outline",
            "Draft a structural outline for a topic",
            template(
                "outline",
                &format!(
                    "Primary request:\n{{input}}\n\nUser profile:\n{}\n\n\
                     Topic: {{topic=Unknown}}\nCategory: {{category=General}}\n\
                     Description: {{description=}}\nKeywords: {{keywords=}}",
                    STYLE_GUIDANCE
                ),
            )?,
        )
        .with_alias("draft_layout")
        .with_system_prompt(OUTLINE_SYSTEM)
        .with_post_processor(PostProcessorStep::new(StripCodeFence))
        .with_post_processor(PostProcessorStep::new(CollapseBlankLines))
        .with_post_processor(PostProcessorStep::new(Trim)),
        ToolDefinition::new(
            "proofread",
            "List spelling, grammar and punctuation corrections as JSON",
            template(
                "proofread",
                &format!(
                    "Instructions:\n{{instruction=Fix spelling, grammar and punctuation errors.}}\n\n\
                     User profile:\n{}\n\nContent to proofread:\n{{input}}",
                    STYLE_GUIDANCE
                ),
            )?,
        )
        .with_system_prompt(PROOFREAD_SYSTEM)
        .with_post_processor(PostProcessorStep::new(StripCodeFence))
        .with_post_processor(PostProcessorStep::new(ProofreadCorrections).critical())
        .with_temperature(0.0),
        ToolDefinition::new(
            "chat",
            "Converse about a draft in the user's style",
            template(
                "chat",
                &format!(
                    "User's preferred writing style:\n{}\n\n\
                     Draft content for context:\n{{draft=}}\n\nUser query:\n{{input}}",
                    STYLE_GUIDANCE
                ),
            )?,
        )
        .with_system_prompt(CHAT_SYSTEM)
        .with_post_processor(PostProcessorStep::new(Trim))
        .with_post_processor(PostProcessorStep::new(NonEmpty).critical()),
        ToolDefinition::new(
            "summarize",
            "Summarize text",
            template(
                "summarize",
                "Summarize the following text in at most {sentences=3} sentences:\n\n{input}",
            )?,
        )
        .with_system_prompt(SUMMARIZE_SYSTEM)
        .with_post_processor(PostProcessorStep::new(Trim))
        .with_post_processor(PostProcessorStep::new(NonEmpty).critical())
        .with_max_tokens(1024),
        ToolDefinition::new(
            "grammar-check",
            "Return the text with grammar and spelling corrected",
            template("grammar-check", "Correct this text:\n\n{input}")?,
        )
        .with_system_prompt(GRAMMAR_CHECK_SYSTEM)
        .with_post_processor(PostProcessorStep::new(StripCodeFence))
        .with_post_processor(PostProcessorStep::new(Trim))
        .with_temperature(0.0),
        ToolDefinition::new(
            "rewrite",
            "Rewrite text in another tone",
            template("rewrite", "Rewrite in a {tone=neutral} tone: {input}")?,
        )
        .with_system_prompt(REWRITE_SYSTEM)
        .with_post_processor(PostProcessorStep::new(Trim))
        .with_post_processor(PostProcessorStep::new(NonEmpty).critical()),
    ])
}

fn template(tool_id: &str, text: &str) -> Result<PromptTemplate, RegistryError> {
    PromptTemplate::parse(text).map_err(|e| RegistryError::invalid_template(tool_id, e))
}
