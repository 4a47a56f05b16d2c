//! Post-processors - transformations applied to LLM output.
//!
//! A tool declares an ordered chain of [`PostProcessorStep`]s. Each step wraps
//! a named [`PostProcessor`] and a `critical` flag: a failing non-critical step
//! is skipped (its input passes through), a failing critical step aborts the
//! request.
//!
//! Tools loaded from configuration refer to processors by name through the
//! [`PostProcessorCatalog`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a post-processor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct PostProcessError {
    pub reason: String,
}

impl PostProcessError {
    /// Creates a new post-processing error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A named transformation of generated text.
pub trait PostProcessor: Send + Sync {
    /// Stable name used in tool definitions and logs.
    fn name(&self) -> &str;

    /// Transforms the output of the previous stage.
    fn apply(&self, input: &str) -> Result<String, PostProcessError>;
}

/// One entry of a tool's post-processing chain.
#[derive(Clone)]
pub struct PostProcessorStep {
    processor: Arc<dyn PostProcessor>,
    critical: bool,
}

impl PostProcessorStep {
    /// Creates a non-critical step.
    pub fn new(processor: impl PostProcessor + 'static) -> Self {
        Self::from_arc(Arc::new(processor))
    }

    /// Creates a non-critical step from a shared processor.
    pub fn from_arc(processor: Arc<dyn PostProcessor>) -> Self {
        Self {
            processor,
            critical: false,
        }
    }

    /// Creates a non-critical step from a closure.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&str) -> Result<String, PostProcessError> + Send + Sync + 'static,
    {
        Self::new(FnPostProcessor {
            name: name.into(),
            f,
        })
    }

    /// Marks the step as critical: its failure aborts the request.
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Returns the processor name.
    pub fn name(&self) -> &str {
        self.processor.name()
    }

    /// Returns true if a failure of this step aborts the request.
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Runs the processor.
    pub fn apply(&self, input: &str) -> Result<String, PostProcessError> {
        self.processor.apply(input)
    }
}

impl fmt::Debug for PostProcessorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostProcessorStep")
            .field("name", &self.name())
            .field("critical", &self.critical)
            .finish()
    }
}

struct FnPostProcessor<F> {
    name: String,
    f: F,
}

impl<F> PostProcessor for FnPostProcessor<F>
where
    F: Fn(&str) -> Result<String, PostProcessError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, input: &str) -> Result<String, PostProcessError> {
        (self.f)(input)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Built-in processors
// ════════════════════════════════════════════════════════════════════════════

/// Strips surrounding whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trim;

impl PostProcessor for Trim {
    fn name(&self) -> &str {
        "trim"
    }

    fn apply(&self, input: &str) -> Result<String, PostProcessError> {
        Ok(input.trim().to_string())
    }
}

/// Unwraps output that is entirely enclosed in one Markdown code fence.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripCodeFence;

impl PostProcessor for StripCodeFence {
    fn name(&self) -> &str {
        "strip_code_fence"
    }

    fn apply(&self, input: &str) -> Result<String, PostProcessError> {
        let trimmed = input.trim();
        let fenced = trimmed
            .strip_prefix("```")
            .and_then(|rest| rest.strip_suffix("```"))
            .and_then(|body| body.split_once('\n'))
            .map(|(_language, body)| body.trim_end_matches(['\n', '\r']));

        Ok(fenced.unwrap_or(input).to_string())
    }
}

/// Collapses each run of blank lines to its first line.
///
/// Whitespace-only lines count as blank. Line endings, CRLF included, pass
/// through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapseBlankLines;

impl PostProcessor for CollapseBlankLines {
    fn name(&self) -> &str {
        "collapse_blank_lines"
    }

    fn apply(&self, input: &str) -> Result<String, PostProcessError> {
        let mut output = String::with_capacity(input.len());
        let mut in_blank_run = false;
        for line in input.split_inclusive('\n') {
            let blank = line.trim().is_empty();
            if !(blank && in_blank_run) {
                output.push_str(line);
            }
            in_blank_run = blank;
        }
        Ok(output)
    }
}

/// Fails when the output is blank.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmpty;

impl PostProcessor for NonEmpty {
    fn name(&self) -> &str {
        "non_empty"
    }

    fn apply(&self, input: &str) -> Result<String, PostProcessError> {
        if input.trim().is_empty() {
            return Err(PostProcessError::new("model returned no content"));
        }
        Ok(input.to_string())
    }
}

/// Extracts the JSON object contained in the output and re-serializes it.
///
/// Models often wrap JSON in prose ("Here are the corrections: {...}"); the
/// outermost `{ ... }` span is taken.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonObject;

impl JsonObject {
    fn extract(input: &str) -> Result<serde_json::Map<String, serde_json::Value>, PostProcessError> {
        let start = input
            .find('{')
            .ok_or_else(|| PostProcessError::new("no JSON object in output"))?;
        let end = input
            .rfind('}')
            .filter(|end| *end > start)
            .ok_or_else(|| PostProcessError::new("no JSON object in output"))?;

        match serde_json::from_str::<serde_json::Value>(&input[start..=end]) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(PostProcessError::new("output JSON is not an object")),
            Err(e) => Err(PostProcessError::new(format!("invalid JSON: {}", e))),
        }
    }
}

impl PostProcessor for JsonObject {
    fn name(&self) -> &str {
        "json_object"
    }

    fn apply(&self, input: &str) -> Result<String, PostProcessError> {
        let map = Self::extract(input)?;
        serde_json::to_string(&map).map_err(|e| PostProcessError::new(e.to_string()))
    }
}

/// A single proofreading correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Corrections {
    corrections: Vec<Correction>,
}

/// Normalizes `{"corrections": [...]}` output, dropping no-op corrections.
///
/// Entries whose original text is empty or identical to the correction are
/// removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProofreadCorrections;

impl PostProcessor for ProofreadCorrections {
    fn name(&self) -> &str {
        "proofread_corrections"
    }

    fn apply(&self, input: &str) -> Result<String, PostProcessError> {
        let map = JsonObject::extract(input)?;
        let mut parsed: Corrections = serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| PostProcessError::new(format!("unexpected corrections shape: {}", e)))?;

        parsed.corrections.retain(|c| {
            let original = c.original.trim();
            !original.is_empty() && original != c.corrected.trim()
        });

        serde_json::to_string(&parsed).map_err(|e| PostProcessError::new(e.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Catalog
// ════════════════════════════════════════════════════════════════════════════

/// A post-processor name that the catalog does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown post-processor '{0}'")]
pub struct UnknownPostProcessor(pub String);

/// Name-indexed set of post-processors available to tool definitions.
#[derive(Clone, Default)]
pub struct PostProcessorCatalog {
    entries: BTreeMap<String, Arc<dyn PostProcessor>>,
}

impl PostProcessorCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding all built-in processors.
    pub fn builtin() -> Self {
        Self::new()
            .with(Trim)
            .with(StripCodeFence)
            .with(CollapseBlankLines)
            .with(NonEmpty)
            .with(JsonObject)
            .with(ProofreadCorrections)
    }

    /// Adds a processor, replacing any processor with the same name.
    pub fn with(mut self, processor: impl PostProcessor + 'static) -> Self {
        self.entries
            .insert(processor.name().to_string(), Arc::new(processor));
        self
    }

    /// Looks up a processor by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn PostProcessor>> {
        self.entries.get(name).cloned()
    }

    /// Builds a chain step for the named processor.
    pub fn step(&self, name: &str, critical: bool) -> Result<PostProcessorStep, UnknownPostProcessor> {
        let processor = self
            .get(name)
            .ok_or_else(|| UnknownPostProcessor(name.to_string()))?;
        let step = PostProcessorStep::from_arc(processor);
        Ok(if critical { step.critical() } else { step })
    }

    /// Returns all known names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for PostProcessorCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}
