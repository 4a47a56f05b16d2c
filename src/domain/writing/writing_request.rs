//! WritingRequest - an inbound request for writing assistance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{UserId, ValidationError};

/// Default upper bound on `input_text`, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 50_000;

/// A user's request to run a writing tool over some text.
///
/// Options are free-form strings consumed by the tool's prompt template;
/// options the template does not mention are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingRequest {
    pub user_id: UserId,
    pub tool_id: String,
    pub input_text: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl WritingRequest {
    /// Creates a request without options.
    pub fn new(user_id: UserId, tool_id: impl Into<String>, input_text: impl Into<String>) -> Self {
        Self {
            user_id,
            tool_id: tool_id.into(),
            input_text: input_text.into(),
            options: BTreeMap::new(),
        }
    }

    /// Adds a template option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Checks the request's own invariants.
    ///
    /// Tool resolution is the registry's concern and is not checked here.
    pub fn validate(&self, max_input_chars: usize) -> Result<(), ValidationError> {
        if self.user_id.as_str().trim().is_empty() {
            return Err(ValidationError::empty_field("user_id"));
        }
        if self.tool_id.trim().is_empty() {
            return Err(ValidationError::empty_field("tool_id"));
        }
        if self.input_text.trim().is_empty() {
            return Err(ValidationError::empty_field("input_text"));
        }

        let chars = self.input_text.chars().count();
        if chars > max_input_chars {
            return Err(ValidationError::too_long("input_text", max_input_chars, chars));
        }

        Ok(())
    }
}
