//! Prompt templates with typed placeholders.
//!
//! Syntax:
//!
//! - `{name}` is a required placeholder.
//! - `{name=default text}` is optional and falls back to its default (which
//!   may be empty, `{name=}`).
//! - `{{` and `}}` produce literal braces.
//! - `{input}` is reserved and always bound to the request's input text.
//!
//! Templates are parsed once, when a tool is defined.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use writing_assistant::domain::tools::PromptTemplate;
//!
//! let template = PromptTemplate::parse("Rewrite in a {tone} tone: {input}").unwrap();
//! let options = BTreeMap::from([("tone".to_string(), "formal".to_string())]);
//! assert_eq!(
//!     template.render("fix this", &options).unwrap(),
//!     "Rewrite in a formal tone: fix this"
//! );
//! ```

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Placeholder name bound to the request's input text.
pub const INPUT_PLACEHOLDER: &str = "input";

/// Errors raised while parsing or rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template text is malformed.
    #[error("template syntax error at byte {position}: {reason}")]
    Syntax { position: usize, reason: String },

    /// A required placeholder had no value in the options.
    #[error("required placeholder '{name}' has no value and no default")]
    MissingPlaceholder { name: String },
}

impl TemplateError {
    fn syntax(position: usize, reason: impl Into<String>) -> Self {
        TemplateError::Syntax {
            position,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder {
        name: String,
        default: Option<String>,
    },
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parses template text, validating placeholder syntax.
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                '{' => {
                    if matches!(chars.peek(), Some((_, '{'))) {
                        chars.next();
                        literal.push('{');
                        continue;
                    }

                    let mut body = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(TemplateError::syntax(
                                    position,
                                    "'{' inside a placeholder",
                                ))
                            }
                            _ => body.push(c),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::syntax(position, "unclosed placeholder"));
                    }

                    let (name, default) = match body.split_once('=') {
                        Some((name, default)) => (name, Some(default.to_string())),
                        None => (body.as_str(), None),
                    };
                    if !is_valid_name(name) {
                        return Err(TemplateError::syntax(
                            position,
                            format!("invalid placeholder name '{}'", name),
                        ));
                    }
                    if name == INPUT_PLACEHOLDER && default.is_some() {
                        return Err(TemplateError::syntax(
                            position,
                            "'input' is always provided and cannot declare a default",
                        ));
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder {
                        name: name.to_string(),
                        default,
                    });
                }
                '}' => {
                    if matches!(chars.peek(), Some((_, '}'))) {
                        chars.next();
                        literal.push('}');
                    } else {
                        return Err(TemplateError::syntax(position, "unmatched '}'"));
                    }
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { source, segments })
    }

    /// Returns the original template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of all placeholders, in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder { name, .. } = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Option names that must be supplied by the caller.
    pub fn required_options(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder {
                name,
                default: None,
            } = segment
            {
                if name != INPUT_PLACEHOLDER && !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Renders the template.
    ///
    /// Values are inserted verbatim; braces inside values are never expanded.
    pub fn render(
        &self,
        input: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<String, TemplateError> {
        let mut rendered = String::with_capacity(self.source.len() + input.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder { name, .. } if name == INPUT_PLACEHOLDER => {
                    rendered.push_str(input)
                }
                Segment::Placeholder { name, default } => {
                    let value = options
                        .get(name)
                        .map(String::as_str)
                        .or(default.as_deref())
                        .ok_or_else(|| TemplateError::MissingPlaceholder { name: name.clone() })?;
                    rendered.push_str(value);
                }
            }
        }

        Ok(rendered)
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
