//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, state machines)
//! - `tools` - Prompt templates, post-processors and the tool registry
//! - `writing` - Writing requests, assistant results and the request lifecycle

pub mod foundation;
pub mod tools;
pub mod writing;
