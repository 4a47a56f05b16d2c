//! Writing Assistant - writing-assistance API over Anthropic Claude
//!
//! A request names a tool (refine, outline, proofread, chat, ...). The
//! assistant renders that tool's prompt template, calls the model with
//! bounded retries and a hard timeout, runs the tool's post-processors, and
//! stores the result on a best-effort basis.
//!
//! Layout follows ports and adapters:
//! - `domain` - tools, prompt templates, requests and results
//! - `ports` - LLM client, result store and usage recorder interfaces
//! - `application` - the request orchestrator
//! - `adapters` - Anthropic, PostgreSQL, in-memory, YAML and HTTP implementations
//! - `config` - environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
