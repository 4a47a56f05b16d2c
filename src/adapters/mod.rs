//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - LLM clients (Anthropic, retry wrapper, mock) and the usage ledger
//! - `http` - axum router and REST handlers
//! - `postgres` - PostgreSQL result store
//! - `storage` - In-memory result store
//! - `tools` - Tool registry sources (built-in, YAML)

pub mod ai;
pub mod http;
pub mod postgres;
pub mod storage;
pub mod tools;
