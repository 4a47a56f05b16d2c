//! Storage Adapters
//!
//! Non-database implementations of the ResultStore port.
//!
//! ## Available Adapters
//!
//! - **InMemoryResultStore** - Stores results in memory (bounded, for development and tests)
//!
//! The PostgreSQL implementation lives in `adapters::postgres`.

mod in_memory_result_store;

pub use in_memory_result_store::{InMemoryResultStore, DEFAULT_MEMORY_CAPACITY};
