//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresResultStore` - Assistant results, with embedded migrations

mod result_store;

pub use result_store::PostgresResultStore;
