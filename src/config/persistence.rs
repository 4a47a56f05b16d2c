//! Result persistence configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::storage::DEFAULT_MEMORY_CAPACITY;
use crate::application::PersistenceMode;

/// Result persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Where results are stored
    #[serde(default)]
    pub backend: PersistenceBackend,

    /// PostgreSQL connection URL (postgres backend only)
    pub database_url: Option<String>,

    /// Maximum pool connections (postgres backend only)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Results kept before the oldest is evicted (memory backend only)
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,

    /// Whether saves are awaited or detached
    #[serde(default)]
    pub mode: PersistenceMode,

    /// Longest a save may take, in milliseconds
    #[serde(default = "default_budget")]
    pub budget_ms: u64,
}

/// Result store backend. `Memory` is bounded by `memory_capacity` and does
/// not survive restarts; production deployments use `Postgres`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    #[default]
    Memory,
    Postgres,
    /// Results are not stored
    Disabled,
}

impl PersistenceConfig {
    /// Get the save budget as Duration
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    /// Validate persistence configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == PersistenceBackend::Postgres {
            let url = self
                .database_url
                .as_deref()
                .filter(|url| !url.is_empty())
                .ok_or(ValidationError::MissingRequired("PERSISTENCE__DATABASE_URL"))?;
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(ValidationError::InvalidDatabaseUrl);
            }
            if self.max_connections == 0 || self.max_connections > 100 {
                return Err(ValidationError::InvalidPoolSize);
            }
        }
        if self.backend == PersistenceBackend::Memory && self.memory_capacity == 0 {
            return Err(ValidationError::InvalidMemoryCapacity);
        }
        if self.budget_ms == 0 || self.budget_ms > 10_000 {
            return Err(ValidationError::InvalidPersistenceBudget);
        }
        Ok(())
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: PersistenceBackend::default(),
            database_url: None,
            max_connections: default_max_connections(),
            memory_capacity: default_memory_capacity(),
            mode: PersistenceMode::default(),
            budget_ms: default_budget(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_memory_capacity() -> usize {
    DEFAULT_MEMORY_CAPACITY
}

fn default_budget() -> u64 {
    250
}
