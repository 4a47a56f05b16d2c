//! Result store port - the persistence gateway for assistant results.
//!
//! Results are written once and read back by id or by user. Persistence is
//! best-effort from the orchestrator's point of view: a failing store never
//! turns a completed request into a failed one.

use async_trait::async_trait;

use crate::domain::foundation::{ResultId, UserId};
use crate::domain::writing::AssistantResult;

/// Repository port for assistant results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Save a new result.
    ///
    /// # Errors
    ///
    /// - `Storage` on persistence failure
    /// - `Serialization` if the result cannot be encoded
    async fn save(&self, result: &AssistantResult) -> Result<(), StoreError>;

    /// Find a result by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &ResultId) -> Result<Option<AssistantResult>, StoreError>;

    /// Find the most recent results for a user, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<AssistantResult>, StoreError>;
}

/// Errors from the result store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Result could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}
