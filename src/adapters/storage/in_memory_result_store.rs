//! In-Memory Result Store Adapter
//!
//! Stores assistant results in memory, up to a fixed capacity.
//! Once full, each save evicts the oldest stored result.
//! Meant for development and tests; contents are lost on restart.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{ResultId, UserId};
use crate::domain::writing::AssistantResult;
use crate::ports::{ResultStore, StoreError};

/// Capacity used by [`InMemoryResultStore::new`].
pub const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

#[derive(Debug, Default)]
struct Entries {
    by_id: HashMap<ResultId, AssistantResult>,
    /// Insertion order, oldest first.
    order: VecDeque<ResultId>,
}

/// Bounded in-memory storage for assistant results
#[derive(Debug, Clone)]
pub struct InMemoryResultStore {
    entries: Arc<RwLock<Entries>>,
    capacity: usize,
}

impl InMemoryResultStore {
    /// Create a store holding up to [`DEFAULT_MEMORY_CAPACITY`] results
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }

    /// Create a store holding up to `capacity` results (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the number of stored results
    pub async fn len(&self) -> usize {
        self.entries.read().await.by_id.len()
    }

    /// Returns true if nothing has been stored
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.by_id.is_empty()
    }
}

impl Default for InMemoryResultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn save(&self, result: &AssistantResult) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let id = result.id();

        if entries.by_id.insert(id, result.clone()).is_none() {
            entries.order.push_back(id);
        }

        while entries.by_id.len() > self.capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.by_id.remove(&oldest);
            tracing::debug!(result_id = %oldest, capacity = self.capacity, "Evicted oldest result");
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &ResultId) -> Result<Option<AssistantResult>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.by_id.get(id).cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<AssistantResult>, StoreError> {
        let entries = self.entries.read().await;
        let mut matching: Vec<AssistantResult> = entries
            .by_id
            .values()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}
