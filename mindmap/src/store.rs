//! Mind map persistence.
//!
//! The service only needs two operations, so the trait stays small. The
//! in-memory store is the default backend.

use async_trait::async_trait;
use mindmap_core::{MindMap, MindMapId, NewMindMap};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with this id already exists.
    #[error("Mind map already exists: {0}")]
    AlreadyExists(MindMapId),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Backend(String),
}

/// Persistence for generated mind maps.
#[async_trait]
pub trait MindMapStore: Send + Sync {
    /// Assign an id and timestamps, then store the record.
    async fn create(&self, new: NewMindMap) -> Result<MindMap, StoreError>;

    /// Fetch a record by id.
    async fn get(&self, id: MindMapId) -> Result<Option<MindMap>, StoreError>;
}

/// In-memory store.
///
/// Ids start at 1 and increase by one per record. Data is lost when the
/// process exits.
#[derive(Debug)]
pub struct InMemoryStore {
    records: RwLock<HashMap<MindMapId, MindMap>>,
    next_id: AtomicU64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// All records ordered by id.
    pub async fn list(&self) -> Vec<MindMap> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by_key(|r| r.id);
        records
    }
}

#[async_trait]
impl MindMapStore for InMemoryStore {
    async fn create(&self, new: NewMindMap) -> Result<MindMap, StoreError> {
        let id = MindMapId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = new.into_record(id);

        let mut records = self.records.write().await;
        if records.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        records.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: MindMapId) -> Result<Option<MindMap>, StoreError> {
        Ok(self.records.read().await.get(&id).cloned())
    }
}
