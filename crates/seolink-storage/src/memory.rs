use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use seolink_core::error::{StorageError, StorageResult};
use seolink_core::redirect::{RedirectConfig, RedirectId, RedirectPatch};
use seolink_core::scope::Scope;
use seolink_core::store::{sort_newest_first, ListOrder, ListQuery, RedirectStore};
use std::sync::Arc;
use tracing::trace;

/// In-memory implementation of the [`RedirectStore`] trait using DashMap.
///
/// Clones share the same map, so a handle kept by a caller observes writes
/// made through the repository that owns the store.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    storage: Arc<DashMap<RedirectId, RedirectConfig>>,
    ordering_index: bool,
}

impl InMemoryStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(DashMap::new()),
            ordering_index: true,
        }
    }

    /// Creates a new in-memory store with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Arc::new(DashMap::with_capacity(capacity)),
            ordering_index: true,
        }
    }

    /// Creates a store pre-populated with `records`. Later duplicates of an
    /// id replace earlier ones.
    pub fn with_records(records: impl IntoIterator<Item = RedirectConfig>) -> Self {
        let store = Self::new();
        for record in records {
            store.storage.insert(record.id.clone(), record);
        }
        store
    }

    /// Behaves like a document store missing its `(ownerId, createdAt)`
    /// composite index: owner-scoped ordered queries fail with
    /// [`StorageError::IndexUnavailable`].
    pub fn without_ordering_index(mut self) -> Self {
        self.ordering_index = false;
        self
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RedirectStore for InMemoryStore {
    fn is_available(&self) -> bool {
        true
    }

    async fn read_all(&self, query: &ListQuery) -> StorageResult<Vec<RedirectConfig>> {
        let ordered = query.order == ListOrder::NewestFirst;
        if ordered && !self.ordering_index && matches!(query.scope, Scope::Owner(_)) {
            return Err(StorageError::IndexUnavailable(
                "ordered owner query requires a composite index".to_string(),
            ));
        }

        let mut records: Vec<RedirectConfig> = self
            .storage
            .iter()
            .filter(|entry| query.scope.permits(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        if ordered {
            sort_newest_first(&mut records);
        }

        trace!(count = records.len(), ?query, "read records from memory");
        Ok(records)
    }

    async fn read_one(&self, id: &RedirectId) -> StorageResult<Option<RedirectConfig>> {
        Ok(self.storage.get(id).map(|entry| entry.value().clone()))
    }

    async fn write_one(&self, record: RedirectConfig) -> StorageResult<RedirectConfig> {
        match self.storage.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(record.id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn update_one(
        &self,
        id: &RedirectId,
        patch: &RedirectPatch,
        updated_at: Timestamp,
    ) -> StorageResult<Option<RedirectConfig>> {
        let Some(mut entry) = self.storage.get_mut(id) else {
            return Ok(None);
        };
        patch.apply_to(entry.value_mut(), updated_at);
        Ok(Some(entry.value().clone()))
    }

    async fn delete_one(&self, id: &RedirectId) -> StorageResult<bool> {
        Ok(self.storage.remove(id).is_some())
    }
}
